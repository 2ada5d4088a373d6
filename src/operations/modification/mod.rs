mod delete;
mod detach;
mod merge;
mod split;

pub use delete::DeleteSegment;
pub use detach::{DetachSegment, DetachSide};
pub use merge::MergeSegments;
pub use split::{SplitPattern, SplitSegment};
