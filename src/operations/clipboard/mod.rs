//! Copying segment groups out of a level and pasting them back in.
//!
//! A [`Clipboard`] stores everything with dense 0-based local indices so it
//! can be serialized and pasted into any level, including the one it came
//! from.

mod copy;
mod mirror;
mod paste;
mod payload;

pub use copy::CopySegments;
pub use mirror::{reflection_permutation, MirrorClipboard, SideMapping};
pub use paste::{PasteReport, PasteSegments};
pub use payload::{
    ClipMatcen, ClipObject, ClipSegment, ClipTag, ClipTrigger, ClipWall, Clipboard,
};
