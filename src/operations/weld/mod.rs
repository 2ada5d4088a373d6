mod prune;
mod replace;
mod weld;

pub use prune::PruneVertices;
pub use weld::WeldVertices;

pub(crate) use replace::replace_vertices;
