mod extrude;
mod insert;
mod ortho;

pub use extrude::{ExtrudeDrag, ExtrudeSides};
pub use insert::{InsertMode, InsertSegment};
pub use ortho::ortho_face;
