pub mod face;
pub mod hexahedron;

pub use face::{Face, FaceMut};
pub use hexahedron::Hexahedron;
