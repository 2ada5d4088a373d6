mod bounding_box;
mod validate;

pub use bounding_box::{Aabb, BoundingBox};
pub use validate::ValidateLevel;
