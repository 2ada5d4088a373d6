use crate::math::Point3;

slotmap::new_key_type! {
    /// Unique identifier for a vertex in the level.
    pub struct VertexId;
}

/// A shared corner position. Many segments may reference the same vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// The 3D position of the vertex.
    pub point: Point3,
}

impl Vertex {
    /// Creates a new vertex at the given point.
    #[must_use]
    pub fn new(point: Point3) -> Self {
        Self { point }
    }
}
