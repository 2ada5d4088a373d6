use crate::error::{OperationError, Result};
use crate::math::Point3;
use crate::topology::{Level, SegmentId};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Copy grown by `margin` on every side.
    #[must_use]
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            min: self.min.map(|c| c - margin),
            max: self.max.map(|c| c + margin),
        }
    }

    /// Returns `true` if `point` lies inside or on the box.
    #[must_use]
    pub fn contains(&self, point: &Point3) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }
}

/// Computes the axis-aligned bounding box of a set of segments.
pub struct BoundingBox {
    segments: Vec<SegmentId>,
}

impl BoundingBox {
    /// Creates a new `BoundingBox` query.
    #[must_use]
    pub fn new(segments: Vec<SegmentId>) -> Self {
        Self { segments }
    }

    /// Executes the query, returning the AABB.
    ///
    /// # Errors
    ///
    /// Returns an error if no segment is given or a segment is missing.
    pub fn execute(&self, level: &Level) -> Result<Aabb> {
        if self.segments.is_empty() {
            return Err(OperationError::InvalidInput("no segments to bound".into()).into());
        }
        let mut min = Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        let mut max = Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for id in &self.segments {
            for p in level.segment_points(*id)? {
                min = min.inf(&p);
                max = max.sup(&p);
            }
        }
        Ok(Aabb { min, max })
    }
}
