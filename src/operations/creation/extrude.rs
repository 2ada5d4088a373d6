use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::error::{OperationError, Result, TopologyError};
use crate::math::{Point3, Vector3};
use crate::operations::join::JoinTouchingSides;
use crate::operations::weld::WeldVertices;
use crate::topology::{Level, SegmentId, Tag, VertexId};

use super::insert::{InsertMode, InsertSegment};

/// Extrudes several open sides at once by a common offset.
///
/// Corners shared by neighbouring source sides stay shared on the new far
/// sides, and lateral sides of the new segments that coincide are connected.
pub struct ExtrudeSides {
    tags: Vec<Tag>,
    offset: Vector3,
}

impl ExtrudeSides {
    /// Creates a new `ExtrudeSides` operation.
    #[must_use]
    pub fn new(tags: Vec<Tag>, offset: Vector3) -> Self {
        Self { tags, offset }
    }

    /// Executes the extrusion and returns a drag handle over the new far sides.
    ///
    /// # Errors
    ///
    /// Returns an error if no side is given, a side is listed twice, a side
    /// is missing or already connected, or the level cannot hold the new
    /// segments. The level is left untouched on error.
    #[instrument(skip_all, fields(sides = self.tags.len()))]
    pub fn execute(&self, level: &mut Level) -> Result<ExtrudeDrag> {
        if self.tags.is_empty() {
            return Err(OperationError::InvalidInput("no sides to extrude".into()).into());
        }
        let unique: HashSet<Tag> = self.tags.iter().copied().collect();
        if unique.len() != self.tags.len() {
            return Err(OperationError::InvalidInput("side listed twice".into()).into());
        }
        for tag in &self.tags {
            if level.segment(tag.segment)?.connection(tag.side).is_some() {
                return Err(TopologyError::SideConnected(*tag).into());
            }
        }
        level.check_capacity(4 * self.tags.len(), self.tags.len())?;

        let mut created = Vec::with_capacity(self.tags.len());
        let mut far = Vec::with_capacity(4 * self.tags.len());
        for tag in &self.tags {
            let id = InsertSegment::new(*tag, InsertMode::Extrude(self.offset)).execute(level)?;
            far.extend(level.segment(id)?.side_vertices(tag.side));
            created.push(Tag::new(id, tag.side));
        }

        let tolerance = level.config().weld_tolerance;
        let merged = WeldVertices::new(far, tolerance).execute(level)?;
        let segments: Vec<SegmentId> = created.iter().map(|t| t.segment).collect();
        JoinTouchingSides::new(segments)
            .with_tolerance(0.0)
            .isolated()
            .execute(level)?;
        debug!(created = created.len(), merged, "extruded sides");

        ExtrudeDrag::capture(level, created, self.offset)
    }
}

/// Live handle on the far sides of an extrusion, for interactive dragging.
///
/// [`apply`](Self::apply) places the far corners at their base position plus
/// the given offset, so calling it every frame with the current gizmo delta
/// never accumulates.
#[derive(Debug, Clone)]
pub struct ExtrudeDrag {
    sides: Vec<Tag>,
    base: Vec<(VertexId, Point3)>,
}

impl ExtrudeDrag {
    fn capture(level: &Level, sides: Vec<Tag>, offset: Vector3) -> Result<Self> {
        let mut base = Vec::new();
        let mut seen = HashSet::new();
        for tag in &sides {
            for v in level.segment(tag.segment)?.side_vertices(tag.side) {
                if seen.insert(v) {
                    base.push((v, level.point(v)? - offset));
                }
            }
        }
        Ok(Self { sides, base })
    }

    /// Far sides of the new segments.
    #[must_use]
    pub fn sides(&self) -> &[Tag] {
        &self.sides
    }

    /// Segments created by the extrusion.
    pub fn segments(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.sides.iter().map(|t| t.segment)
    }

    /// Moves the far corners to `offset` from the extruded sides.
    ///
    /// # Errors
    ///
    /// Returns an error if a far corner no longer exists.
    pub fn apply(&self, level: &mut Level, offset: Vector3) -> Result<()> {
        for (id, base) in &self.base {
            level.vertex_mut(*id)?.point = base + offset;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{assert_valid, one_cube, v};
    use crate::topology::SideId;
    use approx::assert_relative_eq;

    #[test]
    fn extruding_the_default_front_side() {
        let (mut level, a) = one_cube();
        let front = Tag::new(a, SideId::Front);
        let original = level.face(front).unwrap().points();
        let old: HashSet<VertexId> = level.vertices().map(|(id, _)| id).collect();

        let drag = ExtrudeSides::new(vec![front], v(0.0, 0.0, 20.0))
            .execute(&mut level)
            .unwrap();
        let b = drag.sides()[0].segment;

        assert_eq!(level.segment_count(), 2);
        assert_eq!(level.segment(a).unwrap().connection(SideId::Front), Some(b));
        assert_eq!(level.segment(b).unwrap().connection(SideId::Back), Some(a));
        let new: Vec<VertexId> = level
            .vertices()
            .map(|(id, _)| id)
            .filter(|id| !old.contains(id))
            .collect();
        assert_eq!(new.len(), 4);
        let far = level.face(Tag::new(b, SideId::Front)).unwrap().points();
        for (p, q) in original.iter().zip(far) {
            assert_relative_eq!(q - p, v(0.0, 0.0, 20.0), epsilon = 1e-12);
        }
        assert_valid(&level);
    }

    #[test]
    fn extruding_back_again_restores_positions() {
        let (mut level, a) = one_cube();
        let front = Tag::new(a, SideId::Front);
        let original = level.face(front).unwrap().points();
        let first = ExtrudeSides::new(vec![front], v(0.0, 0.0, 20.0))
            .execute(&mut level)
            .unwrap();
        let second = ExtrudeSides::new(first.sides().to_vec(), v(0.0, 0.0, -20.0))
            .execute(&mut level)
            .unwrap();
        let back = level.face(second.sides()[0]).unwrap().points();
        for (p, q) in original.iter().zip(back) {
            assert_relative_eq!(*p, q, epsilon = 1e-12);
        }
    }

    #[test]
    fn neighbouring_sides_stay_joined() {
        let (mut level, a) = one_cube();
        let tags = vec![Tag::new(a, SideId::Front), Tag::new(a, SideId::Top)];
        let drag = ExtrudeSides::new(tags, v(0.0, 20.0, 20.0)).execute(&mut level).unwrap();
        assert_eq!(level.vertex_count(), 8 + 4 + 2);
        let front = drag.sides()[0].segment;
        let top = drag.sides()[1].segment;
        assert_eq!(level.segment(front).unwrap().connection(SideId::Top), Some(top));
        assert_eq!(level.segment(top).unwrap().connection(SideId::Front), Some(front));
        assert_valid(&level);
    }

    #[test]
    fn drag_is_idempotent() {
        let (mut level, a) = one_cube();
        let drag = ExtrudeSides::new(vec![Tag::new(a, SideId::Left)], Vector3::zeros())
            .execute(&mut level)
            .unwrap();
        for _ in 0..3 {
            drag.apply(&mut level, v(15.0, 0.0, 0.0)).unwrap();
        }
        let far = level.face(drag.sides()[0]).unwrap();
        assert_relative_eq!(far.center(), Point3::new(25.0, 0.0, 0.0), epsilon = 1e-12);
        assert!(level.hexahedron(drag.sides()[0].segment).unwrap().is_well_formed(level.config()));
    }

    #[test]
    fn duplicate_sides_are_rejected() {
        let (mut level, a) = one_cube();
        let tag = Tag::new(a, SideId::Front);
        assert!(ExtrudeSides::new(vec![tag, tag], v(0.0, 0.0, 20.0))
            .execute(&mut level)
            .is_err());
        assert_eq!(level.segment_count(), 1);
    }
}
