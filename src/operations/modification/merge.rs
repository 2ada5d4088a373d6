use tracing::{debug, instrument};

use crate::error::{GeometryError, OperationError, Result, TopologyError};
use crate::geometry::Hexahedron;
use crate::operations::connectivity::{Connect, Disconnect, WallPolicy};
use crate::operations::join::JoinTouchingSides;
use crate::topology::{Level, SegmentId, Side, SideId, Tag};

use super::delete::DeleteSegment;

/// Absorbs a connected neighbour into a segment.
///
/// The kept segment stretches across the absorbed one: its shared side moves
/// onto the absorbed segment's far side and takes over that side's surface
/// and connection. Objects inside the absorbed segment move across; its other
/// bookkeeping is deleted with it.
pub struct MergeSegments {
    keep: SegmentId,
    absorb: SegmentId,
}

impl MergeSegments {
    /// Creates a new `MergeSegments` operation.
    #[must_use]
    pub fn new(keep: SegmentId, absorb: SegmentId) -> Self {
        Self { keep, absorb }
    }

    /// Executes the merge.
    ///
    /// # Errors
    ///
    /// Returns an error if the segments are not directly connected, or
    /// [`GeometryError::Degenerate`] if the stretched segment would be
    /// malformed. The level is left untouched on error.
    #[instrument(skip_all, fields(keep = ?self.keep, absorb = ?self.absorb))]
    pub fn execute(&self, level: &mut Level) -> Result<()> {
        if self.keep == self.absorb {
            return Err(OperationError::InvalidInput("cannot merge a segment with itself".into()).into());
        }
        let keep = level.segment(self.keep)?.clone();
        let absorb = level.segment(self.absorb)?.clone();
        let (side, shared) = SideId::ALL
            .into_iter()
            .filter(|s| keep.connection(*s) == Some(self.absorb))
            .find_map(|s| {
                level
                    .find_paired_side(Tag::new(self.keep, s))
                    .map(|paired| (s, paired.side))
            })
            .ok_or_else(|| {
                TopologyError::InvalidTopology(format!(
                    "{:?} and {:?} are not connected",
                    self.keep, self.absorb
                ))
            })?;
        let far = shared.opposite();

        let mut vertices = keep.vertices;
        let mut points = level.segment_points(self.keep)?;
        for c in side.corners() {
            let corner = absorb
                .vertices
                .iter()
                .position(|v| *v == keep.vertices[c])
                .ok_or_else(|| TopologyError::InvalidTopology("connected sides disagree".into()))?;
            vertices[c] = absorb.vertices[shared.axis().flip(corner)];
            points[c] = level.point(vertices[c])?;
        }
        let stretched = Hexahedron::new(points);
        if !stretched.is_well_formed(level.config()) {
            return Err(GeometryError::Degenerate("merged segment is malformed".into()).into());
        }

        let beyond = level.find_paired_side(Tag::new(self.absorb, far));
        for object in level.objects_in(self.absorb) {
            level.object_mut(object)?.segment = self.keep;
        }
        for (s, _) in keep.connected_sides() {
            if s == side || s.is_adjacent(side) {
                Disconnect::new(Tag::new(self.keep, s)).execute(level)?;
            }
        }
        if beyond.is_some() {
            Disconnect::new(Tag::new(self.absorb, far))
                .with_walls(WallPolicy::Keep)
                .execute(level)?;
            level.remove_wall_at(Tag::new(self.absorb, far));
        }

        let segment = level.segment_mut(self.keep)?;
        segment.vertices = vertices;
        *segment.side_mut(side) = Side::surface_of(absorb.side(far));
        DeleteSegment::new(self.absorb).execute(level)?;

        if let Some(beyond) = beyond {
            Connect::new(Tag::new(self.keep, side), beyond).execute(level)?;
        }
        let joined = JoinTouchingSides::new(vec![self.keep]).execute(level)?;
        debug!(%side, joined, "merged segments");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::test_support::{assert_valid, corridor, lone_cube, one_cube};
    use crate::topology::{Object, ObjectKind, TextureId};
    use approx::assert_relative_eq;

    #[test]
    fn absorbs_the_middle_of_a_corridor() {
        let (mut level, ids) = corridor(3);
        level.segment_mut(ids[1]).unwrap().side_mut(SideId::Back).texture = TextureId(42);
        MergeSegments::new(ids[0], ids[1]).execute(&mut level).unwrap();

        assert_eq!(level.segment_count(), 2);
        assert_eq!(level.vertex_count(), 12);
        let merged = level.segment(ids[0]).unwrap();
        assert_eq!(merged.connection(SideId::Back), Some(ids[2]));
        assert_eq!(merged.side(SideId::Back).texture, TextureId(42));
        assert_eq!(level.segment(ids[2]).unwrap().connection(SideId::Front), Some(ids[0]));
        assert_relative_eq!(
            level.hexahedron(ids[0]).unwrap().center(),
            Point3::new(0.0, 0.0, -10.0),
            epsilon = 1e-9
        );
        assert_valid(&level);
    }

    #[test]
    fn objects_move_into_the_kept_segment() {
        let (mut level, ids) = corridor(2);
        let robot = level
            .add_object(Object::new(ObjectKind::Robot, ids[1], Point3::new(0.0, 0.0, -20.0)))
            .unwrap();
        MergeSegments::new(ids[0], ids[1]).execute(&mut level).unwrap();
        assert_eq!(level.object(robot).unwrap().segment, ids[0]);
        assert_valid(&level);
    }

    #[test]
    fn unconnected_segments_are_refused() {
        let (mut level, a) = one_cube();
        let b = lone_cube(&mut level, Point3::new(0.0, 0.0, -20.0));
        assert!(MergeSegments::new(a, b).execute(&mut level).is_err());
        assert_eq!(level.segment_count(), 2);
    }
}
