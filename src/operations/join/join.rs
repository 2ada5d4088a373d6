use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::error::{GeometryError, OperationError, Result, TopologyError};
use crate::operations::connectivity::Connect;
use crate::operations::weld::{replace_vertices, PruneVertices};
use crate::topology::{Level, Tag, VertexId};

use super::orientation::best_alignment;
use super::touching::JoinTouchingSides;

/// Moves an open side onto another open side and connects them.
///
/// The moving side takes over the target's vertices in the orientation that
/// passes the ray check with the smallest worst corner angle. Nothing is
/// mutated when no orientation qualifies.
pub struct JoinSides {
    moving: Tag,
    target: Tag,
}

impl JoinSides {
    /// Creates a new `JoinSides` operation.
    #[must_use]
    pub fn new(moving: Tag, target: Tag) -> Self {
        Self { moving, target }
    }

    /// Executes the join.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NoValidOrientation`] when every orientation
    /// leaves the moving segment, or a segment sharing its moved corners,
    /// degenerate, or a precondition error if a side
    /// is missing or already connected.
    #[instrument(skip_all, fields(moving = %self.moving, target = %self.target))]
    pub fn execute(&self, level: &mut Level) -> Result<()> {
        if self.moving.segment == self.target.segment {
            return Err(
                OperationError::InvalidInput("cannot join a segment to itself".into()).into(),
            );
        }
        for tag in [self.moving, self.target] {
            if level.segment(tag.segment)?.connection(tag.side).is_some() {
                return Err(TopologyError::SideConnected(tag).into());
            }
        }

        let config = level.config().clone();
        let Some(alignment) = best_alignment(level, self.moving, self.target, &config)? else {
            return Err(GeometryError::NoValidOrientation {
                moving: self.moving,
                target: self.target,
            }
            .into());
        };
        debug!(orientation = ?alignment.orientation, score = alignment.score, "chose orientation");

        let old = level.segment(self.moving.segment)?.side_vertices(self.moving.side);
        let map: HashMap<VertexId, VertexId> = old
            .into_iter()
            .zip(alignment.vertices)
            .filter(|(from, to)| from != to)
            .collect();
        replace_vertices(level, &map);
        PruneVertices::new()
            .among(map.keys().copied().collect())
            .execute(level);

        Connect::new(self.moving, self.target).execute(level)?;
        JoinTouchingSides::new(vec![self.moving.segment])
            .with_tolerance(config.join_tolerance)
            .execute(level)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::test_support::{assert_valid, attach_cube, lone_cube, one_cube, v};
    use crate::topology::{side_key, SideId};
    use approx::assert_relative_eq;

    #[test]
    fn snaps_a_nearly_aligned_cube_square() {
        let (mut level, a) = one_cube();
        let b = lone_cube(&mut level, Point3::new(0.0, 0.0, -20.0));
        let stray = level.segment(b).unwrap().vertices[2];
        level.vertex_mut(stray).unwrap().point += v(3.0, 3.0, 0.0);

        JoinSides::new(Tag::new(b, SideId::Front), Tag::new(a, SideId::Back))
            .execute(&mut level)
            .unwrap();

        let seg_b = level.segment(b).unwrap();
        assert_eq!(seg_b.connection(SideId::Front), Some(a));
        assert_eq!(
            side_key(seg_b.side_vertices(SideId::Front)),
            side_key(level.segment(a).unwrap().side_vertices(SideId::Back))
        );
        assert_relative_eq!(level.hexahedron(b).unwrap().worst_corner_angle(), 0.0, epsilon = 1e-9);
        assert_eq!(level.vertex_count(), 12);
        assert_valid(&level);
    }

    #[test]
    fn joins_across_a_gap() {
        let (mut level, a) = one_cube();
        let b = lone_cube(&mut level, Point3::new(0.0, 0.0, -40.0));
        JoinSides::new(Tag::new(b, SideId::Front), Tag::new(a, SideId::Back))
            .execute(&mut level)
            .unwrap();
        let hex = level.hexahedron(b).unwrap();
        assert_relative_eq!(hex.center(), Point3::new(0.0, 0.0, -30.0), epsilon = 1e-9);
        assert_valid(&level);
    }

    #[test]
    fn failed_join_leaves_the_level_untouched() {
        let (mut level, a) = one_cube();
        let b = lone_cube(&mut level, Point3::new(0.0, 0.0, -40.0));
        let before: Vec<Point3> = level.vertices().map(|(_, v)| v.point).collect();

        let err = JoinSides::new(Tag::new(b, SideId::Back), Tag::new(a, SideId::Back))
            .execute(&mut level)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::LevelError::Geometry(GeometryError::NoValidOrientation { .. })
        ));
        let after: Vec<Point3> = level.vertices().map(|(_, v)| v.point).collect();
        assert_eq!(before, after);
        assert_eq!(level.segment(b).unwrap().connection(SideId::Back), None);
    }

    #[test]
    fn refuses_a_connected_side() {
        let (mut level, a) = one_cube();
        let b = lone_cube(&mut level, Point3::new(0.0, 0.0, -40.0));
        JoinSides::new(Tag::new(b, SideId::Front), Tag::new(a, SideId::Back))
            .execute(&mut level)
            .unwrap();
        let c = lone_cube(&mut level, Point3::new(100.0, 0.0, 0.0));
        assert!(JoinSides::new(Tag::new(c, SideId::Left), Tag::new(a, SideId::Back))
            .execute(&mut level)
            .is_err());
    }

    #[test]
    fn join_never_deforms_a_neighbour_of_the_moving_segment() {
        let (mut level, a) = one_cube();
        let b = lone_cube(&mut level, Point3::new(0.0, 0.0, -100.0));
        let c = attach_cube(&mut level, Tag::new(b, SideId::Top));
        let before: Vec<Point3> = level.vertices().map(|(_, vertex)| vertex.point).collect();

        let result = JoinSides::new(Tag::new(b, SideId::Front), Tag::new(a, SideId::Back)).execute(&mut level);

        assert!(level.hexahedron(c).unwrap().is_well_formed(level.config()));
        assert!(level.hexahedron(b).unwrap().is_well_formed(level.config()));
        if result.is_err() {
            let after: Vec<Point3> = level.vertices().map(|(_, vertex)| vertex.point).collect();
            assert_eq!(before, after);
            assert_eq!(level.segment(b).unwrap().connection(SideId::Front), None);
        }
        assert_valid(&level);
    }
}
