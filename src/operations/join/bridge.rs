use tracing::{instrument, warn};

use crate::error::Result;
use crate::operations::creation::{InsertMode, InsertSegment};
use crate::operations::modification::DeleteSegment;
use crate::topology::{Level, SegmentId, Tag};

use super::join::JoinSides;

/// Spans the gap between two open sides with one new segment.
pub struct BridgeSides {
    from: Tag,
    to: Tag,
}

impl BridgeSides {
    /// Creates a new `BridgeSides` operation.
    #[must_use]
    pub fn new(from: Tag, to: Tag) -> Self {
        Self { from, to }
    }

    /// Executes the bridge and returns the new segment.
    ///
    /// # Errors
    ///
    /// Returns the insertion or join error. The inserted segment is removed
    /// again when the join fails.
    #[instrument(skip_all, fields(from = %self.from, to = %self.to))]
    pub fn execute(&self, level: &mut Level) -> Result<SegmentId> {
        level.segment(self.to.segment)?;
        let id = InsertSegment::new(self.from, InsertMode::Normal).execute(level)?;
        if let Err(err) = JoinSides::new(Tag::new(id, self.from.side), self.to).execute(level) {
            warn!(%err, "bridge join failed, removing inserted segment");
            DeleteSegment::new(id).execute(level)?;
            return Err(err);
        }
        Ok(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::test_support::{assert_valid, lone_cube, one_cube};
    use crate::topology::SideId;

    #[test]
    fn fills_the_gap_between_two_cubes() {
        let (mut level, a) = one_cube();
        let c = lone_cube(&mut level, Point3::new(0.0, 0.0, 60.0));
        let b = BridgeSides::new(Tag::new(a, SideId::Front), Tag::new(c, SideId::Back))
            .execute(&mut level)
            .unwrap();

        let seg = level.segment(b).unwrap();
        assert_eq!(seg.connection(SideId::Back), Some(a));
        assert_eq!(seg.connection(SideId::Front), Some(c));
        assert_eq!(level.segment_count(), 3);
        assert_eq!(level.vertex_count(), 16);
        assert!(level.hexahedron(b).unwrap().is_well_formed(level.config()));
        assert_valid(&level);
    }

    #[test]
    fn failed_bridge_restores_the_level() {
        let (mut level, a) = one_cube();
        let c = lone_cube(&mut level, Point3::new(0.0, 0.0, -60.0));
        let result = BridgeSides::new(Tag::new(a, SideId::Front), Tag::new(c, SideId::Front))
            .execute(&mut level);
        assert!(result.is_err());
        assert_eq!(level.segment_count(), 2);
        assert_eq!(level.vertex_count(), 16);
        assert_eq!(level.segment(a).unwrap().connection(SideId::Front), None);
        assert_valid(&level);
    }
}
