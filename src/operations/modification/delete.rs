use tracing::{debug, instrument};

use crate::error::{Result, TopologyError};
use crate::operations::connectivity::{Disconnect, WallPolicy};
use crate::operations::weld::PruneVertices;
use crate::topology::{Level, SegmentId, SideId, Tag};

/// Removes a segment and every reference to it.
///
/// The cascade runs in a fixed order: matcen, contained objects, walls on the
/// segment and on the sides facing it, connections, trigger targets, delta
/// lights, then the segment itself and the vertices only it used. Surviving
/// entities keep their keys.
pub struct DeleteSegment {
    segment: SegmentId,
}

impl DeleteSegment {
    /// Creates a new `DeleteSegment` operation.
    #[must_use]
    pub fn new(segment: SegmentId) -> Self {
        Self { segment }
    }

    /// Executes the deletion.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::LastSegment`] for the only remaining segment,
    /// or an error if the segment does not exist.
    #[instrument(skip_all, fields(segment = ?self.segment))]
    pub fn execute(&self, level: &mut Level) -> Result<()> {
        let id = self.segment;
        let segment = level.segment(id)?.clone();
        if level.segment_count() == 1 {
            return Err(TopologyError::LastSegment.into());
        }

        let matcens: Vec<_> = level
            .matcens()
            .filter(|(_, m)| m.segment == id)
            .map(|(m, _)| m)
            .collect();
        for matcen in matcens {
            level.remove_matcen(matcen);
        }

        let objects = level.objects_in(id);
        for object in &objects {
            level.remove_object(*object);
        }

        let mut walls = 0;
        for side in SideId::ALL {
            let tag = Tag::new(id, side);
            if level.remove_wall_at(tag) {
                walls += 1;
            }
            if let Some(paired) = level.find_paired_side(tag) {
                if level.remove_wall_at(paired) {
                    walls += 1;
                }
            }
        }

        for (side, _) in segment.connected_sides() {
            Disconnect::new(Tag::new(id, side))
                .with_walls(WallPolicy::Remove)
                .execute(level)?;
        }

        let targets = level.forget_trigger_targets(id);
        level.forget_delta_lights(id);
        level.take_segment(id);
        let pruned = PruneVertices::new()
            .among(segment.vertices.to_vec())
            .execute(level);
        debug!(objects = objects.len(), walls, targets, pruned, "deleted segment");
        Ok(())
    }
}
