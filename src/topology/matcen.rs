use tracing::debug;

use crate::error::{OperationError, Result, TopologyError};

use super::segment::{SegmentId, SegmentKind};
use super::Level;

slotmap::new_key_type! {
    /// Unique identifier for a matcen in the level.
    pub struct MatcenId;
}

/// A robot generator bound to one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matcen {
    pub segment: SegmentId,
    /// Bit set of robot types produced.
    pub robot_flags: [u32; 2],
}

impl Level {
    /// Turns a segment into a matcen.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment does not exist, already has a special
    /// kind, or the matcen limit is reached.
    pub fn add_matcen(&mut self, segment: SegmentId, robot_flags: [u32; 2]) -> Result<MatcenId> {
        let seg = self.segment(segment)?;
        if seg.kind != SegmentKind::None || seg.matcen.is_some() {
            return Err(OperationError::InvalidInput(format!(
                "segment {segment:?} already is {:?}",
                seg.kind
            ))
            .into());
        }
        let limit = self.config.limits.matcens;
        if self.matcens.len() >= limit {
            return Err(OperationError::CapacityExceeded { entity: "matcens", limit }.into());
        }
        let id = self.matcens.insert(Matcen {
            segment,
            robot_flags,
        });
        let seg = self.segment_mut(segment)?;
        seg.kind = SegmentKind::Matcen;
        seg.matcen = Some(id);
        debug!(?id, ?segment, "added matcen");
        Ok(id)
    }

    /// Removes a matcen and resets its segment to a plain segment.
    ///
    /// Returns `false` if the matcen does not exist.
    pub fn remove_matcen(&mut self, id: MatcenId) -> bool {
        let Some(matcen) = self.matcens.remove(id) else {
            return false;
        };
        if let Some(seg) = self.segments.get_mut(matcen.segment) {
            if seg.matcen == Some(id) {
                seg.matcen = None;
                seg.kind = SegmentKind::None;
            }
        }
        true
    }

    /// Changes a segment's kind, creating or removing its matcen as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment does not exist or a matcen cannot be added.
    pub fn set_segment_kind(&mut self, segment: SegmentId, kind: SegmentKind) -> Result<()> {
        let current = self.segment(segment)?;
        if current.kind == kind {
            return Ok(());
        }
        if let Some(matcen) = current.matcen {
            self.remove_matcen(matcen);
        }
        if kind == SegmentKind::Matcen {
            self.segment_mut(segment)?.kind = SegmentKind::None;
            self.add_matcen(segment, [0; 2])?;
        } else {
            self.segment_mut(segment)?.kind = kind;
        }
        Ok(())
    }

    /// Returns a reference to the matcen, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the level.
    pub fn matcen(&self, id: MatcenId) -> Result<&Matcen> {
        Ok(self
            .matcens
            .get(id)
            .ok_or(TopologyError::EntityNotFound("matcen"))?)
    }

    /// Iterates over all matcens.
    pub fn matcens(&self) -> impl Iterator<Item = (MatcenId, &Matcen)> {
        self.matcens.iter()
    }

    /// Number of matcens in the level.
    #[must_use]
    pub fn matcen_count(&self) -> usize {
        self.matcens.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::two_cubes;

    #[test]
    fn one_matcen_per_segment() {
        let (mut level, a, _) = two_cubes();
        let id = level.add_matcen(a, [1, 0]).unwrap();
        assert!(level.add_matcen(a, [2, 0]).is_err());
        assert_eq!(level.segment(a).unwrap().matcen, Some(id));

        assert!(level.remove_matcen(id));
        let seg = level.segment(a).unwrap();
        assert_eq!(seg.kind, SegmentKind::None);
        assert_eq!(seg.matcen, None);
    }

    #[test]
    fn set_kind_switches_between_matcen_and_reactor() {
        let (mut level, a, _) = two_cubes();
        level.set_segment_kind(a, SegmentKind::Matcen).unwrap();
        assert_eq!(level.matcen_count(), 1);
        level.set_segment_kind(a, SegmentKind::Reactor).unwrap();
        assert_eq!(level.matcen_count(), 0);
        assert_eq!(level.segment(a).unwrap().kind, SegmentKind::Reactor);
    }
}
