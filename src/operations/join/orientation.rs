use crate::config::EditorConfig;
use crate::error::Result;
use crate::geometry::Hexahedron;
use crate::math::Point3;
use crate::topology::{Level, SegmentId, Tag, VertexId};

/// One of the eight ways to lay a quad's corners onto another quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Orientation {
    /// Cyclic offset, `0..4`.
    pub rotation: usize,
    /// Walks the target corners in the opposite direction.
    pub reversed: bool,
}

impl Orientation {
    /// All eight orientations, forward windings first.
    pub const ALL: [Orientation; 8] = [
        Orientation { rotation: 0, reversed: false },
        Orientation { rotation: 1, reversed: false },
        Orientation { rotation: 2, reversed: false },
        Orientation { rotation: 3, reversed: false },
        Orientation { rotation: 0, reversed: true },
        Orientation { rotation: 1, reversed: true },
        Orientation { rotation: 2, reversed: true },
        Orientation { rotation: 3, reversed: true },
    ];

    /// Target corner that corner `k` of the moving side lands on.
    #[must_use]
    pub fn map(self, k: usize) -> usize {
        if self.reversed {
            (self.rotation + 4 - k % 4) % 4
        } else {
            (self.rotation + k) % 4
        }
    }

    /// Applies the orientation to four per-corner values of the target side.
    #[must_use]
    pub fn pick<T: Copy>(self, target: [T; 4]) -> [T; 4] {
        [0, 1, 2, 3].map(|k| target[self.map(k)])
    }
}

/// The winning candidate of an orientation search.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Alignment {
    pub orientation: Orientation,
    /// Target vertex ids in the moving side's corner order.
    pub vertices: [VertexId; 4],
    /// Worst corner angle of the moved segment.
    pub score: f64,
}

/// Scores every orientation of `moving` laid onto `target` without
/// mutating the level.
///
/// Orientations that would fold a corner onto another corner of the moving
/// segment, or that disagree with vertices the sides already share, are
/// skipped. The rest must pass the ray check, both for the moving segment and
/// for every other segment sharing one of the moved corners; the lowest worst
/// corner angle wins.
pub(crate) fn best_alignment(
    level: &Level,
    moving: Tag,
    target: Tag,
    config: &EditorConfig,
) -> Result<Option<Alignment>> {
    let segment = level.segment(moving.segment)?;
    let hex = level.hexahedron(moving.segment)?;
    let moving_ids = segment.side_vertices(moving.side);
    let target_ids = level.segment(target.segment)?.side_vertices(target.side);
    let mut target_points = [Point3::origin(); 4];
    for (slot, id) in target_points.iter_mut().zip(target_ids) {
        *slot = level.point(id)?;
    }
    let fixed: Vec<VertexId> = (0..8)
        .filter(|c| !moving.side.corners().contains(c))
        .map(|c| segment.vertices[c])
        .collect();

    let mut neighbours: Vec<(SegmentId, [VertexId; 8], [Point3; 8])> = Vec::new();
    for id in moving_ids {
        for user in level.vertex_users(id) {
            if user != moving.segment && neighbours.iter().all(|(s, _, _)| *s != user) {
                let vertices = level.segment(user)?.vertices;
                neighbours.push((user, vertices, level.segment_points(user)?));
            }
        }
    }

    let mut best: Option<Alignment> = None;
    for orientation in Orientation::ALL {
        let vertices = orientation.pick(target_ids);
        if vertices.iter().any(|v| fixed.contains(v)) {
            continue;
        }
        let consistent = moving_ids.iter().enumerate().all(|(k, id)| {
            !target_ids.contains(id) || vertices[k] == *id
        });
        if !consistent {
            continue;
        }
        let moved = orientation.pick(target_points);
        let candidate: Hexahedron = hex.with_side(moving.side, moved);
        if !candidate.is_well_formed(config) {
            continue;
        }
        let breaks_neighbour = neighbours.iter().any(|(_, ids, points)| {
            let mut points = *points;
            for (slot, id) in points.iter_mut().zip(ids) {
                if let Some(k) = moving_ids.iter().position(|m| m == id) {
                    *slot = moved[k];
                }
            }
            !Hexahedron::new(points).is_well_formed(config)
        });
        if breaks_neighbour {
            continue;
        }
        let score = candidate.worst_corner_angle();
        if best.is_none_or(|b| score < b.score) {
            best = Some(Alignment {
                orientation,
                vertices,
                score,
            });
        }
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_orientation_is_a_bijection() {
        for o in Orientation::ALL {
            let image: HashSet<usize> = (0..4).map(|k| o.map(k)).collect();
            assert_eq!(image.len(), 4, "{o:?}");
        }
    }

    #[test]
    fn orientations_are_distinct() {
        let maps: HashSet<[usize; 4]> = Orientation::ALL.iter().map(|o| o.pick([0, 1, 2, 3])).collect();
        assert_eq!(maps.len(), 8);
    }

    #[test]
    fn reversal_flips_winding() {
        for o in Orientation::ALL {
            let step = (o.map(1) + 4 - o.map(0)) % 4;
            assert_eq!(step, if o.reversed { 3 } else { 1 }, "{o:?}");
            for k in 0..4 {
                let next = (o.map((k + 1) % 4) + 4 - o.map(k)) % 4;
                assert_eq!(next, step);
            }
        }
    }
}
