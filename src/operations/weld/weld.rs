use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use crate::error::Result;
use crate::topology::{Level, SegmentId, VertexId};

use super::replace_vertices;

/// Merges near-duplicate vertices among a set of candidates.
///
/// For every pair closer than the tolerance the higher id is replaced by the
/// lower one, so replacements never form chains. A pair is skipped when one
/// segment uses both vertices, since merging them would collapse that
/// segment's edge. Merged-away vertices are removed immediately, so running
/// the same weld twice finds nothing the second time.
pub struct WeldVertices {
    points: Vec<VertexId>,
    tolerance: f64,
}

impl WeldVertices {
    /// Creates a new `WeldVertices` operation over `points`.
    #[must_use]
    pub fn new(points: Vec<VertexId>, tolerance: f64) -> Self {
        Self { points, tolerance }
    }

    /// Executes the weld, returning the number of vertices merged away.
    ///
    /// Candidates that no longer exist are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if a surviving vertex cannot be read.
    #[instrument(skip_all, fields(candidates = self.points.len(), tolerance = self.tolerance))]
    pub fn execute(&self, level: &mut Level) -> Result<usize> {
        let mut points: Vec<VertexId> = self
            .points
            .iter()
            .copied()
            .filter(|p| level.contains_vertex(*p))
            .collect();
        points.sort_unstable();
        points.dedup();

        let candidates: HashSet<VertexId> = points.iter().copied().collect();
        let mut users: HashMap<VertexId, Vec<SegmentId>> = HashMap::new();
        for (id, segment) in level.segments() {
            for v in segment.vertices {
                if candidates.contains(&v) {
                    users.entry(v).or_default().push(id);
                }
            }
        }
        let share_segment = |a: &VertexId, b: &VertexId| match (users.get(a), users.get(b)) {
            (Some(ua), Some(ub)) => ua.iter().any(|s| ub.contains(s)),
            _ => false,
        };

        let mut replacements: HashMap<VertexId, VertexId> = HashMap::new();
        for (i, low) in points.iter().enumerate() {
            if replacements.contains_key(low) {
                continue;
            }
            let low_point = level.point(*low)?;
            for high in &points[i + 1..] {
                if replacements.contains_key(high) {
                    continue;
                }
                let distance = (level.point(*high)? - low_point).norm();
                if distance < self.tolerance && !share_segment(low, high) {
                    replacements.insert(*high, *low);
                }
            }
        }

        let rewritten = replace_vertices(level, &replacements);
        for gone in replacements.keys() {
            level.remove_vertex(*gone);
        }
        debug!(merged = replacements.len(), rewritten, "welded vertices");
        Ok(replacements.len())
    }
}
