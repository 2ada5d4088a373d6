use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use crate::error::Result;
use crate::operations::connectivity::Connect;
use crate::operations::query::BoundingBox;
use crate::operations::weld::WeldVertices;
use crate::math::Vector3;
use crate::topology::{side_key, Level, SegmentId, Tag, VertexId};

/// Welds and connects open sides that touch after an edit.
///
/// By default segments whose open-side corners fall inside the bounding box
/// of the given set (grown by the tolerance) take part too, so a split or a
/// paste reattaches to whatever already surrounds it.
pub struct JoinTouchingSides {
    segments: Vec<SegmentId>,
    tolerance: Option<f64>,
    surroundings: bool,
}

impl JoinTouchingSides {
    /// Creates a new `JoinTouchingSides` operation around `segments`.
    #[must_use]
    pub fn new(segments: Vec<SegmentId>) -> Self {
        Self {
            segments,
            tolerance: None,
            surroundings: true,
        }
    }

    /// Overrides the configured join tolerance. Zero disables welding.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Only considers the given segments, ignoring their surroundings.
    #[must_use]
    pub fn isolated(mut self) -> Self {
        self.surroundings = false;
        self
    }

    /// Executes the pass, returning the number of connections made.
    ///
    /// # Errors
    ///
    /// Returns an error if a vertex of a participating segment is missing.
    #[instrument(skip_all, fields(segments = self.segments.len()))]
    pub fn execute(&self, level: &mut Level) -> Result<usize> {
        let tolerance = self.tolerance.unwrap_or(level.config().join_tolerance);
        let set: Vec<SegmentId> = self
            .segments
            .iter()
            .copied()
            .filter(|id| level.contains_segment(*id))
            .collect();
        if set.is_empty() {
            return Ok(0);
        }
        let members: HashSet<SegmentId> = set.iter().copied().collect();
        let others = if self.surroundings {
            surrounding_segments(level, &set, &members, tolerance)?
        } else {
            Vec::new()
        };

        if tolerance > 0.0 {
            let mut candidates: Vec<VertexId> = set
                .iter()
                .filter_map(|id| level.segment(*id).ok())
                .flat_map(|s| s.vertices)
                .collect();
            candidates.extend(others.iter().flat_map(|id| open_side_vertices(level, *id)));
            WeldVertices::new(candidates, tolerance).execute(level)?;
        }

        let mut open: HashMap<[VertexId; 4], Vec<(Tag, Vector3)>> = HashMap::new();
        for id in set.iter().chain(&others) {
            let segment = level.segment(*id)?;
            for side in segment.open_sides() {
                let tag = Tag::new(*id, side);
                let normal = level.face(tag)?.average_normal();
                open.entry(side_key(segment.side_vertices(side)))
                    .or_default()
                    .push((tag, normal));
            }
        }

        let mut joined = 0;
        let mut used: HashSet<Tag> = HashSet::new();
        for tags in open.values().filter(|t| t.len() > 1) {
            for (i, (a, a_normal)) in tags.iter().enumerate() {
                if used.contains(a) {
                    continue;
                }
                // Segments on the same side of the face overlap instead of touching.
                let partner = tags[i + 1..].iter().find(|(b, b_normal)| {
                    !used.contains(b)
                        && b.segment != a.segment
                        && a_normal.dot(b_normal) < 0.0
                        && (members.contains(&a.segment) || members.contains(&b.segment))
                });
                if let Some((b, _)) = partner {
                    Connect::new(*a, *b).execute(level)?;
                    used.insert(*a);
                    used.insert(*b);
                    joined += 1;
                }
            }
        }
        debug!(joined, "joined touching sides");
        Ok(joined)
    }
}

fn open_side_vertices(level: &Level, id: SegmentId) -> Vec<VertexId> {
    level.segment(id).map_or_else(
        |_| Vec::new(),
        |s| s.open_sides().flat_map(|side| s.side_vertices(side)).collect(),
    )
}

fn surrounding_segments(
    level: &Level,
    set: &[SegmentId],
    members: &HashSet<SegmentId>,
    tolerance: f64,
) -> Result<Vec<SegmentId>> {
    let region = BoundingBox::new(set.to_vec())
        .execute(level)?
        .expanded(tolerance.max(0.0));

    let mut found = Vec::new();
    for (id, _) in level.segments().filter(|(id, _)| !members.contains(id)) {
        let near = open_side_vertices(level, id)
            .into_iter()
            .filter_map(|v| level.point(v).ok())
            .any(|p| region.contains(&p));
        if near {
            found.push(id);
        }
    }
    Ok(found)
}
