use std::collections::HashMap;

use crate::topology::{Level, VertexId};

/// Rewrites every segment corner through `map` in one simultaneous pass.
///
/// Each corner is looked up once, so a map that swaps two ids never chains.
/// Returns the number of corners rewritten.
pub(crate) fn replace_vertices(level: &mut Level, map: &HashMap<VertexId, VertexId>) -> usize {
    if map.is_empty() {
        return 0;
    }
    let mut rewritten = 0;
    for (_, segment) in level.segments_mut() {
        for corner in &mut segment.vertices {
            if let Some(target) = map.get(corner) {
                *corner = *target;
                rewritten += 1;
            }
        }
    }
    rewritten
}
