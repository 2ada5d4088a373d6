//! Establishing and breaking symmetric side connections.
//!
//! Every connection is stored twice, once on each segment, and the paired
//! side is never cached. These operations are the only place that writes
//! `Segment::connections`.

mod connect;
mod disconnect;

pub use connect::Connect;
pub use disconnect::{Disconnect, WallPolicy};

use tracing::debug;

use crate::topology::{Level, SegmentId, Tag};

/// Removes walls left on sides without a connection among `segments`.
///
/// Returns the number of walls removed.
pub(crate) fn remove_walls_on_open_sides(level: &mut Level, segments: &[SegmentId]) -> usize {
    let stranded: Vec<Tag> = segments
        .iter()
        .filter_map(|id| level.segment(*id).ok().map(|s| (*id, s)))
        .flat_map(|(id, s)| {
            s.open_sides()
                .filter(|side| s.side(*side).wall.is_some())
                .map(move |side| Tag::new(id, side))
                .collect::<Vec<_>>()
        })
        .collect();
    let removed = stranded
        .into_iter()
        .filter(|tag| level.remove_wall_at(*tag))
        .count();
    if removed > 0 {
        debug!(removed, "removed walls left on open sides");
    }
    removed
}
