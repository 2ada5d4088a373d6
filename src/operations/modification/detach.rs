use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::error::{Result, TopologyError};
use crate::operations::connectivity::{Disconnect, WallPolicy};
use crate::topology::{Level, SegmentId, Tag, VertexId};

/// Segments that must keep sharing `vertex` with `start`: those reachable
/// through connected sides that contain the vertex.
fn sharing_group(level: &Level, start: SegmentId, vertex: VertexId) -> HashSet<SegmentId> {
    let mut group = HashSet::from([start]);
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        let Ok(segment) = level.segment(id) else {
            continue;
        };
        for (side, neighbour) in segment.connected_sides() {
            if segment.side_vertices(side).contains(&vertex) && group.insert(neighbour) {
                stack.push(neighbour);
            }
        }
    }
    group
}

/// Gives `start` and the segments it stays connected to through `vertex`
/// their own copy of the vertex, if anyone else still uses it.
///
/// Returns the new vertex, if one was made.
fn unshare(level: &mut Level, start: SegmentId, vertex: VertexId) -> Result<Option<VertexId>> {
    let group = sharing_group(level, start, vertex);
    let outside = level
        .vertex_users(vertex)
        .into_iter()
        .any(|user| !group.contains(&user));
    if !outside {
        return Ok(None);
    }
    let copy = level.add_vertex(level.point(vertex)?)?;
    for id in group {
        let segment = level.segment_mut(id)?;
        for corner in &mut segment.vertices {
            if *corner == vertex {
                *corner = copy;
            }
        }
    }
    Ok(Some(copy))
}

/// Cuts a segment loose from all of its neighbours.
///
/// Every connection is broken and each corner still used by another segment
/// is replaced by a private copy at the same position.
pub struct DetachSegment {
    segment: SegmentId,
    walls: WallPolicy,
}

impl DetachSegment {
    /// Creates a new `DetachSegment` operation that removes walls on broken connections.
    #[must_use]
    pub fn new(segment: SegmentId) -> Self {
        Self {
            segment,
            walls: WallPolicy::Remove,
        }
    }

    /// Sets how walls on the broken connections are treated.
    #[must_use]
    pub fn with_walls(mut self, walls: WallPolicy) -> Self {
        self.walls = walls;
        self
    }

    /// Executes the detach, returning the neighbour sides that faced the segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment does not exist or the level cannot
    /// hold the copied vertices.
    #[instrument(skip_all, fields(segment = ?self.segment))]
    pub fn execute(&self, level: &mut Level) -> Result<Vec<Tag>> {
        let segment = level.segment(self.segment)?.clone();
        let shared: Vec<VertexId> = unique(&segment.vertices)
            .into_iter()
            .filter(|v| level.vertex_users(*v).len() > 1)
            .collect();
        level.check_capacity(shared.len(), 0)?;

        let mut former = Vec::new();
        for (side, _) in segment.connected_sides() {
            let paired = Disconnect::new(Tag::new(self.segment, side))
                .with_walls(self.walls)
                .execute(level)?;
            former.extend(paired);
        }
        let mut copies = 0;
        for vertex in shared {
            if unshare(level, self.segment, vertex)?.is_some() {
                copies += 1;
            }
        }
        debug!(neighbours = former.len(), copies, "detached segment");
        Ok(former)
    }
}

/// Breaks one connection and separates the corners of that side.
///
/// A corner stays shared when the two segments are still linked around it
/// through other connections.
pub struct DetachSide {
    tag: Tag,
}

impl DetachSide {
    /// Creates a new `DetachSide` operation.
    #[must_use]
    pub fn new(tag: Tag) -> Self {
        Self { tag }
    }

    /// Executes the detach, returning the side that used to pair with `tag`.
    ///
    /// # Errors
    ///
    /// Returns an error if the side does not exist or has no connection, or
    /// the level cannot hold four more vertices.
    #[instrument(skip_all, fields(tag = %self.tag))]
    pub fn execute(&self, level: &mut Level) -> Result<Option<Tag>> {
        let segment = level.segment(self.tag.segment)?;
        if segment.connection(self.tag.side).is_none() {
            return Err(TopologyError::SideNotConnected(self.tag).into());
        }
        let corners = segment.side_vertices(self.tag.side);
        level.check_capacity(4, 0)?;

        let paired = Disconnect::new(self.tag).execute(level)?;
        let mut copies = 0;
        for vertex in corners {
            if unshare(level, self.tag.segment, vertex)?.is_some() {
                copies += 1;
            }
        }
        debug!(copies, "detached side");
        Ok(paired)
    }
}

fn unique(vertices: &[VertexId; 8]) -> Vec<VertexId> {
    let mut seen = HashSet::new();
    vertices.iter().copied().filter(|v| seen.insert(*v)).collect()
}
