use std::collections::HashMap;

use tracing::{debug, instrument, warn};

use crate::error::{OperationError, Result};
use crate::topology::{Level, SegmentId, Side, SideId, Tag, TriggerId, VertexId};

use super::payload::{ClipMatcen, ClipObject, ClipSegment, ClipTag, ClipTrigger, ClipWall, Clipboard};

/// Captures a group of segments into a [`Clipboard`].
///
/// Connections leaving the group are severed, and walls on those sides are
/// left behind. Triggers come along with the walls that own them, keeping
/// only targets inside the group.
pub struct CopySegments {
    segments: Vec<SegmentId>,
}

impl CopySegments {
    /// Creates a new `CopySegments` operation.
    #[must_use]
    pub fn new(segments: Vec<SegmentId>) -> Self {
        Self { segments }
    }

    /// Executes the copy. The level is not modified.
    ///
    /// # Errors
    ///
    /// Returns an error if no segment is given or a segment does not exist.
    #[instrument(skip_all, fields(segments = self.segments.len()))]
    pub fn execute(&self, level: &Level) -> Result<Clipboard> {
        let mut order: Vec<SegmentId> = Vec::with_capacity(self.segments.len());
        for id in &self.segments {
            level.segment(*id)?;
            if !order.contains(id) {
                order.push(*id);
            }
        }
        if order.is_empty() {
            return Err(OperationError::InvalidInput("nothing to copy".into()).into());
        }
        let local: HashMap<SegmentId, usize> = order.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let local_tag = |tag: &Tag| {
            local.get(&tag.segment).map(|segment| ClipTag {
                segment: *segment,
                side: tag.side,
            })
        };

        let mut clipboard = Clipboard::default();
        let mut vertices: HashMap<VertexId, usize> = HashMap::new();
        let mut triggers: HashMap<TriggerId, usize> = HashMap::new();
        let mut dropped = 0;

        for (i, id) in order.iter().enumerate() {
            let segment = level.segment(*id)?;
            let mut corners = [0; 8];
            for (slot, v) in corners.iter_mut().zip(segment.vertices) {
                *slot = match vertices.get(&v) {
                    Some(index) => *index,
                    None => {
                        clipboard.vertices.push(level.point(v)?);
                        vertices.insert(v, clipboard.vertices.len() - 1);
                        clipboard.vertices.len() - 1
                    }
                };
            }
            let connections = segment
                .connections
                .map(|c| c.and_then(|n| local.get(&n).copied()));
            clipboard.segments.push(ClipSegment {
                vertices: corners,
                sides: segment.sides.clone().map(|s| Side::surface_of(&s)),
                connections,
                kind: segment.kind,
            });

            for side in SideId::ALL {
                let Some(wall_id) = segment.side(side).wall else {
                    continue;
                };
                if connections[side.index()].is_none() {
                    dropped += 1;
                    continue;
                }
                let wall = level.wall(wall_id)?;
                let trigger = match wall.trigger {
                    None => None,
                    Some(t) => match triggers.get(&t) {
                        Some(index) => Some(*index),
                        None => {
                            let source = level.trigger(t)?;
                            clipboard.triggers.push(ClipTrigger {
                                kind: source.kind,
                                flags: source.flags,
                                value: source.value,
                                targets: source.targets.iter().filter_map(local_tag).collect(),
                            });
                            triggers.insert(t, clipboard.triggers.len() - 1);
                            Some(clipboard.triggers.len() - 1)
                        }
                    },
                };
                clipboard.walls.push(ClipWall {
                    tag: ClipTag { segment: i, side },
                    kind: wall.kind,
                    flags: wall.flags,
                    trigger,
                });
            }

            if let Some(matcen) = segment.matcen {
                let matcen = level.matcen(matcen)?;
                clipboard.matcens.push(ClipMatcen {
                    segment: i,
                    robot_flags: matcen.robot_flags,
                });
            }
            for object in level.objects_in(*id) {
                let object = level.object(object)?;
                clipboard.objects.push(ClipObject {
                    kind: object.kind,
                    subtype: object.subtype,
                    segment: i,
                    position: object.position,
                    orientation: object.orientation,
                });
            }
        }

        if dropped > 0 {
            warn!(dropped, "walls on severed sides were not copied");
        }
        debug!(
            segments = clipboard.segments.len(),
            vertices = clipboard.vertices.len(),
            walls = clipboard.walls.len(),
            "copied segments"
        );
        Ok(clipboard)
    }
}
