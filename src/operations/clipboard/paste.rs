use std::collections::HashMap;

use tracing::{debug, instrument, warn};

use crate::error::{LevelError, OperationError, Result};
use crate::math::Vector3;
use crate::operations::connectivity::Connect;
use crate::operations::join::JoinTouchingSides;
use crate::topology::{
    Level, Object, Segment, SegmentId, SegmentKind, Side, Tag, TextureId, Trigger, TriggerId,
    VertexId, WallId,
};

use super::payload::{ClipTag, Clipboard};

/// Outcome of a paste.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PasteReport {
    /// New segments, in clipboard order.
    pub segments: Vec<SegmentId>,
    /// Entities left out because a capacity limit was reached.
    pub warnings: Vec<String>,
}

/// Inserts a [`Clipboard`] into a level.
///
/// Segments and vertices are all-or-nothing. Walls, triggers, matcens and
/// objects are added until their limits are reached; the rest are skipped
/// with a warning. The pasted group is finally welded onto anything it
/// touches.
pub struct PasteSegments<'a> {
    clipboard: &'a Clipboard,
    offset: Vector3,
}

fn is_capacity(err: &LevelError) -> bool {
    matches!(err, LevelError::Operation(OperationError::CapacityExceeded { .. }))
}

impl<'a> PasteSegments<'a> {
    /// Creates a new `PasteSegments` operation.
    #[must_use]
    pub fn new(clipboard: &'a Clipboard) -> Self {
        Self {
            clipboard,
            offset: Vector3::zeros(),
        }
    }

    /// Translates everything pasted by `offset`.
    #[must_use]
    pub fn with_offset(mut self, offset: Vector3) -> Self {
        self.offset = offset;
        self
    }

    /// Executes the paste.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is inconsistent or the level cannot
    /// hold its segments and vertices. Nothing is pasted in that case.
    #[instrument(skip_all, fields(segments = self.clipboard.segments.len()))]
    pub fn execute(&self, level: &mut Level) -> Result<PasteReport> {
        let clip = self.clipboard;
        if clip.is_empty() {
            return Err(OperationError::InvalidInput("clipboard is empty".into()).into());
        }
        let pairs = clip.connection_pairs()?;
        level.check_capacity(clip.vertices.len(), clip.segments.len())?;

        let mut report = PasteReport::default();
        let mut vertices: Vec<VertexId> = Vec::with_capacity(clip.vertices.len());
        for p in &clip.vertices {
            vertices.push(level.add_vertex(p + self.offset)?);
        }
        let mut textures: Vec<TextureId> = Vec::new();
        for source in &clip.segments {
            let mut segment = Segment::new(source.vertices.map(|i| vertices[i]));
            segment.sides = source.sides.clone().map(|s| Side::surface_of(&s));
            if source.kind != SegmentKind::Matcen {
                segment.kind = source.kind;
            }
            textures.extend(segment.sides.iter().flat_map(Side::textures));
            report.segments.push(level.add_segment(segment)?);
        }
        let tag = |t: ClipTag| Tag::new(report.segments[t.segment], t.side);
        for (a, b) in &pairs {
            Connect::new(tag(*a), tag(*b)).execute(level)?;
        }

        for matcen in &clip.matcens {
            match level.add_matcen(report.segments[matcen.segment], matcen.robot_flags) {
                Ok(_) => {}
                Err(err) if is_capacity(&err) => report.warnings.push(err.to_string()),
                Err(err) => return Err(err),
            }
        }

        let mut walls: HashMap<usize, WallId> = HashMap::new();
        for (i, wall) in clip.walls.iter().enumerate() {
            let at = tag(wall.tag);
            let side = clip.segments[wall.tag.segment].sides[wall.tag.side.index()].clone();
            match level.add_wall(at, wall.kind, side.texture, side.overlay, wall.flags) {
                Ok(id) => {
                    walls.insert(i, id);
                }
                Err(err) if is_capacity(&err) => report.warnings.push(err.to_string()),
                Err(err) => return Err(err),
            }
        }

        let mut triggers: HashMap<usize, TriggerId> = HashMap::new();
        for (i, wall) in clip.walls.iter().enumerate() {
            let (Some(local), Some(wall_id)) = (wall.trigger, walls.get(&i)) else {
                continue;
            };
            if let Some(existing) = triggers.get(&local) {
                level.wall_mut(*wall_id)?.trigger = Some(*existing);
                continue;
            }
            let source = &clip.triggers[local];
            let mut trigger = Trigger::new(source.kind, source.targets.iter().map(|t| tag(*t)).collect());
            trigger.flags = source.flags;
            trigger.value = source.value;
            match level.add_trigger(*wall_id, trigger) {
                Ok(id) => {
                    triggers.insert(local, id);
                }
                Err(err) if is_capacity(&err) => report.warnings.push(err.to_string()),
                Err(err) => return Err(err),
            }
        }

        for source in &clip.objects {
            let mut object = Object::new(
                source.kind,
                report.segments[source.segment],
                source.position + self.offset,
            );
            object.subtype = source.subtype;
            object.orientation = source.orientation;
            match level.add_object(object) {
                Ok(_) => {}
                Err(err) if is_capacity(&err) => {
                    report.warnings.push(err.to_string());
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        for texture in textures {
            level.request_texture(texture);
        }
        for warning in &report.warnings {
            warn!(%warning, "paste truncated");
        }
        let joined = JoinTouchingSides::new(report.segments.clone()).execute(level)?;
        debug!(segments = report.segments.len(), joined, "pasted segments");
        Ok(report)
    }
}
