use tracing::{debug, instrument};

use crate::error::{Result, TopologyError};
use crate::math::{Plane, Point3, Vector3};
use crate::operations::connectivity::Connect;
use crate::topology::{Level, Segment, SegmentId, Side, Tag, TextureId, VertexId};

use super::ortho::ortho_face;

/// Placement of the four new corners of an inserted segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InsertMode {
    /// A square of the configured default size, pushed out along the side normal.
    Normal,
    /// The side's own corners translated by an offset. A zero offset is allowed.
    Extrude(Vector3),
    /// The source segment's opposite side reflected across the side's plane.
    Mirror,
    /// Explicit far corners, in the winding order of the source side.
    Explicit([Point3; 4]),
}

/// Grows a new segment out of an open side.
///
/// The new segment reuses the side's four vertices for its opposite side and
/// is connected to the source through them. Its surfaces are copied from the
/// source segment, except that door-clip textures are cleared.
pub struct InsertSegment {
    tag: Tag,
    mode: InsertMode,
}

impl InsertSegment {
    /// Creates a new `InsertSegment` operation on `tag`.
    #[must_use]
    pub fn new(tag: Tag, mode: InsertMode) -> Self {
        Self { tag, mode }
    }

    /// Executes the insertion and returns the new segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the side does not exist or already has a
    /// connection, the far corners cannot be computed, or the level is full.
    /// The level is left untouched on error.
    #[instrument(skip_all, fields(tag = %self.tag, mode = ?self.mode))]
    pub fn execute(&self, level: &mut Level) -> Result<SegmentId> {
        let source = level.segment(self.tag.segment)?.clone();
        if source.connection(self.tag.side).is_some() {
            return Err(TopologyError::SideConnected(self.tag).into());
        }
        let far = self.far_points(level)?;
        level.check_capacity(4, 1)?;

        let side = self.tag.side;
        let axis = side.axis();
        let mut corners = source.vertices;
        for (k, c) in side.corners().into_iter().enumerate() {
            corners[axis.flip(c)] = source.vertices[c];
            corners[c] = level.add_vertex(far[k])?;
        }

        let mut segment = Segment::new(corners);
        let config = level.config();
        for (dst, src) in segment.sides.iter_mut().zip(&source.sides) {
            *dst = Side::surface_of(src);
            if config.is_door_clip(dst.texture) {
                dst.texture = TextureId::default();
            }
            if dst.overlay.is_some_and(|t| config.is_door_clip(t)) {
                dst.overlay = None;
            }
        }
        let textures: Vec<TextureId> = segment.sides.iter().flat_map(Side::textures).collect();

        let id = level.add_segment(segment)?;
        Connect::new(self.tag, Tag::new(id, side.opposite())).execute(level)?;
        for texture in textures {
            level.request_texture(texture);
        }
        debug!(?id, "inserted segment");
        Ok(id)
    }

    fn far_points(&self, level: &Level) -> Result<[Point3; 4]> {
        let face = level.face(self.tag)?;
        match self.mode {
            InsertMode::Normal => ortho_face(&face.quad(), level.config().default_segment_size),
            InsertMode::Extrude(offset) => Ok(face.points().map(|p| p + offset)),
            InsertMode::Explicit(points) => Ok(points),
            InsertMode::Mirror => {
                let plane = Plane::from_normal(face.center(), face.average_normal())?;
                let segment = level.segment(self.tag.segment)?;
                let axis = self.tag.side.axis();
                let mut far = [Point3::origin(); 4];
                for (slot, c) in far.iter_mut().zip(self.tag.side.corners()) {
                    let behind: VertexId = segment.vertices[axis.flip(c)];
                    *slot = plane.reflect_point(&level.point(behind)?);
                }
                Ok(far)
            }
        }
    }
}
