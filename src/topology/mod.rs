pub mod light;
pub mod matcen;
pub mod object;
pub mod segment;
pub mod tag;
pub mod trigger;
pub mod vertex;
pub mod wall;

pub use light::DeltaLight;
pub use matcen::{Matcen, MatcenId};
pub use object::{Object, ObjectId, ObjectKind};
pub use segment::{
    side_key, Axis, Segment, SegmentId, SegmentKind, Side, SideId, TextureId, CORNER_FLIP,
    CORNER_LATTICE, SIDE_CORNERS,
};
pub use tag::{PointTag, Tag};
pub use trigger::{Trigger, TriggerId, TriggerKind};
pub use vertex::{Vertex, VertexId};
pub use wall::{Wall, WallFlags, WallId, WallKind};

use slotmap::SlotMap;

use crate::config::EditorConfig;
use crate::error::{OperationError, Result, TopologyError};
use crate::geometry::{Face, FaceMut, Hexahedron};
use crate::math::{Point3, Vector3};

/// The level aggregate: every vertex, segment, wall, trigger, matcen and
/// object of one mine.
///
/// Entities reference each other via typed IDs (generational indices), so
/// removing an entity never renumbers the survivors and a stale ID fails
/// lookup instead of aliasing a reused slot.
#[derive(Debug, Clone, Default)]
pub struct Level {
    vertices: SlotMap<VertexId, Vertex>,
    segments: SlotMap<SegmentId, Segment>,
    walls: SlotMap<WallId, Wall>,
    triggers: SlotMap<TriggerId, Trigger>,
    matcens: SlotMap<MatcenId, Matcen>,
    objects: SlotMap<ObjectId, Object>,
    delta_lights: Vec<DeltaLight>,
    config: EditorConfig,
    texture_requests: Vec<TextureId>,
}

impl Level {
    /// Creates an empty level.
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Creates a level holding one cube of the configured default size at the origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured limits cannot hold a single segment.
    pub fn with_default_segment(config: EditorConfig) -> Result<Self> {
        let size = config.default_segment_size;
        let mut level = Self::new(config);
        level.add_cube(Point3::origin(), size)?;
        Ok(level)
    }

    /// Adds an unconnected axis-aligned cube.
    ///
    /// The front side faces `+z`, the left side `+x` and the top side `+y`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex or segment limit is reached.
    pub fn add_cube(&mut self, center: Point3, size: f64) -> Result<SegmentId> {
        self.check_capacity(8, 1)?;
        let h = size * 0.5;
        let mut ids = Vec::with_capacity(8);
        for [u, v, w] in CORNER_LATTICE {
            let offset = Vector3::new(
                h * (1.0 - 2.0 * f64::from(u)),
                h * (2.0 * f64::from(v) - 1.0),
                h * (1.0 - 2.0 * f64::from(w)),
            );
            ids.push(self.add_vertex(center + offset)?);
        }
        let vertices: [VertexId; 8] = ids
            .try_into()
            .map_err(|_| OperationError::Failed("cube corner count".into()))?;
        self.add_segment(Segment::new(vertices))
    }

    /// Fails unless `vertices` more vertices and `segments` more segments fit.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::CapacityExceeded`] naming the exhausted entity.
    pub fn check_capacity(&self, vertices: usize, segments: usize) -> Result<()> {
        let limits = self.config.limits;
        if self.vertices.len() + vertices > limits.vertices {
            return Err(OperationError::CapacityExceeded {
                entity: "vertices",
                limit: limits.vertices,
            }
            .into());
        }
        if self.segments.len() + segments > limits.segments {
            return Err(OperationError::CapacityExceeded {
                entity: "segments",
                limit: limits.segments,
            }
            .into());
        }
        Ok(())
    }

    // --- Configuration ---

    /// Returns the editor configuration.
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Returns the editor configuration mutably.
    pub fn config_mut(&mut self) -> &mut EditorConfig {
        &mut self.config
    }

    /// Queues a texture for residency once the current command completes.
    pub fn request_texture(&mut self, texture: TextureId) {
        if !self.texture_requests.contains(&texture) {
            self.texture_requests.push(texture);
        }
    }

    /// Drains the queued texture requests.
    pub fn take_texture_requests(&mut self) -> Vec<TextureId> {
        std::mem::take(&mut self.texture_requests)
    }

    // --- Vertex operations ---

    /// Inserts a vertex and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex limit is reached.
    pub fn add_vertex(&mut self, point: Point3) -> Result<VertexId> {
        let limit = self.config.limits.vertices;
        if self.vertices.len() >= limit {
            return Err(OperationError::CapacityExceeded { entity: "vertices", limit }.into());
        }
        Ok(self.vertices.insert(Vertex::new(point)))
    }

    /// Removes a vertex.
    ///
    /// The caller must already have redirected every segment corner that
    /// referenced it.
    pub fn remove_vertex(&mut self, id: VertexId) -> Option<Vertex> {
        debug_assert!(
            !self.segments.values().any(|s| s.uses_vertex(id)),
            "removing a referenced vertex"
        );
        self.vertices.remove(id)
    }

    /// Returns a reference to the vertex, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the level.
    pub fn vertex(&self, id: VertexId) -> Result<&Vertex> {
        Ok(self
            .vertices
            .get(id)
            .ok_or(TopologyError::EntityNotFound("vertex"))?)
    }

    /// Returns a mutable reference to the vertex, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the level.
    pub fn vertex_mut(&mut self, id: VertexId) -> Result<&mut Vertex> {
        Ok(self
            .vertices
            .get_mut(id)
            .ok_or(TopologyError::EntityNotFound("vertex"))?)
    }

    /// Position of a vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the level.
    pub fn point(&self, id: VertexId) -> Result<Point3> {
        Ok(self.vertex(id)?.point)
    }

    /// Returns `true` if the vertex exists.
    #[must_use]
    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.vertices.contains_key(id)
    }

    /// Iterates over all vertices.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> {
        self.vertices.iter()
    }

    /// Number of vertices in the level.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Segments with a corner on `vertex`.
    #[must_use]
    pub fn vertex_users(&self, vertex: VertexId) -> Vec<SegmentId> {
        self.segments
            .iter()
            .filter(|(_, s)| s.uses_vertex(vertex))
            .map(|(id, _)| id)
            .collect()
    }

    // --- Segment operations ---

    /// Inserts a segment and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if a corner vertex does not exist or the segment
    /// limit is reached.
    pub fn add_segment(&mut self, segment: Segment) -> Result<SegmentId> {
        if let Some(missing) = segment.vertices.iter().find(|v| !self.contains_vertex(**v)) {
            return Err(TopologyError::InvalidTopology(format!(
                "segment corner {missing:?} does not exist"
            ))
            .into());
        }
        let limit = self.config.limits.segments;
        if self.segments.len() >= limit {
            return Err(OperationError::CapacityExceeded { entity: "segments", limit }.into());
        }
        Ok(self.segments.insert(segment))
    }

    /// Removes the segment record only; references to it are left in place.
    pub(crate) fn take_segment(&mut self, id: SegmentId) -> Option<Segment> {
        self.segments.remove(id)
    }

    /// Iterates over all segments mutably.
    pub(crate) fn segments_mut(&mut self) -> impl Iterator<Item = (SegmentId, &mut Segment)> {
        self.segments.iter_mut()
    }

    /// Returns a reference to the segment, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the level.
    pub fn segment(&self, id: SegmentId) -> Result<&Segment> {
        Ok(self
            .segments
            .get(id)
            .ok_or(TopologyError::EntityNotFound("segment"))?)
    }

    /// Returns a mutable reference to the segment, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the level.
    pub fn segment_mut(&mut self, id: SegmentId) -> Result<&mut Segment> {
        Ok(self
            .segments
            .get_mut(id)
            .ok_or(TopologyError::EntityNotFound("segment"))?)
    }

    /// Returns `true` if the segment exists.
    #[must_use]
    pub fn contains_segment(&self, id: SegmentId) -> bool {
        self.segments.contains_key(id)
    }

    /// Iterates over all segments.
    pub fn segments(&self) -> impl Iterator<Item = (SegmentId, &Segment)> {
        self.segments.iter()
    }

    /// IDs of all segments in slot order.
    #[must_use]
    pub fn segment_ids(&self) -> Vec<SegmentId> {
        self.segments.keys().collect()
    }

    /// Number of segments in the level.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Corner positions of a segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment or one of its vertices is missing.
    pub fn segment_points(&self, id: SegmentId) -> Result<[Point3; 8]> {
        let segment = self.segment(id)?;
        let mut points = [Point3::origin(); 8];
        for (slot, v) in points.iter_mut().zip(segment.vertices) {
            *slot = self.point(v)?;
        }
        Ok(points)
    }

    /// Geometric view of a segment as a detached hexahedron.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment or one of its vertices is missing.
    pub fn hexahedron(&self, id: SegmentId) -> Result<Hexahedron> {
        Ok(Hexahedron::new(self.segment_points(id)?))
    }

    /// Read-only view of the four corners of a side.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment or one of its vertices is missing.
    pub fn face(&self, tag: Tag) -> Result<Face<'_>> {
        let ids = self.segment(tag.segment)?.side_vertices(tag.side);
        Face::new(&self.vertices, ids)
    }

    /// Write access to the four vertex slots of a side.
    ///
    /// Moving a corner through the view moves it for every side and segment
    /// sharing that vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment or one of its vertices is missing.
    pub fn face_mut(&mut self, tag: Tag) -> Result<FaceMut<'_>> {
        let ids = self.segment(tag.segment)?.side_vertices(tag.side);
        FaceMut::new(&mut self.vertices, ids)
    }

    /// Finds the side of the neighbour across `tag` that connects back.
    ///
    /// Prefers the side with the same vertex set; the pairing is not cached
    /// and must be searched.
    #[must_use]
    pub fn find_paired_side(&self, tag: Tag) -> Option<Tag> {
        let segment = self.segments.get(tag.segment)?;
        let neighbour_id = segment.connection(tag.side)?;
        let neighbour = self.segments.get(neighbour_id)?;
        let key = side_key(segment.side_vertices(tag.side));
        let back: Vec<SideId> = SideId::ALL
            .into_iter()
            .filter(|s| neighbour.connection(*s) == Some(tag.segment))
            .collect();
        back.iter()
            .copied()
            .find(|s| side_key(neighbour.side_vertices(*s)) == key)
            .or_else(|| back.first().copied())
            .map(|s| Tag::new(neighbour_id, s))
    }

    // --- Delta lights ---

    /// Records a switchable light contribution.
    ///
    /// # Errors
    ///
    /// Returns an error if the source or an affected segment does not exist.
    pub fn add_delta_light(&mut self, light: DeltaLight) -> Result<()> {
        self.segment(light.source.segment)?;
        for (tag, _) in &light.affected {
            self.segment(tag.segment)?;
        }
        self.delta_lights.push(light);
        Ok(())
    }

    /// All delta lights.
    #[must_use]
    pub fn delta_lights(&self) -> &[DeltaLight] {
        &self.delta_lights
    }

    /// Drops delta lights sourced on `segment` and affected entries on it.
    pub(crate) fn forget_delta_lights(&mut self, segment: SegmentId) {
        self.delta_lights.retain_mut(|light| light.forget(segment));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_segment_is_an_unconnected_cube() {
        let level = Level::with_default_segment(EditorConfig::default()).unwrap();
        assert_eq!(level.segment_count(), 1);
        assert_eq!(level.vertex_count(), 8);
        let (id, seg) = level.segments().next().unwrap();
        assert!(seg.connections.iter().all(Option::is_none));
        let hex = level.hexahedron(id).unwrap();
        assert_relative_eq!(hex.center(), Point3::origin());
    }

    #[test]
    fn default_cube_sides_face_outward() {
        let level = Level::with_default_segment(EditorConfig::default()).unwrap();
        let id = level.segment_ids()[0];
        let expected = [
            (SideId::Left, Vector3::x()),
            (SideId::Right, -Vector3::x()),
            (SideId::Top, Vector3::y()),
            (SideId::Bottom, -Vector3::y()),
            (SideId::Front, Vector3::z()),
            (SideId::Back, -Vector3::z()),
        ];
        for (side, normal) in expected {
            let face = level.face(Tag::new(id, side)).unwrap();
            assert_relative_eq!(face.average_normal(), normal, epsilon = 1e-12);
            assert_relative_eq!(face.center(), Point3::origin() + normal * 10.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn vertex_limit_is_enforced() {
        let mut config = EditorConfig::default();
        config.limits.vertices = 7;
        assert!(Level::with_default_segment(config).is_err());
    }

    #[test]
    fn stale_segment_id_fails_lookup() {
        let mut level = Level::with_default_segment(EditorConfig::default()).unwrap();
        let id = level.segment_ids()[0];
        level.take_segment(id).unwrap();
        assert!(level.segment(id).is_err());
        let again = level.add_cube(Point3::origin(), 20.0).unwrap();
        assert_ne!(id, again);
        assert!(level.segment(id).is_err());
    }

    #[test]
    fn face_mut_moves_shared_vertices() {
        let mut level = Level::with_default_segment(EditorConfig::default()).unwrap();
        let id = level.segment_ids()[0];
        level
            .face_mut(Tag::new(id, SideId::Front))
            .unwrap()
            .translate(&Vector3::new(0.0, 0.0, 5.0));
        let left = level.face(Tag::new(id, SideId::Left)).unwrap();
        let moved = left.points().iter().filter(|p| (p.z - 15.0).abs() < 1e-12).count();
        assert_eq!(moved, 2);
    }
}
