use slotmap::SlotMap;

use crate::error::{Result, TopologyError};
use crate::math::{Point3, Quad, Ray, Vector3};
use crate::topology::{Vertex, VertexId};

fn check_ids(vertices: &SlotMap<VertexId, Vertex>, ids: &[VertexId; 4]) -> Result<()> {
    if ids.iter().all(|id| vertices.contains_key(*id)) {
        Ok(())
    } else {
        Err(TopologyError::EntityNotFound("vertex").into())
    }
}

/// Read-only view of the four shared vertices of one segment side.
///
/// The view borrows the level's vertex storage; it never copies positions
/// until a query asks for them.
#[derive(Debug, Clone, Copy)]
pub struct Face<'a> {
    vertices: &'a SlotMap<VertexId, Vertex>,
    ids: [VertexId; 4],
}

impl<'a> Face<'a> {
    /// Creates a view over `ids` in side winding order.
    ///
    /// # Errors
    ///
    /// Returns an error if any vertex is missing.
    pub fn new(vertices: &'a SlotMap<VertexId, Vertex>, ids: [VertexId; 4]) -> Result<Self> {
        check_ids(vertices, &ids)?;
        Ok(Self { vertices, ids })
    }

    /// Vertex ids in winding order.
    #[must_use]
    pub fn ids(&self) -> [VertexId; 4] {
        self.ids
    }

    /// Current corner positions.
    #[must_use]
    pub fn points(&self) -> [Point3; 4] {
        self.ids
            .map(|id| self.vertices.get(id).map_or_else(Point3::origin, |v| v.point))
    }

    /// Snapshot of the corners as a value.
    #[must_use]
    pub fn quad(&self) -> Quad {
        Quad::new(self.points())
    }

    /// Mean of the four corners.
    #[must_use]
    pub fn center(&self) -> Point3 {
        self.quad().center()
    }

    /// Outward unit normal averaged over the side.
    #[must_use]
    pub fn average_normal(&self) -> Vector3 {
        self.quad().average_normal()
    }

    /// Area of the side.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.quad().area()
    }

    /// Triangle-area ratio; see [`Quad::flatness_ratio`].
    #[must_use]
    pub fn flatness_ratio(&self) -> f64 {
        self.quad().flatness_ratio()
    }

    /// Distance along `ray` to the side, if hit.
    #[must_use]
    pub fn intersects(&self, ray: &Ray) -> Option<f64> {
        self.quad().intersects(ray)
    }

    /// Index of the edge nearest to `point`.
    #[must_use]
    pub fn closest_edge(&self, point: &Point3) -> usize {
        self.quad().closest_edge(point)
    }

    /// Index of the corner nearest to `point`.
    #[must_use]
    pub fn closest_point(&self, point: &Point3) -> usize {
        self.quad().closest_point(point)
    }
}

/// Write access to four of the level's shared vertex slots.
///
/// Writes land directly in the level: every other side or segment
/// referencing the same vertex sees the move.
#[derive(Debug)]
pub struct FaceMut<'a> {
    vertices: &'a mut SlotMap<VertexId, Vertex>,
    ids: [VertexId; 4],
}

impl<'a> FaceMut<'a> {
    /// Creates a writable view over `ids` in side winding order.
    ///
    /// # Errors
    ///
    /// Returns an error if any vertex is missing.
    pub fn new(vertices: &'a mut SlotMap<VertexId, Vertex>, ids: [VertexId; 4]) -> Result<Self> {
        check_ids(vertices, &ids)?;
        Ok(Self { vertices, ids })
    }

    /// Reborrows as a read-only view.
    #[must_use]
    pub fn as_face(&self) -> Face<'_> {
        Face {
            vertices: self.vertices,
            ids: self.ids,
        }
    }

    /// Current corner positions.
    #[must_use]
    pub fn points(&self) -> [Point3; 4] {
        self.as_face().points()
    }

    /// Moves corner `k` (wrapping) to `point`.
    pub fn set_point(&mut self, k: usize, point: Point3) {
        if let Some(v) = self.vertices.get_mut(self.ids[k % 4]) {
            v.point = point;
        }
    }

    /// Moves all four corners.
    pub fn set_points(&mut self, points: [Point3; 4]) {
        for (k, p) in points.into_iter().enumerate() {
            self.set_point(k, p);
        }
    }

    /// Moves all four corners by `offset`. A vertex repeated in the side moves once.
    pub fn translate(&mut self, offset: &Vector3) {
        let mut seen: Vec<VertexId> = Vec::with_capacity(4);
        for id in self.ids {
            if seen.contains(&id) {
                continue;
            }
            seen.push(id);
            if let Some(v) = self.vertices.get_mut(id) {
                v.point += offset;
            }
        }
    }
}
