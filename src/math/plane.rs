use crate::error::{GeometryError, Result};

use super::{Matrix3, Point3, Vector3, TOLERANCE};

/// An infinite plane in 3D space, stored as an origin and a unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    origin: Point3,
    normal: Vector3,
}

impl Plane {
    /// Creates a plane from an origin and a normal vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal vector is zero-length.
    pub fn from_normal(origin: Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(Self {
            origin,
            normal: normal / len,
        })
    }

    /// Returns the origin point of the plane.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the unit normal of the plane.
    #[must_use]
    pub fn plane_normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Signed distance from a point to the plane.
    /// Positive = on the normal side, negative = opposite.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        self.normal.dot(&(point - self.origin))
    }

    /// Orthogonal projection of a point onto the plane.
    #[must_use]
    pub fn project(&self, point: &Point3) -> Point3 {
        point - self.normal * self.signed_distance(point)
    }

    /// Mirror image of a point across the plane.
    #[must_use]
    pub fn reflect_point(&self, point: &Point3) -> Point3 {
        point - self.normal * (2.0 * self.signed_distance(point))
    }

    /// Mirror image of a direction across the plane.
    #[must_use]
    pub fn reflect_vector(&self, v: &Vector3) -> Vector3 {
        v - self.normal * (2.0 * self.normal.dot(v))
    }

    /// Householder matrix of the reflection (determinant -1).
    #[must_use]
    pub fn reflection_matrix(&self) -> Matrix3 {
        Matrix3::identity() - self.normal * self.normal.transpose() * 2.0
    }
}
