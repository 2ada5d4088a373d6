use crate::error::{GeometryError, Result};

use super::{Point3, Vector3, TOLERANCE};

/// A half-line `origin + t * direction` with `t >= 0` and a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    origin: Point3,
    direction: Vector3,
}

impl Ray {
    /// Creates a ray, normalizing the direction.
    ///
    /// # Errors
    ///
    /// Returns an error if the direction is zero-length.
    pub fn new(origin: Point3, direction: Vector3) -> Result<Self> {
        let len = direction.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(Self {
            origin,
            direction: direction / len,
        })
    }

    /// Returns the ray origin.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the unit direction.
    #[must_use]
    pub fn direction(&self) -> &Vector3 {
        &self.direction
    }

    /// Point at parameter `t` along the ray.
    #[must_use]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }

    /// Double-sided ray/triangle intersection (Möller–Trumbore).
    ///
    /// Returns the distance along the ray, or `None` when the ray misses or
    /// runs parallel to the triangle.
    #[must_use]
    pub fn intersect_triangle(&self, a: &Point3, b: &Point3, c: &Point3) -> Option<f64> {
        let e1 = b - a;
        let e2 = c - a;
        let h = self.direction.cross(&e2);
        let det = e1.dot(&h);
        if det.abs() < TOLERANCE {
            return None;
        }
        let inv = 1.0 / det;
        let s = self.origin - a;
        let u = inv * s.dot(&h);
        if !(-TOLERANCE..=1.0 + TOLERANCE).contains(&u) {
            return None;
        }
        let q = s.cross(&e1);
        let v = inv * self.direction.dot(&q);
        if v < -TOLERANCE || u + v > 1.0 + TOLERANCE {
            return None;
        }
        let t = inv * e2.dot(&q);
        (t >= 0.0).then_some(t)
    }
}

/// Distance from a point to the closed segment `a..b`.
#[must_use]
pub fn point_segment_distance(point: &Point3, a: &Point3, b: &Point3) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < TOLERANCE {
        return (point - a).norm();
    }
    let t = ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (point - (a + ab * t)).norm()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn hits_triangle_in_front() {
        let ray = Ray::new(p(0.2, 0.2, -5.0), Vector3::z()).unwrap();
        let t = ray
            .intersect_triangle(&p(0.0, 0.0, 0.0), &p(1.0, 0.0, 0.0), &p(0.0, 1.0, 0.0))
            .unwrap();
        assert_relative_eq!(t, 5.0);
    }

    #[test]
    fn ignores_triangle_behind_origin() {
        let ray = Ray::new(p(0.2, 0.2, 5.0), Vector3::z()).unwrap();
        let hit = ray.intersect_triangle(&p(0.0, 0.0, 0.0), &p(1.0, 0.0, 0.0), &p(0.0, 1.0, 0.0));
        assert!(hit.is_none());
    }

    #[test]
    fn misses_outside_triangle() {
        let ray = Ray::new(p(2.0, 2.0, -1.0), Vector3::z()).unwrap();
        let hit = ray.intersect_triangle(&p(0.0, 0.0, 0.0), &p(1.0, 0.0, 0.0), &p(0.0, 1.0, 0.0));
        assert!(hit.is_none());
    }

    #[test]
    fn zero_direction_is_rejected() {
        assert!(Ray::new(p(0.0, 0.0, 0.0), Vector3::zeros()).is_err());
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let d = point_segment_distance(&p(3.0, 1.0, 0.0), &p(0.0, 0.0, 0.0), &p(2.0, 0.0, 0.0));
        assert_relative_eq!(d, 2.0_f64.sqrt());
        let d = point_segment_distance(&p(1.0, 1.0, 0.0), &p(0.0, 0.0, 0.0), &p(2.0, 0.0, 0.0));
        assert_relative_eq!(d, 1.0);
    }
}
