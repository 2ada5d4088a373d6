use super::ray::point_segment_distance;
use super::{centroid, Point3, Ray, Vector3, TOLERANCE};

/// Four corner positions of a segment side, in side winding order.
///
/// The winding is counter-clockwise when viewed from outside the segment, so
/// [`average_normal`](Self::average_normal) points out of the owning segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    points: [Point3; 4],
}

impl Quad {
    /// Creates a quad from corners in winding order.
    #[must_use]
    pub fn new(points: [Point3; 4]) -> Self {
        Self { points }
    }

    /// Returns the corners.
    #[must_use]
    pub fn points(&self) -> &[Point3; 4] {
        &self.points
    }

    /// Returns corner `k` (wrapping).
    #[must_use]
    pub fn corner(&self, k: usize) -> Point3 {
        self.points[k % 4]
    }

    /// Mean of the four corners.
    #[must_use]
    pub fn center(&self) -> Point3 {
        centroid(&self.points)
    }

    /// Unnormalized normal from the diagonal cross product; its length is twice the area.
    fn diagonal_cross(&self) -> Vector3 {
        let [p0, p1, p2, p3] = &self.points;
        (p2 - p0).cross(&(p3 - p1))
    }

    /// Unit normal averaged over the quad, or zero for a collapsed quad.
    #[must_use]
    pub fn average_normal(&self) -> Vector3 {
        let n = self.diagonal_cross();
        let len = n.norm();
        if len < TOLERANCE {
            Vector3::zeros()
        } else {
            n / len
        }
    }

    /// Area of the quad projected onto its average normal.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.diagonal_cross().norm() * 0.5
    }

    /// Smaller-over-larger ratio of the two triangle areas, worst of both diagonals.
    ///
    /// `1.0` for a parallelogram, near `0.0` for a quad collapsing to a
    /// triangle, and negative for a concave or bow-tie quad.
    #[must_use]
    pub fn flatness_ratio(&self) -> f64 {
        let n = self.average_normal();
        if n == Vector3::zeros() {
            return 0.0;
        }
        let tri = |a: usize, b: usize, c: usize| {
            let [pa, pb, pc] = [self.points[a], self.points[b], self.points[c]];
            0.5 * (pb - pa).cross(&(pc - pa)).dot(&n)
        };
        let ratio = |x: f64, y: f64| {
            let hi = x.max(y);
            if hi < TOLERANCE {
                0.0
            } else {
                x.min(y) / hi
            }
        };
        ratio(tri(0, 1, 2), tri(0, 2, 3)).min(ratio(tri(1, 2, 3), tri(1, 3, 0)))
    }

    /// Distance along `ray` to the quad, if hit.
    #[must_use]
    pub fn intersects(&self, ray: &Ray) -> Option<f64> {
        let [p0, p1, p2, p3] = &self.points;
        let first = ray.intersect_triangle(p0, p1, p2);
        let second = ray.intersect_triangle(p0, p2, p3);
        match (first, second) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Index `k` of the edge `k -> k+1` nearest to `point`.
    #[must_use]
    pub fn closest_edge(&self, point: &Point3) -> usize {
        (0..4)
            .map(|k| {
                let d = point_segment_distance(point, &self.points[k], &self.points[(k + 1) % 4]);
                (k, d)
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map_or(0, |(k, _)| k)
    }

    /// Index of the corner nearest to `point`.
    #[must_use]
    pub fn closest_point(&self, point: &Point3) -> usize {
        (0..4)
            .map(|k| (k, (self.points[k] - point).norm_squared()))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map_or(0, |(k, _)| k)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn square() -> Quad {
        Quad::new([p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0), p(2.0, 2.0, 0.0), p(0.0, 2.0, 0.0)])
    }

    #[test]
    fn square_properties() {
        let q = square();
        assert_relative_eq!(q.center(), p(1.0, 1.0, 0.0));
        assert_relative_eq!(q.average_normal(), Vector3::z());
        assert_relative_eq!(q.area(), 4.0);
        assert_relative_eq!(q.flatness_ratio(), 1.0);
    }

    #[test]
    fn bow_tie_has_negative_flatness() {
        let q = Quad::new([p(0.0, 0.0, 0.0), p(2.0, 2.0, 0.0), p(2.0, 0.0, 0.0), p(0.0, 2.0, 0.0)]);
        assert!(q.flatness_ratio() <= 0.0);
    }

    #[test]
    fn dart_has_negative_flatness() {
        let q = Quad::new([p(0.0, 0.0, 0.0), p(4.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(0.0, 4.0, 0.0)]);
        assert!(q.flatness_ratio() < 0.0);
    }

    #[test]
    fn ray_hits_either_triangle() {
        let q = square();
        let a = Ray::new(p(1.5, 0.5, 3.0), -Vector3::z()).unwrap();
        let b = Ray::new(p(0.5, 1.5, 3.0), -Vector3::z()).unwrap();
        let miss = Ray::new(p(3.0, 3.0, 3.0), -Vector3::z()).unwrap();
        assert_relative_eq!(q.intersects(&a).unwrap(), 3.0);
        assert_relative_eq!(q.intersects(&b).unwrap(), 3.0);
        assert!(q.intersects(&miss).is_none());
    }

    #[test]
    fn closest_edge_and_point() {
        let q = square();
        assert_eq!(q.closest_edge(&p(1.0, -0.5, 0.0)), 0);
        assert_eq!(q.closest_edge(&p(2.5, 1.0, 0.0)), 1);
        assert_eq!(q.closest_edge(&p(-0.1, 1.2, 0.0)), 3);
        assert_eq!(q.closest_point(&p(1.9, 2.2, 0.0)), 2);
    }
}
