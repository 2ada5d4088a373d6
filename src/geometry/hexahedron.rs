use std::f64::consts::{FRAC_PI_2, PI};

use crate::config::EditorConfig;
use crate::math::{centroid, Point3, Quad, Ray, TOLERANCE};
use crate::topology::{Axis, SideId};

/// Corner positions of one segment, detached from the level.
///
/// Used to score candidate geometry before committing it, so a rejected
/// candidate never touches shared vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hexahedron {
    points: [Point3; 8],
}

impl Hexahedron {
    /// Creates a hexahedron from corners in segment corner order.
    #[must_use]
    pub fn new(points: [Point3; 8]) -> Self {
        Self { points }
    }

    /// Returns the corners.
    #[must_use]
    pub fn points(&self) -> &[Point3; 8] {
        &self.points
    }

    /// Mean of the eight corners.
    #[must_use]
    pub fn center(&self) -> Point3 {
        centroid(&self.points)
    }

    /// Corners of one side.
    #[must_use]
    pub fn side(&self, side: SideId) -> Quad {
        Quad::new(side.corners().map(|c| self.points[c]))
    }

    /// Copy with the corners of `side` replaced, in side winding order.
    #[must_use]
    pub fn with_side(&self, side: SideId, corners: [Point3; 4]) -> Self {
        let mut points = self.points;
        for (c, p) in side.corners().into_iter().zip(corners) {
            points[c] = p;
        }
        Self { points }
    }

    /// Ray-cast degeneracy check.
    ///
    /// A ray from the center to each side's center must leave through that
    /// side, along its outward normal, without crossing another side first.
    /// Adjacent sides must not fold flat onto each other and no side may be a
    /// bow-tie.
    #[must_use]
    pub fn passes_ray_check(&self, coplanar_threshold: f64, min_flatness: f64) -> bool {
        let center = self.center();
        let quads = SideId::ALL.map(|s| self.side(s));

        for side in SideId::ALL {
            let quad = &quads[side.index()];
            let normal = quad.average_normal();
            if normal.norm() < 0.5 || quad.flatness_ratio() <= min_flatness {
                return false;
            }
            let dir = quad.center() - center;
            if dir.dot(&normal) <= TOLERANCE {
                return false;
            }
            let Ok(ray) = Ray::new(center, dir) else {
                return false;
            };
            let Some(exit) = quad.intersects(&ray) else {
                return false;
            };
            let crossed = SideId::ALL
                .into_iter()
                .filter(|other| *other != side)
                .filter_map(|other| quads[other.index()].intersects(&ray))
                .any(|t| t < exit * (1.0 - 1e-9));
            if crossed {
                return false;
            }
            let folded = side
                .adjacent()
                .any(|adj| quads[adj.index()].average_normal().dot(&normal) >= coplanar_threshold);
            if folded {
                return false;
            }
        }
        true
    }

    /// [`passes_ray_check`](Self::passes_ray_check) with thresholds from `config`.
    #[must_use]
    pub fn is_well_formed(&self, config: &EditorConfig) -> bool {
        self.passes_ray_check(config.coplanar_threshold, config.min_flatness)
    }

    /// Largest deviation from a right angle, in radians, over every corner's
    /// three edge pairs. A collapsed edge scores `PI`.
    #[must_use]
    pub fn worst_corner_angle(&self) -> f64 {
        let mut worst = 0.0_f64;
        for c in 0..8 {
            let edges = Axis::ALL.map(|axis| self.points[axis.flip(c)] - self.points[c]);
            for (i, j) in [(0, 1), (0, 2), (1, 2)] {
                let (a, b) = (&edges[i], &edges[j]);
                let denom = a.norm() * b.norm();
                if denom < TOLERANCE {
                    return PI;
                }
                let angle = (a.dot(b) / denom).clamp(-1.0, 1.0).acos();
                worst = worst.max((angle - FRAC_PI_2).abs());
            }
        }
        worst
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Vector3;
    use crate::topology::CORNER_LATTICE;
    use approx::assert_relative_eq;

    fn cube(size: f64) -> Hexahedron {
        let h = size * 0.5;
        Hexahedron::new(CORNER_LATTICE.map(|[u, v, w]| {
            Point3::new(
                h * (1.0 - 2.0 * f64::from(u)),
                h * (2.0 * f64::from(v) - 1.0),
                h * (1.0 - 2.0 * f64::from(w)),
            )
        }))
    }

    #[test]
    fn cube_is_well_formed_with_square_corners() {
        let hex = cube(20.0);
        assert!(hex.passes_ray_check(0.9, 0.0));
        assert_relative_eq!(hex.worst_corner_angle(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn inside_out_cube_is_rejected() {
        let hex = cube(20.0);
        let p = hex.points();
        let flipped = Hexahedron::new([p[4], p[5], p[6], p[7], p[0], p[1], p[2], p[3]]);
        assert!(!flipped.passes_ray_check(0.9, 0.0));
    }

    #[test]
    fn twisted_side_is_rejected() {
        let hex = cube(20.0);
        let front = hex.side(SideId::Front);
        let pts = front.points();
        let twisted = hex.with_side(SideId::Front, [pts[1], pts[2], pts[3], pts[0]]);
        assert!(twisted.worst_corner_angle() > hex.worst_corner_angle());
    }

    #[test]
    fn collapsed_segment_is_rejected() {
        let hex = cube(20.0);
        let back = hex.side(SideId::Back).points().map(|p| p + Vector3::new(0.0, 0.0, 20.0));
        let flat = hex.with_side(SideId::Back, back);
        assert!(!flat.passes_ray_check(0.9, 0.0));
        assert_relative_eq!(flat.worst_corner_angle(), PI);
    }

    #[test]
    fn sheared_segment_scores_its_shear() {
        let hex = cube(20.0);
        let front = hex.side(SideId::Front).points().map(|p| p + Vector3::new(20.0, 0.0, 0.0));
        let sheared = hex.with_side(SideId::Front, front);
        assert!(sheared.passes_ray_check(0.9, 0.0));
        assert_relative_eq!(sheared.worst_corner_angle(), PI / 4.0, epsilon = 1e-9);
    }
}
