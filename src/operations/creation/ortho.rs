use crate::error::{GeometryError, Result};
use crate::math::{Point3, Quad, Vector3, TOLERANCE};

/// Sign pattern of the four corners in the face frame, counter-clockwise.
const SQUARE: [(f64, f64); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

/// Builds a square of edge `size`, centred on `quad`'s center and pushed
/// `size` along its average normal.
///
/// The square's first edge follows the mean direction of the quad's first
/// and third edges, so corner `k` of the result lies over corner `k` of
/// the source.
///
/// # Errors
///
/// Returns an error if the quad has no usable normal.
pub fn ortho_face(quad: &Quad, size: f64) -> Result<[Point3; 4]> {
    let normal = quad.average_normal();
    if normal.norm() < 0.5 {
        return Err(GeometryError::Degenerate("side has no normal".into()).into());
    }
    let p = quad.points();
    let along = (p[1] - p[0]) + (p[2] - p[3]);
    let mut e_u = along - normal * normal.dot(&along);
    if e_u.norm() < TOLERANCE {
        let reference = if normal.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        e_u = normal.cross(&reference);
    }
    let e_u = e_u.normalize();
    let e_v = normal.cross(&e_u);

    let center = quad.center() + normal * size;
    let half = size * 0.5;
    Ok(SQUARE.map(|(su, sv)| center + (e_u * su + e_v * sv) * half))
}
