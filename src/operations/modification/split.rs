use tracing::{debug, instrument};

use crate::error::{GeometryError, Result};
use crate::geometry::Hexahedron;
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::operations::connectivity::{remove_walls_on_open_sides, WallPolicy};
use crate::operations::join::JoinTouchingSides;
use crate::topology::{
    Axis, Level, Segment, SegmentId, Side, SideId, Tag, CORNER_LATTICE,
};

use super::detach::DetachSegment;

/// How a segment is divided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitPattern {
    /// Two halves across `axis`.
    Two(Axis),
    /// Three equal slabs across `axis`.
    Three(Axis),
    /// A core running the full length of `axis`, ringed by four segments.
    Five(Axis),
    /// A central core enclosed by six segments, one per side.
    Seven,
    /// Eight octants.
    Eight,
}

impl SplitPattern {
    /// Number of segments the pattern produces.
    #[must_use]
    pub fn count(self) -> usize {
        match self {
            SplitPattern::Two(_) => 2,
            SplitPattern::Three(_) => 3,
            SplitPattern::Five(_) => 5,
            SplitPattern::Seven => 7,
            SplitPattern::Eight => 8,
        }
    }

    /// Corner positions of every child. The first child keeps the split
    /// segment's identity.
    fn children(self, points: &[Point3; 8]) -> Vec<Hexahedron> {
        match self {
            SplitPattern::Two(axis) => slabs(points, axis, &[0.0, 0.5, 1.0]),
            SplitPattern::Three(axis) => slabs(points, axis, &[0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0]),
            SplitPattern::Eight => {
                let mut boxes = Vec::with_capacity(8);
                for [u, v, w] in CORNER_LATTICE {
                    let lo = [u, v, w].map(|i| 0.5 * f64::from(i));
                    boxes.push(lattice_box(points, lo, lo.map(|t| t + 0.5)));
                }
                boxes
            }
            SplitPattern::Five(axis) => {
                let mut lo = [0.25; 3];
                let mut hi = [0.75; 3];
                lo[axis as usize] = 0.0;
                hi[axis as usize] = 1.0;
                let core = lattice_box(points, lo, hi);
                let sides: Vec<SideId> = SideId::ALL.into_iter().filter(|s| s.axis() != axis).collect();
                ring(points, core, &sides)
            }
            SplitPattern::Seven => {
                let core = lattice_box(points, [0.25; 3], [0.75; 3]);
                ring(points, core, &SideId::ALL)
            }
        }
    }
}

/// Trilinear point at lattice parameters `t`.
fn lattice_point(points: &[Point3; 8], t: [f64; 3]) -> Point3 {
    let mut sum = Vector3::zeros();
    for (p, lattice) in points.iter().zip(CORNER_LATTICE) {
        let weight: f64 = (0..3)
            .map(|a| if lattice[a] == 1 { t[a] } else { 1.0 - t[a] })
            .product();
        sum += p.coords * weight;
    }
    Point3::from(sum)
}

/// Sub-hexahedron spanning `lo..hi` in lattice parameters.
fn lattice_box(points: &[Point3; 8], lo: [f64; 3], hi: [f64; 3]) -> Hexahedron {
    Hexahedron::new(CORNER_LATTICE.map(|lattice| {
        let t = [0, 1, 2].map(|a| if lattice[a] == 1 { hi[a] } else { lo[a] });
        lattice_point(points, t)
    }))
}

fn slabs(points: &[Point3; 8], axis: Axis, cuts: &[f64]) -> Vec<Hexahedron> {
    cuts.windows(2)
        .map(|pair| {
            let mut lo = [0.0; 3];
            let mut hi = [1.0; 3];
            lo[axis as usize] = pair[0];
            hi[axis as usize] = pair[1];
            lattice_box(points, lo, hi)
        })
        .collect()
}

/// The core followed by one segment between each of `sides` and the core.
fn ring(points: &[Point3; 8], core: Hexahedron, sides: &[SideId]) -> Vec<Hexahedron> {
    let mut children = vec![core];
    for side in sides {
        let axis = side.axis();
        let mut corners = [Point3::origin(); 8];
        for c in side.corners() {
            corners[c] = points[c];
            corners[axis.flip(c)] = core.points()[c];
        }
        children.push(Hexahedron::new(corners));
    }
    children
}

fn shortest_edge(hex: &Hexahedron) -> f64 {
    let p = hex.points();
    let mut shortest = f64::INFINITY;
    for c in 0..8 {
        for axis in Axis::ALL {
            shortest = shortest.min((p[axis.flip(c)] - p[c]).norm());
        }
    }
    shortest
}

/// Divides a segment into smaller segments filling the same volume.
///
/// The segment is detached first, reshaped into the first child, and the
/// other children are added beside it. A join pass then welds the children
/// together and back onto the former neighbours wherever whole sides still
/// coincide. Walls that end up on open or interior sides are removed.
pub struct SplitSegment {
    segment: SegmentId,
    pattern: SplitPattern,
}

impl SplitSegment {
    /// Creates a new `SplitSegment` operation.
    #[must_use]
    pub fn new(segment: SegmentId, pattern: SplitPattern) -> Self {
        Self { segment, pattern }
    }

    /// Executes the split, returning the children with the original segment first.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if a child would fail the ray
    /// check, or an error if the segment does not exist or the level cannot
    /// hold the children. The level is left untouched on error.
    #[instrument(skip_all, fields(segment = ?self.segment, pattern = ?self.pattern))]
    pub fn execute(&self, level: &mut Level) -> Result<Vec<SegmentId>> {
        let original = level.segment(self.segment)?.clone();
        let points = level.segment_points(self.segment)?;
        let children = self.pattern.children(&points);
        for (i, child) in children.iter().enumerate() {
            if !child.is_well_formed(level.config()) {
                return Err(GeometryError::Degenerate(format!("split child {i} is malformed")).into());
            }
        }
        let added = children.len() - 1;
        level.check_capacity(8 * added + 8, added)?;
        let shortest = children.iter().map(shortest_edge).fold(f64::INFINITY, f64::min);
        let tolerance = level.config().join_tolerance.min(0.25 * shortest);

        let former = DetachSegment::new(self.segment)
            .with_walls(WallPolicy::Keep)
            .execute(level)?;

        let first = children[0];
        let original_hex = Hexahedron::new(points);
        for side in SideId::ALL {
            let kept = first
                .side(side)
                .points()
                .iter()
                .zip(original_hex.side(side).points())
                .all(|(a, b)| (a - b).norm() < TOLERANCE);
            if !kept {
                level.remove_wall_at(Tag::new(self.segment, side));
            }
        }
        let vertices = level.segment(self.segment)?.vertices;
        for (v, p) in vertices.into_iter().zip(first.points()) {
            level.vertex_mut(v)?.point = *p;
        }

        let mut ids = vec![self.segment];
        for child in &children[1..] {
            let mut corners = vertices;
            for (slot, p) in corners.iter_mut().zip(child.points()) {
                *slot = level.add_vertex(*p)?;
            }
            let mut segment = Segment::new(corners);
            for (dst, src) in segment.sides.iter_mut().zip(&original.sides) {
                *dst = Side::surface_of(src);
            }
            ids.push(level.add_segment(segment)?);
        }

        let mut affected = ids.clone();
        affected.extend(former.iter().map(|t| t.segment));
        let joined = JoinTouchingSides::new(affected.clone())
            .with_tolerance(tolerance)
            .execute(level)?;
        let stranded = remove_walls_on_open_sides(level, &affected);
        debug!(children = ids.len(), joined, stranded, "split segment");
        Ok(ids)
    }
}
