use tracing::{debug, instrument};

use crate::error::Result;
use crate::math::{Matrix3, Plane, Point3, Vector3, TOLERANCE};
use crate::topology::{Axis, SideId, CORNER_LATTICE, SIDE_CORNERS};

use super::payload::{ClipTag, Clipboard};

/// Where one side of a reflected segment takes its surface data from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideMapping {
    /// Side of the unreflected segment.
    pub source: SideId,
    /// `corners[k]` is the corner of `source` whose UV and light move to corner `k`.
    pub corners: [usize; 4],
}

/// Side and per-corner permutation for a segment reflected by flipping `axis`.
///
/// Reflecting a segment reverses its handedness; flipping one lattice axis of
/// the corner order restores it. Each side then sits where the flipped table
/// puts it and every UV stays on the same physical vertex.
#[must_use]
pub fn reflection_permutation(axis: Axis) -> [SideMapping; 6] {
    SideId::ALL.map(|side| {
        let source = if side.axis() == axis { side.opposite() } else { side };
        let from = SIDE_CORNERS[source.index()];
        let corners = side.corners().map(|c| {
            let flipped = axis.flip(c);
            from.iter().position(|f| *f == flipped).unwrap_or(0)
        });
        SideMapping { source, corners }
    })
}

/// Lattice axis of a segment most closely aligned with `normal`.
fn reflection_axis(points: &[Point3; 8], normal: &Vector3) -> Axis {
    let mut best = (Axis::U, -1.0);
    for axis in Axis::ALL {
        let a = axis as usize;
        let dir: Vector3 = (0..8)
            .filter(|c| CORNER_LATTICE[*c][a] == 0)
            .map(|c| points[axis.flip(c)] - points[c])
            .sum();
        let len = dir.norm();
        let score = if len < TOLERANCE { 0.0 } else { (dir.dot(normal) / len).abs() };
        if score > best.1 {
            best = (axis, score);
        }
    }
    best.0
}

/// Reflects a clipboard payload across a plane.
///
/// Vertices and objects are mirrored, and every segment's corner order is
/// flipped along the axis facing the plane so sides keep pointing outward.
pub struct MirrorClipboard {
    plane_origin: Point3,
    plane_normal: Vector3,
}

impl MirrorClipboard {
    /// Creates a new `MirrorClipboard` operation.
    #[must_use]
    pub fn new(plane_origin: Point3, plane_normal: Vector3) -> Self {
        Self {
            plane_origin,
            plane_normal,
        }
    }

    /// Executes the mirror in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the plane normal is zero-length.
    #[instrument(skip_all, fields(segments = clipboard.segments.len()))]
    pub fn execute(&self, clipboard: &mut Clipboard) -> Result<()> {
        let plane = Plane::from_normal(self.plane_origin, self.plane_normal)?;
        let normal = *plane.plane_normal();

        let axes: Vec<Axis> = clipboard
            .segments
            .iter()
            .map(|s| reflection_axis(&s.vertices.map(|v| clipboard.vertices[v]), &normal))
            .collect();
        let tables = Axis::ALL.map(reflection_permutation);

        for p in &mut clipboard.vertices {
            *p = plane.reflect_point(p);
        }
        for (segment, axis) in clipboard.segments.iter_mut().zip(&axes) {
            let table = &tables[*axis as usize];
            let old = segment.clone();
            segment.vertices = std::array::from_fn(|c| old.vertices[axis.flip(c)]);
            for (side, mapping) in SideId::ALL.into_iter().zip(table) {
                let from = &old.sides[mapping.source.index()];
                let to = &mut segment.sides[side.index()];
                *to = from.clone();
                to.uvs = mapping.corners.map(|j| from.uvs[j]);
                to.lights = mapping.corners.map(|j| from.lights[j]);
                segment.connections[side.index()] = old.connections[mapping.source.index()];
            }
        }

        let remap = |tag: &mut ClipTag| {
            tag.side = tables[axes[tag.segment] as usize][tag.side.index()].source;
        };
        for wall in &mut clipboard.walls {
            remap(&mut wall.tag);
        }
        for target in clipboard.triggers.iter_mut().flat_map(|t| &mut t.targets) {
            remap(target);
        }

        let householder = plane.reflection_matrix();
        let handedness = Matrix3::from_diagonal(&Vector3::new(-1.0, 1.0, 1.0));
        for object in &mut clipboard.objects {
            object.position = plane.reflect_point(&object.position);
            object.orientation = householder * object.orientation * handedness;
        }
        debug!("mirrored clipboard");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::config::EditorConfig;
    use crate::math::Point2;
    use crate::operations::clipboard::{CopySegments, PasteSegments};
    use crate::operations::creation::{InsertMode, InsertSegment};
    use crate::test_support::{assert_valid, corridor, one_cube, v};
    use crate::topology::{Level, Object, ObjectKind, Tag};
    use approx::assert_relative_eq;

    #[test]
    fn every_table_is_a_side_and_corner_bijection() {
        for axis in Axis::ALL {
            let table = reflection_permutation(axis);
            let sources: HashSet<SideId> = table.iter().map(|m| m.source).collect();
            assert_eq!(sources.len(), 6, "{axis:?}");
            for mapping in &table {
                let corners: HashSet<usize> = mapping.corners.iter().copied().collect();
                assert_eq!(corners.len(), 4, "{axis:?} {mapping:?}");
            }
        }
    }

    #[test]
    fn every_table_keeps_uvs_on_their_vertex() {
        for axis in Axis::ALL {
            for (side, mapping) in SideId::ALL.into_iter().zip(reflection_permutation(axis)) {
                for k in 0..4 {
                    let new_corner = side.corners()[k];
                    let old_corner = mapping.source.corners()[mapping.corners[k]];
                    assert_eq!(axis.flip(new_corner), old_corner, "{axis:?} {side} {k}");
                }
            }
        }
    }

    #[test]
    fn every_table_is_an_involution() {
        for axis in Axis::ALL {
            let table = reflection_permutation(axis);
            for side in SideId::ALL {
                let once = table[side.index()];
                let twice = table[once.source.index()];
                assert_eq!(twice.source, side);
                for k in 0..4 {
                    assert_eq!(twice.corners[once.corners[k]], k, "{axis:?} {side} {k}");
                }
            }
        }
    }

    fn labelled(level: &mut Level) {
        let ids = level.segment_ids();
        for (n, id) in ids.into_iter().enumerate() {
            let segment = level.segment_mut(id).unwrap();
            for (s, side) in segment.sides.iter_mut().enumerate() {
                for (k, uv) in side.uvs.iter_mut().enumerate() {
                    #[allow(clippy::cast_precision_loss)]
                    let label = (n * 100 + s * 10 + k) as f64;
                    *uv = Point2::new(label, -label);
                }
            }
        }
    }

    /// Pastes a mirrored copy and checks that every pasted side carries the
    /// same UV on the reflected image of each vertex as the source side did.
    fn check_mirror(level: &Level, normal: Vector3) {
        let origin = Point3::new(3.0, -2.0, 40.0);
        let ids = level.segment_ids();
        let mut clipboard = CopySegments::new(ids.clone()).execute(level).unwrap();
        MirrorClipboard::new(origin, normal).execute(&mut clipboard).unwrap();
        let plane = Plane::from_normal(origin, normal).unwrap();

        let mut target = Level::new(EditorConfig::default());
        let report = PasteSegments::new(&clipboard).execute(&mut target).unwrap();
        assert_valid(&target);

        for (old, new) in ids.iter().zip(&report.segments) {
            assert!(target.hexahedron(*new).unwrap().is_well_formed(target.config()));
            let old_seg = level.segment(*old).unwrap();
            let new_seg = target.segment(*new).unwrap();
            for side in SideId::ALL {
                let new_points = target.face(Tag::new(*new, side)).unwrap().points();
                for (k, p) in new_points.iter().enumerate() {
                    let uv = new_seg.side(side).uvs[k];
                    let found = SideId::ALL.into_iter().any(|old_side| {
                        let old_points = level.face(Tag::new(*old, old_side)).unwrap().points();
                        old_points.iter().enumerate().any(|(j, q)| {
                            (plane.reflect_point(q) - p).norm() < 1e-9 && old_seg.side(old_side).uvs[j] == uv
                        })
                    });
                    assert!(found, "{normal:?} {side} corner {k} lost its uv");
                }
            }
        }
    }

    #[test]
    fn mirrors_a_cube_across_each_axis_plane() {
        let (mut level, _) = one_cube();
        labelled(&mut level);
        for normal in [Vector3::x(), Vector3::y(), Vector3::z(), v(1.0, 1.0, 0.3)] {
            check_mirror(&level, normal);
        }
    }

    #[test]
    fn mirrors_a_bent_corridor() {
        let (mut level, ids) = corridor(2);
        InsertSegment::new(Tag::new(ids[1], SideId::Left), InsertMode::Extrude(v(20.0, 0.0, 0.0)))
            .execute(&mut level)
            .unwrap();
        InsertSegment::new(Tag::new(ids[0], SideId::Top), InsertMode::Extrude(v(0.0, 20.0, 5.0)))
            .execute(&mut level)
            .unwrap();
        labelled(&mut level);
        for normal in [Vector3::x(), Vector3::y(), Vector3::z(), v(-0.2, 1.0, 1.0)] {
            check_mirror(&level, normal);
        }
    }

    #[test]
    fn mirroring_twice_restores_the_payload() {
        let (mut level, ids) = corridor(2);
        labelled(&mut level);
        let original = CopySegments::new(ids).execute(&level).unwrap();
        let mut clipboard = original.clone();
        let mirror = MirrorClipboard::new(Point3::origin(), Vector3::x());
        mirror.execute(&mut clipboard).unwrap();
        assert_ne!(clipboard, original);
        mirror.execute(&mut clipboard).unwrap();
        assert_eq!(clipboard, original);
    }

    #[test]
    fn mirrored_objects_keep_a_proper_orientation() {
        let (mut level, a) = one_cube();
        level
            .add_object(Object::new(ObjectKind::Player, a, Point3::new(2.0, 0.0, 0.0)))
            .unwrap();
        let mut clipboard = CopySegments::new(vec![a]).execute(&level).unwrap();
        MirrorClipboard::new(Point3::new(10.0, 0.0, 0.0), Vector3::x())
            .execute(&mut clipboard)
            .unwrap();
        let object = &clipboard.objects[0];
        assert_relative_eq!(object.position, Point3::new(18.0, 0.0, 0.0));
        assert_relative_eq!(object.orientation.determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_normal_is_rejected() {
        let (level, a) = one_cube();
        let mut clipboard = CopySegments::new(vec![a]).execute(&level).unwrap();
        assert!(MirrorClipboard::new(Point3::origin(), Vector3::zeros())
            .execute(&mut clipboard)
            .is_err());
    }
}
