//! Fixtures shared by unit tests.

#![allow(clippy::unwrap_used)]

use crate::config::EditorConfig;
use crate::math::{Point3, Vector3};
use crate::operations::connectivity::Connect;
use crate::operations::query::ValidateLevel;
use crate::topology::{Level, Segment, SegmentId, SideId, Tag, VertexId};

/// Installs a test subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One default 20-unit cube at the origin.
pub fn one_cube() -> (Level, SegmentId) {
    init_tracing();
    let level = Level::with_default_segment(EditorConfig::default()).unwrap();
    let id = level.segment_ids()[0];
    (level, id)
}

/// Adds a cube behind `tag`, sharing its four vertices and connected to it.
pub fn attach_cube(level: &mut Level, tag: Tag) -> SegmentId {
    let source = level.segment(tag.segment).unwrap().clone();
    let axis = tag.side.axis();
    let normal = level.face(tag).unwrap().average_normal();
    let size = (level.face(tag).unwrap().area()).sqrt();
    let mut corners: [Option<VertexId>; 8] = [None; 8];
    for c in tag.side.corners() {
        corners[axis.flip(c)] = Some(source.vertices[c]);
        let far = level.point(source.vertices[c]).unwrap() + normal * size;
        corners[c] = Some(level.add_vertex(far).unwrap());
    }
    let vertices = corners.map(Option::unwrap);
    let id = level.add_segment(Segment::new(vertices)).unwrap();
    Connect::new(tag, Tag::new(id, tag.side.opposite()))
        .execute(level)
        .unwrap();
    id
}

/// Two cubes: `a` at the origin and `b` behind it, `a/back` connected to `b/front`.
pub fn two_cubes() -> (Level, SegmentId, SegmentId) {
    let (mut level, a) = one_cube();
    let b = attach_cube(&mut level, Tag::new(a, SideId::Back));
    (level, a, b)
}

/// A straight corridor of `n` cubes along `-z`, each connected back to front.
pub fn corridor(n: usize) -> (Level, Vec<SegmentId>) {
    let (mut level, first) = one_cube();
    let mut ids = vec![first];
    for _ in 1..n {
        let last = *ids.last().unwrap();
        ids.push(attach_cube(&mut level, Tag::new(last, SideId::Back)));
    }
    (level, ids)
}

/// Panics with the violation list if the level is inconsistent.
pub fn assert_valid(level: &Level) {
    let report = ValidateLevel::new().execute(level);
    assert!(report.is_empty(), "level invariants violated: {report:#?}");
}

/// Unconnected cube translated away from everything else.
pub fn lone_cube(level: &mut Level, center: Point3) -> SegmentId {
    level.add_cube(center, 20.0).unwrap()
}

/// Shorthand for a vector.
pub fn v(x: f64, y: f64, z: f64) -> Vector3 {
    Vector3::new(x, y, z)
}
