use std::collections::HashSet;

use crate::topology::{side_key, Level, SegmentKind, SideId, Tag, VertexId};

/// Checks the cross-references of a level.
///
/// Returns one human-readable line per violation; an empty report means the
/// level is consistent. Covers connection symmetry, shared vertices on
/// connected sides, key resolution for every stored reference, walls on
/// connected sides only, and matcen bookkeeping.
#[derive(Default)]
pub struct ValidateLevel {
    orphans: bool,
}

impl ValidateLevel {
    /// Creates a new `ValidateLevel` query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also reports vertices no segment uses.
    #[must_use]
    pub fn with_orphan_check(mut self) -> Self {
        self.orphans = true;
        self
    }

    /// Executes the query.
    #[must_use]
    pub fn execute(&self, level: &Level) -> Vec<String> {
        let mut report = Vec::new();
        check_segments(level, &mut report);
        check_walls(level, &mut report);
        check_references(level, &mut report);
        if self.orphans {
            let used: HashSet<VertexId> = level.segments().flat_map(|(_, s)| s.vertices).collect();
            for (id, _) in level.vertices().filter(|(id, _)| !used.contains(id)) {
                report.push(format!("vertex {id:?} is unused"));
            }
        }
        report
    }
}

fn check_segments(level: &Level, report: &mut Vec<String>) {
    for (id, segment) in level.segments() {
        for v in segment.vertices {
            if !level.contains_vertex(v) {
                report.push(format!("segment {id:?} uses missing vertex {v:?}"));
            }
        }
        for side in SideId::ALL {
            let tag = Tag::new(id, side);
            if let Some(wall) = segment.side(side).wall {
                match level.wall(wall) {
                    Ok(w) if w.tag == tag => {}
                    Ok(w) => report.push(format!("side {tag} holds wall {wall:?} placed on {}", w.tag)),
                    Err(_) => report.push(format!("side {tag} holds missing wall {wall:?}")),
                }
            }
            let Some(neighbour) = segment.connection(side) else {
                continue;
            };
            if neighbour == id {
                report.push(format!("side {tag} connects to its own segment"));
                continue;
            }
            let Ok(other) = level.segment(neighbour) else {
                report.push(format!("side {tag} connects to missing segment {neighbour:?}"));
                continue;
            };
            let key = side_key(segment.side_vertices(side));
            let back: Vec<SideId> = SideId::ALL
                .into_iter()
                .filter(|s| other.connection(*s) == Some(id))
                .collect();
            if back.is_empty() {
                report.push(format!("side {tag} connects to {neighbour:?}, which does not connect back"));
            } else if !back.iter().any(|s| side_key(other.side_vertices(*s)) == key) {
                report.push(format!("side {tag} shares no vertex set with {neighbour:?}"));
            }
        }
        match (segment.kind, segment.matcen) {
            (SegmentKind::Matcen, Some(m)) => match level.matcen(m) {
                Ok(matcen) if matcen.segment == id => {}
                _ => report.push(format!("segment {id:?} points at a matcen that does not point back")),
            },
            (SegmentKind::Matcen, None) => report.push(format!("matcen segment {id:?} has no matcen")),
            (_, Some(_)) => report.push(format!("segment {id:?} has a matcen but is not a matcen")),
            _ => {}
        }
    }
}

fn check_walls(level: &Level, report: &mut Vec<String>) {
    for (id, wall) in level.walls() {
        match level.segment(wall.tag.segment) {
            Err(_) => report.push(format!("wall {id:?} sits on missing segment")),
            Ok(segment) => {
                if segment.side(wall.tag.side).wall != Some(id) {
                    report.push(format!("wall {id:?} is not recorded on {}", wall.tag));
                }
                if segment.connection(wall.tag.side).is_none() {
                    report.push(format!("wall {id:?} sits on open side {}", wall.tag));
                }
            }
        }
        if let Some(trigger) = wall.trigger {
            if level.trigger(trigger).is_err() {
                report.push(format!("wall {id:?} owns missing trigger {trigger:?}"));
            }
        }
    }
}

fn check_references(level: &Level, report: &mut Vec<String>) {
    for (id, trigger) in level.triggers() {
        for target in &trigger.targets {
            if !level.contains_segment(target.segment) {
                report.push(format!("trigger {id:?} targets missing segment {:?}", target.segment));
            }
        }
    }
    for (id, matcen) in level.matcens() {
        match level.segment(matcen.segment) {
            Ok(segment) if segment.matcen == Some(id) => {}
            Ok(_) => report.push(format!("matcen {id:?} is not recorded on its segment")),
            Err(_) => report.push(format!("matcen {id:?} sits in missing segment")),
        }
    }
    for (id, object) in level.objects() {
        if !level.contains_segment(object.segment) {
            report.push(format!("object {id:?} sits in missing segment"));
        }
    }
    for light in level.delta_lights() {
        let tags = std::iter::once(&light.source).chain(light.affected.iter().map(|(t, _)| t));
        for tag in tags {
            if !level.contains_segment(tag.segment) {
                report.push(format!("delta light references missing segment {:?}", tag.segment));
            }
        }
    }
}
