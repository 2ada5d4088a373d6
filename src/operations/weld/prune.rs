use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::topology::{Level, VertexId};

/// Removes vertices that no segment references.
///
/// Removal does not renumber surviving vertices, so the order of removal
/// does not matter.
#[derive(Default)]
pub struct PruneVertices {
    among: Option<Vec<VertexId>>,
}

impl PruneVertices {
    /// Creates a new `PruneVertices` operation over the whole level.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts pruning to the given candidates.
    #[must_use]
    pub fn among(mut self, candidates: Vec<VertexId>) -> Self {
        self.among = Some(candidates);
        self
    }

    /// Executes the prune, returning the number of vertices removed.
    #[instrument(skip_all)]
    pub fn execute(&self, level: &mut Level) -> usize {
        let used: HashSet<VertexId> = level
            .segments()
            .flat_map(|(_, s)| s.vertices)
            .collect();
        let candidates: Vec<VertexId> = match &self.among {
            Some(among) => among.clone(),
            None => level.vertices().map(|(id, _)| id).collect(),
        };
        let removed = candidates
            .into_iter()
            .filter(|id| !used.contains(id))
            .filter(|id| level.remove_vertex(*id).is_some())
            .count();
        debug!(removed, "pruned vertices");
        removed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::test_support::one_cube;

    #[test]
    fn removes_only_orphans() {
        let (mut level, _) = one_cube();
        let orphan = level.add_vertex(Point3::new(100.0, 0.0, 0.0)).unwrap();
        assert_eq!(PruneVertices::new().execute(&mut level), 1);
        assert!(!level.contains_vertex(orphan));
        assert_eq!(level.vertex_count(), 8);
    }

    #[test]
    fn every_survivor_is_referenced() {
        let (mut level, _) = one_cube();
        for i in 0..5 {
            level.add_vertex(Point3::new(f64::from(i), 50.0, 0.0)).unwrap();
        }
        PruneVertices::new().execute(&mut level);
        for (id, _) in level.vertices() {
            assert!(!level.vertex_users(id).is_empty());
        }
    }

    #[test]
    fn restricted_prune_leaves_other_orphans() {
        let (mut level, _) = one_cube();
        let a = level.add_vertex(Point3::new(100.0, 0.0, 0.0)).unwrap();
        let b = level.add_vertex(Point3::new(200.0, 0.0, 0.0)).unwrap();
        assert_eq!(PruneVertices::new().among(vec![a]).execute(&mut level), 1);
        assert!(level.contains_vertex(b));
    }
}
