//! Cardinality statistics consumed by the join enumerator's cost model
//! (§4.F "Cost is a sum of operator costs driven by catalog cardinalities").
//!
//! The catalog already tracks the raw counters (`num_node_rows`,
//! `avg_degree`); this module is the planner-facing read-only snapshot over
//! them, grounded on the teacher's `StatisticsManager` (a `HashMap` of
//! per-relation stats refreshed after bulk loads) but narrowed to exactly
//! what join-order cost estimation needs rather than full histograms/MCVs,
//! since cost-based cardinality estimation beyond simple cardinality-driven
//! join enumeration is an explicit non-goal (spec.md §1).

use crate::catalog::{Catalog, Direction, LabelId};

/// An immutable snapshot of the cardinalities the cost model reads,
/// captured once per statement so a concurrent bulk copy can't shift costs
/// mid-optimization (mirrors the catalog-snapshot isolation §5 describes
/// for DDL vs. query execution).
#[derive(Debug, Clone)]
pub struct StatisticsSnapshot {
    node_rows: Vec<(LabelId, u64)>,
    rel_degrees: Vec<(LabelId, f64, f64)>,
}

impl StatisticsSnapshot {
    pub fn capture(catalog: &Catalog) -> Self {
        let node_rows = catalog.node_tables().map(|t| (t.id(), t.num_rows())).collect();
        let rel_degrees = catalog
            .rel_tables()
            .map(|t| {
                let fwd = catalog.avg_degree(t.label_id(), Direction::Forward);
                let bwd = catalog.avg_degree(t.label_id(), Direction::Backward);
                (t.label_id(), fwd, bwd)
            })
            .collect();
        StatisticsSnapshot { node_rows, rel_degrees }
    }

    pub fn node_row_count(&self, label: LabelId) -> u64 {
        self.node_rows.iter().find(|(l, _)| *l == label).map(|(_, n)| *n).unwrap_or(0)
    }

    pub fn avg_degree(&self, rel_label: LabelId, direction: Direction) -> f64 {
        self.rel_degrees
            .iter()
            .find(|(l, _, _)| *l == rel_label)
            .map(|(_, fwd, bwd)| match direction {
                Direction::Forward => *fwd,
                Direction::Backward => *bwd,
            })
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ConflictAction, Multiplicity};

    #[test]
    fn snapshot_captures_row_counts_and_degrees() {
        let mut cat = Catalog::new();
        let person =
            cat.create_node_table("Person", vec![], "id".into(), ConflictAction::Fail).unwrap();
        cat.set_node_row_count(person, 10_000);
        let knows = cat
            .create_rel_table("Knows", person, person, Multiplicity::ManyToMany, vec![], ConflictAction::Fail)
            .unwrap();
        cat.set_rel_row_count(knows, Direction::Forward, 100_000);
        cat.set_rel_row_count(knows, Direction::Backward, 200_000);

        let snap = StatisticsSnapshot::capture(&cat);
        assert_eq!(snap.node_row_count(person), 10_000);
        assert_eq!(snap.avg_degree(knows, Direction::Forward), 10.0);
        assert_eq!(snap.avg_degree(knows, Direction::Backward), 20.0);
    }
}
