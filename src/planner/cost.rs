//! Cost model feeding the bottom-up enumerator (§4.F): "cost is a sum of
//! operator costs driven by catalog cardinalities" rather than a full
//! histogram-based estimator (cost-based cardinality estimation beyond this
//! is an explicit non-goal, spec.md §1).

use crate::catalog::{Direction, LabelId};
use crate::statistics::StatisticsSnapshot;

/// A `SCAN_NODE_ID`'s cost and output cardinality are both the table's row
/// count; scanning is assumed to cost one unit of work per row produced.
pub fn scan_node_cost(stats: &StatisticsSnapshot, label: LabelId) -> f64 {
    (stats.node_row_count(label).max(1)) as f64
}

/// `EXTEND` cost is proportional to the number of rels it traverses: the
/// bound side's cardinality times the average out-degree in that direction.
/// Falls back to a degree of 1.0 when the catalog has no stats yet (a fresh,
/// unpopulated table still needs a finite cost to compare plans against).
pub fn extend_output_cardinality(
    stats: &StatisticsSnapshot,
    rel_label: LabelId,
    direction: Direction,
    input_cardinality: f64,
) -> f64 {
    let degree = stats.avg_degree(rel_label, direction);
    let degree = if degree > 0.0 { degree } else { 1.0 };
    input_cardinality * degree
}

/// `HASH_JOIN` cost is proportional to the build side's cardinality (the
/// cost of populating the hash table) plus the probe side driving the
/// output row count.
pub fn hash_join_output_cardinality(build_cardinality: f64, probe_cardinality: f64) -> f64 {
    probe_cardinality.min(build_cardinality.max(probe_cardinality))
}
