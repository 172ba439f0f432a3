//! Bottom-up subgraph-table join enumeration, grounded precisely on
//! `enumerator.cpp`: seed one `SCAN_NODE_ID` per query node, extend one rel
//! at a time, and from four enumerated rels onward also try combining two
//! already-enumerated subgraphs with a hash join. Filters are pushed down to
//! the first subgraph whose variables cover all of their dependencies.

use std::collections::HashMap;

use crate::binder::expression::BoundExpression;
use crate::binder::query_graph::{NodeIdx, QueryGraph, RelIdx, SubqueryGraph};
use crate::catalog::Direction;
use crate::error::{Error, Result};
use crate::planner::{LogicalOperator, Schema};
use crate::statistics::StatisticsSnapshot;

#[derive(Debug, Clone)]
struct PlanCandidate {
    op: LogicalOperator,
    schema: Schema,
    cardinality: f64,
    cost: f64,
}

fn better(a: &PlanCandidate, b: &PlanCandidate) -> bool {
    const EPS: f64 = 1e-9;
    if a.cost + EPS < b.cost {
        return true;
    }
    if b.cost + EPS < a.cost {
        return false;
    }
    // Equal cost: prefer the smaller estimated cardinality, then fall back
    // to whichever plan's shape sorts first so the choice is deterministic
    // (the exact tie-break is not load-bearing beyond determinism).
    if a.cardinality != b.cardinality {
        return a.cardinality < b.cardinality;
    }
    a.op.shape() < b.op.shape()
}

/// One level of the DP table: every connected subgraph of a given rel count
/// reached so far, mapped to its single best plan.
type Level = HashMap<SubqueryGraph, PlanCandidate>;

struct Enumerator<'a> {
    graph: &'a QueryGraph,
    stats: &'a StatisticsSnapshot,
    conjuncts: &'a [BoundExpression],
    levels: Vec<Level>,
}

impl<'a> Enumerator<'a> {
    fn add(&mut self, k: usize, subgraph: SubqueryGraph, candidate: PlanCandidate) {
        match self.levels[k].get(&subgraph) {
            Some(existing) if !better(&candidate, existing) => {}
            _ => {
                self.levels[k].insert(subgraph, candidate);
            }
        }
    }

    fn enumerate_single_query_node(&mut self) {
        for (idx, node) in self.graph.nodes() {
            let mut subgraph = SubqueryGraph::empty(self.graph);
            subgraph.add_query_node(idx);
            let cardinality = crate::planner::cost::scan_node_cost(self.stats, node.label);
            let mut schema = Schema::default();
            schema.add_var(node.variable.clone());
            let op = LogicalOperator::ScanNodeId { alias: node.variable.clone(), label: node.label };
            let (op, schema) = self.apply_filters(&SubqueryGraph::empty(self.graph), &subgraph, op, schema);
            self.add(0, subgraph, PlanCandidate { op, schema, cardinality, cost: cardinality });
        }
    }

    fn enumerate_extend(&mut self, prev_k: usize) -> Result<()> {
        let prev_level = self.levels[prev_k].clone();
        for (prev_subgraph, prev_candidate) in prev_level {
            for (rel_idx, src_in, dst_in) in prev_subgraph.connected_query_rels_with_direction(self.graph) {
                if src_in && dst_in {
                    return Err(Error::internal(
                        "Logical intersect is not yet supported by this enumerator",
                    ));
                }
                let mut next_subgraph = prev_subgraph.clone();
                next_subgraph.add_query_rel(self.graph, rel_idx);
                let (op, schema, cardinality) =
                    self.build_extend(&prev_subgraph, rel_idx, src_in, &prev_candidate);
                let (op, schema) = self.apply_filters(&prev_subgraph, &next_subgraph, op, schema);
                let cost = prev_candidate.cost + cardinality;
                self.add(prev_k + 1, next_subgraph, PlanCandidate { op, schema, cardinality, cost });
            }
        }
        Ok(())
    }

    fn build_extend(
        &self,
        prev_subgraph: &SubqueryGraph,
        rel_idx: RelIdx,
        src_in: bool,
        prev: &PlanCandidate,
    ) -> (LogicalOperator, Schema, f64) {
        let rel = self.graph.rel(rel_idx);
        let (direction, bound_idx, nbr_idx) =
            if src_in { (Direction::Forward, rel.src, rel.dst) } else { (Direction::Backward, rel.dst, rel.src) };
        let _ = prev_subgraph;
        let bound_alias = self.graph.node(bound_idx).variable.clone();
        let nbr_alias = self.graph.node(nbr_idx).variable.clone();
        let cardinality = crate::planner::cost::extend_output_cardinality(
            self.stats,
            rel.label,
            direction,
            prev.cardinality,
        );
        let mut schema = prev.schema.clone();
        schema.add_var(nbr_alias.clone());
        schema.add_var(rel.variable.clone());
        let op = LogicalOperator::Extend {
            rel_alias: rel.variable.clone(),
            rel_label: rel.label,
            direction,
            bound_alias,
            nbr_alias,
            input: Box::new(prev.op.clone()),
        };
        (op, schema, cardinality)
    }

    fn enumerate_hash_join(&mut self, next_k: usize) {
        // this enumerator only tries combining previously-enumerated subgraphs once at
        // least 4 rels are in play; below that, extend-only plans cover the
        // search space.
        if next_k < 4 {
            return;
        }
        let max_left = next_k - 2;
        let min_left = (next_k as f64 / 2.0).ceil() as usize;
        for left_size in (min_left..=max_left).rev() {
            let right_size = next_k - left_size;
            let left_level = self.levels[left_size].clone();
            let right_level = self.levels[right_size].clone();
            for (left_subgraph, left_candidate) in &left_level {
                for (right_subgraph, right_candidate) in &right_level {
                    if !left_subgraph.disjoint_rels_from(right_subgraph) {
                        continue;
                    }
                    let shared = left_subgraph.shared_nodes(right_subgraph);
                    if shared.len() != 1 {
                        continue;
                    }
                    let join_node = shared[0];
                    let mut combined = left_subgraph.clone();
                    combined.add_subquery_graph(right_subgraph);

                    self.add_hash_join(next_k, &combined, join_node, left_candidate, right_candidate);
                    if left_size != right_size {
                        self.add_hash_join(next_k, &combined, join_node, right_candidate, left_candidate);
                    }
                }
            }
        }
    }

    fn add_hash_join(
        &mut self,
        k: usize,
        combined: &SubqueryGraph,
        join_node: NodeIdx,
        build: &PlanCandidate,
        probe: &PlanCandidate,
    ) {
        let join_var = self.graph.node(join_node).variable.clone();
        let mut schema = probe.schema.clone();
        for v in &build.schema.vars {
            schema.add_var(v.clone());
        }
        for p in &build.schema.properties {
            schema.add_property(p.clone());
        }
        let cardinality = crate::planner::cost::hash_join_output_cardinality(
            build.cardinality,
            probe.cardinality,
        );
        let cost = build.cost + probe.cost + build.cardinality;
        let op = LogicalOperator::HashJoin {
            join_var,
            build: Box::new(build.op.clone()),
            probe: Box::new(probe.op.clone()),
        };
        let (op, schema) = self.apply_filters(&SubqueryGraph::empty(self.graph), combined, op, schema);
        self.add(k, combined.clone(), PlanCandidate { op, schema, cardinality, cost });
    }

    /// Wraps `op` in a `ScanNodeProperty`/`ScanRelProperty` + `Filter` for
    /// every conjunct whose dependencies are newly satisfied by growing from
    /// `prev_subgraph` to `next_subgraph` (an `appendFiltersIfPossible`-style pass).
    fn apply_filters(
        &self,
        prev_subgraph: &SubqueryGraph,
        next_subgraph: &SubqueryGraph,
        mut op: LogicalOperator,
        mut schema: Schema,
    ) -> (LogicalOperator, Schema) {
        for conjunct in self.conjuncts {
            let mut vars = Vec::new();
            conjunct.collect_variable_names(&mut vars);
            let deps: std::collections::HashSet<String> = vars.into_iter().collect();
            if deps.is_empty() {
                continue;
            }
            let newly_satisfied = next_subgraph.contains_all_vars(self.graph, &deps)
                && !prev_subgraph.contains_all_vars(self.graph, &deps);
            if !newly_satisfied {
                continue;
            }
            let mut props = Vec::new();
            conjunct.collect_property_refs(&mut props);
            for prop in props {
                if schema.contains_property(&prop) {
                    continue;
                }
                let Some((var, field)) = prop.split_once('.') else { continue };
                op = self.append_scan_property(op, var, field);
                schema.add_property(prop);
            }
            op = LogicalOperator::Filter { predicate: conjunct.clone(), input: Box::new(op) };
        }
        (op, schema)
    }

    fn append_scan_property(&self, input: LogicalOperator, var: &str, property: &str) -> LogicalOperator {
        if self.graph.find_node(var).is_some() {
            LogicalOperator::ScanNodeProperty {
                alias: var.to_string(),
                property: property.to_string(),
                input: Box::new(input),
            }
        } else {
            let direction = self
                .graph
                .find_rel(var)
                .map(|idx| {
                    let rel = self.graph.rel(idx);
                    if self.graph.node(rel.src).variable == var {
                        Direction::Forward
                    } else {
                        Direction::Backward
                    }
                })
                .unwrap_or(Direction::Forward);
            LogicalOperator::ScanRelProperty {
                alias: var.to_string(),
                property: property.to_string(),
                direction,
                input: Box::new(input),
            }
        }
    }
}

/// Enumerates the cheapest plan covering every node/rel in `graph`. Returns
/// `None` if `graph` has no nodes (a segment with no `MATCH` pattern).
pub fn enumerate_plan(
    graph: &QueryGraph,
    stats: &StatisticsSnapshot,
    conjuncts: &[BoundExpression],
) -> Result<Option<(LogicalOperator, Schema)>> {
    if graph.num_nodes() == 0 {
        return Ok(None);
    }
    let num_rels = graph.num_rels();
    let mut enumerator =
        Enumerator { graph, stats, conjuncts, levels: vec![Level::new(); num_rels + 1] };
    enumerator.enumerate_single_query_node();
    for k in 0..num_rels {
        enumerator.enumerate_extend(k)?;
        enumerator.enumerate_hash_join(k + 1);
    }

    let full = enumerator.levels[num_rels]
        .values()
        .cloned()
        .reduce(|a, b| if better(&b, &a) { b } else { a })
        .ok_or_else(|| Error::internal("join enumeration produced no plan for a connected graph"))?;
    Ok(Some((full.op, full.schema)))
}
