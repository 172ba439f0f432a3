//! The bound pattern graph: an arena of nodes/rels referenced by stable
//! indices rather than owned pointers, so subgraphs during plan enumeration
//! can be represented as plain bitsets over these indices.

use std::collections::HashSet;

use crate::catalog::{Direction, LabelId};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdx(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelIdx(pub usize);

#[derive(Debug, Clone)]
pub struct QueryNode {
    pub variable: String,
    pub label: LabelId,
}

#[derive(Debug, Clone)]
pub struct QueryRel {
    pub variable: String,
    pub label: LabelId,
    pub src: NodeIdx,
    pub dst: NodeIdx,
}

/// Arena of query nodes/rels built while binding a `MATCH` pattern. Indices
/// are stable for the lifetime of the query graph; nothing is ever removed.
#[derive(Debug, Clone, Default)]
pub struct QueryGraph {
    nodes: Vec<QueryNode>,
    rels: Vec<QueryRel>,
}

impl QueryGraph {
    pub fn new() -> Self {
        QueryGraph::default()
    }

    pub fn add_node(&mut self, variable: String, label: LabelId) -> NodeIdx {
        self.nodes.push(QueryNode { variable, label });
        NodeIdx(self.nodes.len() - 1)
    }

    pub fn add_rel(&mut self, variable: String, label: LabelId, src: NodeIdx, dst: NodeIdx) -> RelIdx {
        self.rels.push(QueryRel { variable, label, src, dst });
        RelIdx(self.rels.len() - 1)
    }

    pub fn node(&self, idx: NodeIdx) -> &QueryNode {
        &self.nodes[idx.0]
    }

    pub fn rel(&self, idx: RelIdx) -> &QueryRel {
        &self.rels[idx.0]
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_rels(&self) -> usize {
        self.rels.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIdx, &QueryNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeIdx(i), n))
    }

    pub fn rels(&self) -> impl Iterator<Item = (RelIdx, &QueryRel)> {
        self.rels.iter().enumerate().map(|(i, r)| (RelIdx(i), r))
    }

    pub fn find_node(&self, variable: &str) -> Option<NodeIdx> {
        self.nodes.iter().position(|n| n.variable == variable).map(NodeIdx)
    }

    pub fn find_rel(&self, variable: &str) -> Option<RelIdx> {
        self.rels.iter().position(|r| r.variable == variable).map(RelIdx)
    }

    pub fn contains_node_name(&self, name: &str) -> bool {
        self.find_node(name).is_some()
    }

    /// Node variable names directly reachable from `node_name` via any rel.
    fn neighbour_node_names(&self, node_name: &str) -> Vec<String> {
        let Some(idx) = self.find_node(node_name) else { return Vec::new() };
        let mut out = Vec::new();
        for rel in &self.rels {
            if rel.src == idx {
                out.push(self.nodes[rel.dst.0].variable.clone());
            } else if rel.dst == idx {
                out.push(self.nodes[rel.src.0].variable.clone());
            }
        }
        out
    }

    /// BFS connectivity check, matching a `validateQueryGraphIsConnected`-style check:
    /// the visited frontier starts from the in-scope node variables (or, if
    /// none are in scope yet, the first query node), and must be able to
    /// reach every node in the query graph.
    pub fn validate_connected(&self, in_scope_node_vars: &HashSet<String>) -> Result<()> {
        if self.nodes.is_empty() {
            return Ok(());
        }
        let mut visited: HashSet<String> = in_scope_node_vars
            .iter()
            .filter(|v| self.contains_node_name(v))
            .cloned()
            .collect();
        if visited.is_empty() {
            visited.insert(self.nodes[0].variable.clone());
        }
        let mut target = visited.clone();
        for node in &self.nodes {
            target.insert(node.variable.clone());
        }
        let mut frontier = visited.clone();
        while !frontier.is_empty() {
            let mut next_frontier = HashSet::new();
            for node_in_frontier in &frontier {
                for nbr in self.neighbour_node_names(node_in_frontier) {
                    if !visited.contains(&nbr) {
                        visited.insert(nbr.clone());
                        next_frontier.insert(nbr);
                    }
                }
            }
            if visited.len() == target.len() {
                return Ok(());
            }
            frontier = next_frontier;
        }
        Err(Error::binder("Disconnect query graph is not supported."))
    }
}

/// A bitset subset of a [`QueryGraph`]'s rels, with nodes derived as the
/// endpoints of the included rels (plus any node added in isolation, for a
/// subgraph that has no rels yet).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubqueryGraph {
    included_rels: Vec<bool>,
    included_nodes: Vec<bool>,
}

impl SubqueryGraph {
    pub fn empty(graph: &QueryGraph) -> Self {
        SubqueryGraph {
            included_rels: vec![false; graph.num_rels()],
            included_nodes: vec![false; graph.num_nodes()],
        }
    }

    pub fn add_query_node(&mut self, idx: NodeIdx) {
        self.included_nodes[idx.0] = true;
    }

    pub fn add_query_rel(&mut self, graph: &QueryGraph, idx: RelIdx) {
        self.included_rels[idx.0] = true;
        let rel = graph.rel(idx);
        self.included_nodes[rel.src.0] = true;
        self.included_nodes[rel.dst.0] = true;
    }

    pub fn add_subquery_graph(&mut self, other: &SubqueryGraph) {
        for i in 0..self.included_rels.len() {
            self.included_rels[i] = self.included_rels[i] || other.included_rels[i];
        }
        for i in 0..self.included_nodes.len() {
            self.included_nodes[i] = self.included_nodes[i] || other.included_nodes[i];
        }
    }

    pub fn num_rels(&self) -> usize {
        self.included_rels.iter().filter(|b| **b).count()
    }

    pub fn contains_rel(&self, idx: RelIdx) -> bool {
        self.included_rels[idx.0]
    }

    pub fn contains_node(&self, idx: NodeIdx) -> bool {
        self.included_nodes[idx.0]
    }

    pub fn contains_all_vars(&self, graph: &QueryGraph, vars: &HashSet<String>) -> bool {
        vars.iter().all(|v| {
            graph.find_node(v).map(|i| self.contains_node(i)).unwrap_or(false)
                || graph.find_rel(v).map(|i| self.contains_rel(i)).unwrap_or(false)
        })
    }

    /// Whether this subgraph and `other` share no rels (a precondition for
    /// combining two independently-enumerated subgraphs into a hash join:
    /// joining two plans that already cover the same rel would double-count
    /// it).
    pub fn disjoint_rels_from(&self, other: &SubqueryGraph) -> bool {
        self.included_rels.iter().zip(&other.included_rels).all(|(a, b)| !(*a && *b))
    }

    /// Node indices present in both subgraphs, the candidate join keys for
    /// a hash join combining them.
    pub fn shared_nodes(&self, other: &SubqueryGraph) -> Vec<NodeIdx> {
        self.included_nodes
            .iter()
            .zip(&other.included_nodes)
            .enumerate()
            .filter_map(|(i, (a, b))| (*a && *b).then_some(NodeIdx(i)))
            .collect()
    }

    /// Rels with exactly one endpoint inside this subgraph, paired with
    /// which endpoint is the one already bound ("src connected" means the
    /// rel's `src` node is inside; an FWD extend walks src -> dst).
    pub fn connected_query_rels_with_direction(
        &self,
        graph: &QueryGraph,
    ) -> Vec<(RelIdx, bool, bool)> {
        let mut out = Vec::new();
        for (idx, rel) in graph.rels() {
            if self.contains_rel(idx) {
                continue;
            }
            let src_in = self.contains_node(rel.src);
            let dst_in = self.contains_node(rel.dst);
            if src_in || dst_in {
                out.push((idx, src_in, dst_in));
            }
        }
        out
    }
}

/// Extend direction relative to the already-bound endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendDirection {
    Forward,
    Backward,
}

impl From<ExtendDirection> for Direction {
    fn from(d: ExtendDirection) -> Direction {
        match d {
            ExtendDirection::Forward => Direction::Forward,
            ExtendDirection::Backward => Direction::Backward,
        }
    }
}
