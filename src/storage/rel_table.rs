//! Rel table storage (component 4.H): packed CSR adjacency, one per
//! direction, built per node group during bulk `RelBatchInsert`.

use std::collections::HashMap;

use crate::catalog::{Direction, LabelId};
use crate::error::{Error, Result};
use crate::storage::csr::CsrHeader;
use crate::value::{InternalId, Scalar};

/// One direction's CSR for one node group: `header` gives each local node
/// offset's slot range into `nbr`/`rel_offset`/`properties`.
#[derive(Debug, Clone, Default)]
pub struct CsrNodeGroup {
    pub header: CsrHeader,
    pub nbr: Vec<InternalId>,
    /// Row offset into this rel table's flat property columns, so both
    /// directions' CSR point at the same underlying rel properties rather
    /// than duplicating them.
    pub rel_row: Vec<u64>,
}

#[derive(Debug, Default)]
pub struct RelTable {
    label: LabelId,
    density: f64,
    fwd: Vec<CsrNodeGroup>,
    bwd: Vec<CsrNodeGroup>,
    properties: Vec<Vec<Scalar>>,
    num_rels: u64,
}

impl RelTable {
    pub fn new(label: LabelId, num_properties: usize, density: f64) -> Self {
        RelTable { label, density, fwd: Vec::new(), bwd: Vec::new(), properties: vec![Vec::new(); num_properties], num_rels: 0 }
    }

    pub fn label(&self) -> LabelId {
        self.label
    }

    pub fn num_rels(&self) -> u64 {
        self.num_rels
    }

    fn group_for(&self, direction: Direction) -> &[CsrNodeGroup] {
        match direction {
            Direction::Forward => &self.fwd,
            Direction::Backward => &self.bwd,
        }
    }

    /// Every `(nbr, rel_row)` pair adjacent to `bound` in `direction`.
    pub fn adjacency(&self, bound: InternalId, direction: Direction) -> Vec<(InternalId, u64)> {
        let groups = self.group_for(direction);
        let Some(group) = groups.get(bound.node_group_idx() as usize) else { return Vec::new() };
        let local = bound.offset_in_group() as usize;
        if local >= group.header.offsets.len() {
            return Vec::new();
        }
        group
            .header
            .range(local)
            .map(|slot| (group.nbr[slot as usize], group.rel_row[slot as usize]))
            .collect()
    }

    pub fn property(&self, rel_row: u64, ordinal: usize) -> Option<&Scalar> {
        self.properties.get(ordinal)?.get(rel_row as usize)
    }

    /// Bulk-builds both directions' CSR from a flat edge list (each edge
    /// being `(src, dst, property values)`), grouped by node group and laid
    /// out per the packed gap policy. Matches a bulk `RelBatchInsert`:
    /// edges are partitioned by the bound endpoint's node group, then each
    /// group's CSR is constructed once from the full adjacency list rather
    /// than incrementally.
    ///
    /// `single_fwd`/`single_bwd` mirror the catalog's per-direction
    /// multiplicity (ONE-ONE / ONE-MANY / MANY-ONE): when a direction is
    /// single, any bound node with more than one rel is a structural copy
    /// error (§3 "each source node must have length ≤ 1") and the whole
    /// insert is rejected before either CSR is installed.
    pub fn bulk_insert(
        &mut self,
        edges: Vec<(InternalId, InternalId, Vec<Scalar>)>,
        single_fwd: bool,
        single_bwd: bool,
    ) -> Result<()> {
        let rel_row_base = self.num_rels;
        let fwd = build_direction(&edges, rel_row_base, self.density, |e| (e.0, e.1))?;
        check_single_multiplicity(&fwd, single_fwd, "FWD")?;
        let bwd = build_direction(&edges, rel_row_base, self.density, |e| (e.1, e.0))?;
        check_single_multiplicity(&bwd, single_bwd, "BWD")?;

        for (_, _, props) in &edges {
            for (ordinal, value) in props.iter().enumerate() {
                self.properties[ordinal].push(value.clone());
            }
        }
        self.num_rels += edges.len() as u64;
        self.fwd = fwd;
        self.bwd = bwd;
        Ok(())
    }
}

fn check_single_multiplicity(groups: &[CsrNodeGroup], single: bool, direction: &str) -> Result<()> {
    if !single {
        return Ok(());
    }
    for (group_idx, group) in groups.iter().enumerate() {
        if let Some(local) = group.header.lengths.iter().position(|&len| len > 1) {
            return Err(Error::copy(format!(
                "{direction} multiplicity violation: bound node {group_idx}:{local} has more than one rel."
            )));
        }
    }
    Ok(())
}

fn build_direction(
    edges: &[(InternalId, InternalId, Vec<Scalar>)],
    rel_row_base: u64,
    density: f64,
    bound_and_nbr: impl Fn(&(InternalId, InternalId, Vec<Scalar>)) -> (InternalId, InternalId),
) -> Result<Vec<CsrNodeGroup>> {
    let mut by_group: HashMap<u64, Vec<(usize, InternalId, InternalId)>> = HashMap::new();
    for (row, edge) in edges.iter().enumerate() {
        let (bound, nbr) = bound_and_nbr(edge);
        by_group.entry(bound.node_group_idx()).or_default().push((row, bound, nbr));
    }

    let max_group = by_group.keys().copied().max().unwrap_or(0);
    let mut groups = Vec::new();
    for g in 0..=max_group {
        let Some(entries) = by_group.get(&g) else {
            groups.push(CsrNodeGroup::default());
            continue;
        };
        let max_local = entries.iter().map(|(_, bound, _)| bound.offset_in_group()).max().unwrap_or(0);
        let mut by_local: Vec<Vec<(usize, InternalId)>> = vec![Vec::new(); max_local as usize + 1];
        for (row, bound, nbr) in entries {
            by_local[bound.offset_in_group() as usize].push((*row, *nbr));
        }
        let lengths: Vec<u64> = by_local.iter().map(|v| v.len() as u64).collect();
        let header = CsrHeader::build(&lengths, density);
        let total = header.total_slots(density) as usize;
        let mut nbr = vec![InternalId::new(0, 0); total];
        let mut rel_row = vec![0u64; total];
        for (local, entries) in by_local.into_iter().enumerate() {
            let start = header.offsets[local] as usize;
            for (i, (row, n)) in entries.into_iter().enumerate() {
                nbr[start + i] = n;
                rel_row[start + i] = rel_row_base + row as u64;
            }
        }
        groups.push(CsrNodeGroup { header, nbr, rel_row });
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_insert_round_trips_adjacency_both_directions() {
        let mut table = RelTable::new(0, 0, 0.8);
        let a = InternalId::new(1, 0);
        let b = InternalId::new(1, 1);
        table.bulk_insert(vec![(a, b, vec![])], false, false).unwrap();

        let fwd = table.adjacency(a, Direction::Forward);
        assert_eq!(fwd.len(), 1);
        assert_eq!(fwd[0].0, b);

        let bwd = table.adjacency(b, Direction::Backward);
        assert_eq!(bwd.len(), 1);
        assert_eq!(bwd[0].0, a);

        assert!(table.adjacency(a, Direction::Backward).is_empty());
    }

    #[test]
    fn csr_offset_and_length_invariant_holds_after_bulk_insert() {
        let mut table = RelTable::new(0, 0, 0.8);
        let a = InternalId::new(1, 0);
        let edges: Vec<_> = (0..5).map(|i| (a, InternalId::new(1, i + 1), vec![])).collect();
        table.bulk_insert(edges, false, false).unwrap();
        let group = &table.fwd[1];
        let local = a.offset_in_group() as usize;
        assert_eq!(group.header.lengths[local], 5);
        let slots = super::super::csr::slots_for_length(5, 0.8);
        assert!(slots >= group.header.lengths[local]);
    }

    #[test]
    fn many_to_one_violation_on_the_single_side_is_rejected() {
        let mut table = RelTable::new(0, 0, 0.8);
        let a = InternalId::new(1, 0);
        // Two rels bound at the same FWD node `a` violate a single (ONE-*)
        // forward multiplicity.
        let edges =
            vec![(a, InternalId::new(1, 1), vec![]), (a, InternalId::new(1, 2), vec![])];
        let err = table.bulk_insert(edges, true, false).unwrap_err();
        assert!(err.to_string().contains("multiplicity violation"));
        // Rejected inserts must not leave partial state behind.
        assert_eq!(table.num_rels(), 0);
        assert!(table.adjacency(a, Direction::Forward).is_empty());
    }

    #[test]
    fn many_to_many_allows_multiple_rels_per_bound_node() {
        let mut table = RelTable::new(0, 0, 0.8);
        let a = InternalId::new(1, 0);
        let edges =
            vec![(a, InternalId::new(1, 1), vec![]), (a, InternalId::new(1, 2), vec![])];
        table.bulk_insert(edges, false, false).unwrap();
        assert_eq!(table.adjacency(a, Direction::Forward).len(), 2);
    }
}
