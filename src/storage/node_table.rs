//! Node table storage (component 4.H): node groups of fixed capacity, each
//! holding one column chunk per property, plus a primary-key index built
//! during bulk copy.
//!
//! Grounded on the teacher's `storage::wal` + `config` shapes for the
//! accumulate-then-flush bulk-copy pattern; the node-group/column-chunk
//! layout itself is grounded on `original_source`'s node group header
//! (no single file survived retrieval whole, but the `(group, offset)`
//! decomposition is already load-bearing in [`crate::value::InternalId`]).

use std::collections::HashMap;

use crate::catalog::LabelId;
use crate::error::{Error, Result};
use crate::value::{InternalId, Scalar};

/// One fixed-capacity slice of a node table's rows; `columns[i]` holds
/// property ordinal `i`'s values for every row in this group.
#[derive(Debug, Clone, Default)]
pub struct NodeGroup {
    pub columns: Vec<Vec<Scalar>>,
    pub row_count: u64,
}

/// A node table's full storage: its node groups plus a primary-key index
/// mapping the key scalar to the `InternalId` that owns it.
#[derive(Debug, Default)]
pub struct NodeTable {
    label: LabelId,
    num_properties: usize,
    node_group_size: u64,
    groups: Vec<NodeGroup>,
    pk_index: HashMap<PkKey, InternalId>,
    pk_ordinal: usize,
}

/// [`Scalar`] doesn't implement `Hash`/`Eq` (floats), so the primary-key
/// index keys on a canonical string form instead, matching how
/// string/int/serial primary keys are all ultimately compared by byte
/// equality once hashed into the index's bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PkKey(String);

fn pk_key(v: &Scalar) -> PkKey {
    PkKey(v.to_string())
}

impl NodeTable {
    pub fn new(label: LabelId, num_properties: usize, pk_ordinal: usize, node_group_size: u64) -> Self {
        NodeTable { label, num_properties, node_group_size, groups: Vec::new(), pk_index: HashMap::new(), pk_ordinal }
    }

    pub fn label(&self) -> LabelId {
        self.label
    }

    pub fn num_rows(&self) -> u64 {
        self.groups.iter().map(|g| g.row_count).sum()
    }

    pub fn groups(&self) -> &[NodeGroup] {
        &self.groups
    }

    pub fn lookup_pk(&self, key: &Scalar) -> Option<InternalId> {
        self.pk_index.get(&pk_key(key)).copied()
    }

    pub fn get_property(&self, id: InternalId, ordinal: usize) -> Option<&Scalar> {
        let group = self.groups.get(id.node_group_idx() as usize)?;
        group.columns.get(ordinal)?.get(id.offset_in_group() as usize)
    }

    /// Appends a batch of fully-materialized rows (one `Vec<Scalar>` per
    /// row, ordered by property ordinal), rejecting the whole batch if any
    /// row's primary key already exists or collides within the batch
    /// itself (§8 "duplicate primary keys are rejected").
    pub fn append_rows(&mut self, rows: Vec<Vec<Scalar>>) -> Result<u64> {
        let mut seen_in_batch = std::collections::HashSet::new();
        for row in &rows {
            let key = pk_key(&row[self.pk_ordinal]);
            if self.pk_index.contains_key(&key) || !seen_in_batch.insert(key) {
                return Err(Error::copy(format!(
                    "Found duplicated primary key value {}, table {}.",
                    row[self.pk_ordinal], self.label
                )));
            }
        }

        let start_offset = self.num_rows();
        for (i, row) in rows.into_iter().enumerate() {
            let offset = start_offset + i as u64;
            let id = InternalId::new(self.label, offset);
            let group_idx = id.node_group_idx() as usize;
            while self.groups.len() <= group_idx {
                self.groups.push(NodeGroup { columns: vec![Vec::new(); self.num_properties], row_count: 0 });
            }
            let group = &mut self.groups[group_idx];
            self.pk_index.insert(pk_key(&row[self.pk_ordinal]), id);
            for (ordinal, value) in row.into_iter().enumerate() {
                group.columns[ordinal].push(value);
            }
            group.row_count += 1;
        }
        let _ = self.node_group_size;
        Ok(self.num_rows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_rows_builds_pk_index_and_rejects_duplicates() {
        let mut table = NodeTable::new(0, 2, 0, 1 << 18);
        table.append_rows(vec![vec![Scalar::Int64(1), Scalar::String("a".into())]]).unwrap();
        assert!(table.lookup_pk(&Scalar::Int64(1)).is_some());

        let err = table.append_rows(vec![vec![Scalar::Int64(1), Scalar::String("b".into())]]);
        assert!(err.is_err());
    }

    #[test]
    fn property_round_trips_through_internal_id() {
        let mut table = NodeTable::new(0, 1, 0, 1 << 18);
        table.append_rows(vec![vec![Scalar::Int64(42)]]).unwrap();
        let id = table.lookup_pk(&Scalar::Int64(42)).unwrap();
        assert_eq!(table.get_property(id, 0), Some(&Scalar::Int64(42)));
    }
}
