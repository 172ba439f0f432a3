//! Storage engine (component 4.H): owns every table's node groups/CSR and
//! the write-ahead log, and implements the two bulk-copy entry points
//! (`CopyNode`, `RelBatchInsert`) the execution layer's DDL/copy operators
//! call into.

pub mod csr;
pub mod csv;
pub mod node_table;
pub mod rel_table;
pub mod wal;

use std::collections::HashMap;

use crate::catalog::{Catalog, Direction, LabelId};
use crate::config::Config;
use crate::error::Result;
use crate::value::{InternalId, Scalar};
use node_table::NodeTable;
use rel_table::RelTable;
use wal::{CopyTableRecord, TableType, Wal};

#[derive(Default)]
pub struct StorageEngine {
    node_tables: HashMap<LabelId, NodeTable>,
    rel_tables: HashMap<LabelId, RelTable>,
    wal: Option<Wal>,
    node_group_size: u64,
    packed_csr_density: f64,
}

impl StorageEngine {
    pub fn open(config: &Config) -> Result<Self> {
        let wal_path = if config.storage.data_dir.as_os_str() == ":memory:" {
            None
        } else {
            std::fs::create_dir_all(&config.storage.data_dir)?;
            Some(config.storage.data_dir.join("wal.log"))
        };
        Ok(StorageEngine {
            node_tables: HashMap::new(),
            rel_tables: HashMap::new(),
            wal: Some(Wal::open(wal_path.as_deref())?),
            node_group_size: config.storage.node_group_size,
            packed_csr_density: config.storage.packed_csr_density,
        })
    }

    pub fn register_node_table(&mut self, label: LabelId, num_properties: usize, pk_ordinal: usize) {
        self.node_tables
            .entry(label)
            .or_insert_with(|| NodeTable::new(label, num_properties, pk_ordinal, self.node_group_size));
    }

    pub fn register_rel_table(&mut self, label: LabelId, num_properties: usize) {
        let density = self.packed_csr_density;
        self.rel_tables.entry(label).or_insert_with(|| RelTable::new(label, num_properties, density));
    }

    pub fn node_table(&self, label: LabelId) -> Option<&NodeTable> {
        self.node_tables.get(&label)
    }

    pub fn rel_table(&self, label: LabelId) -> Option<&RelTable> {
        self.rel_tables.get(&label)
    }

    pub fn adjacency(&self, rel_label: LabelId, bound: InternalId, direction: Direction) -> Vec<(InternalId, u64)> {
        self.rel_tables.get(&rel_label).map(|t| t.adjacency(bound, direction)).unwrap_or_default()
    }

    /// `CopyNode`: appends `rows` to `label`'s node groups and records a
    /// `CopyTableRecord` in the WAL before installing them, then updates
    /// the catalog's cached row count so subsequent plans cost correctly.
    pub fn copy_node(&mut self, catalog: &mut Catalog, label: LabelId, rows: Vec<Vec<Scalar>>) -> Result<u64> {
        if let Some(wal) = &self.wal {
            wal.append_copy_table(&CopyTableRecord { table_id: label, table_type: TableType::Node })?;
        }
        let table = self.node_tables.get_mut(&label).expect("node table must be registered before copy");
        let total = table.append_rows(rows)?;
        catalog.set_node_row_count(label, total);
        Ok(total)
    }

    /// `RelBatchInsert`: resolves each edge's endpoint primary keys to
    /// `InternalId`s via the src/dst node tables' PK index, then bulk-builds
    /// both directions' CSR and updates the catalog's per-direction row
    /// counts (FWD count = total edges by construction; BWD count is the
    /// same total, tracked separately only because the catalog's cost
    /// model keys average degree by direction).
    pub fn insert_rels(
        &mut self,
        catalog: &mut Catalog,
        rel_label: LabelId,
        src_label: LabelId,
        dst_label: LabelId,
        edges: Vec<(Scalar, Scalar, Vec<Scalar>)>,
    ) -> Result<u64> {
        if let Some(wal) = &self.wal {
            wal.append_copy_table(&CopyTableRecord { table_id: rel_label, table_type: TableType::Rel })?;
        }
        let mut resolved = Vec::with_capacity(edges.len());
        for (src_key, dst_key, props) in edges {
            let src_table = self.node_tables.get(&src_label);
            let dst_table = self.node_tables.get(&dst_label);
            let src_id = src_table
                .and_then(|t| t.lookup_pk(&src_key))
                .ok_or_else(|| crate::error::Error::copy(format!("Unknown src key {src_key}")))?;
            let dst_id = dst_table
                .and_then(|t| t.lookup_pk(&dst_key))
                .ok_or_else(|| crate::error::Error::copy(format!("Unknown dst key {dst_key}")))?;
            resolved.push((src_id, dst_id, props));
        }
        let single_fwd = catalog.is_single_multiplicity(rel_label, Direction::Forward);
        let single_bwd = catalog.is_single_multiplicity(rel_label, Direction::Backward);
        let table = self.rel_tables.get_mut(&rel_label).expect("rel table must be registered before copy");
        table.bulk_insert(resolved, single_fwd, single_bwd)?;
        let total = table.num_rels();
        catalog.set_rel_row_count(rel_label, Direction::Forward, total);
        catalog.set_rel_row_count(rel_label, Direction::Backward, total);
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ConflictAction, Multiplicity};
    use crate::config::Config;

    #[test]
    fn insert_rels_rejects_many_to_one_violation_via_the_catalogs_multiplicity() {
        let config = Config::in_memory();
        let mut storage = StorageEngine::open(&config).unwrap();
        let mut cat = Catalog::new();
        let person = cat.create_node_table("person", vec![], "id".into(), ConflictAction::Fail).unwrap();
        let knows = cat
            .create_rel_table("owns", person, person, Multiplicity::ManyToOne, vec![], ConflictAction::Fail)
            .unwrap();
        storage.register_node_table(person, 1, 0);
        storage.register_rel_table(knows, 0);
        storage.copy_node(&mut cat, person, vec![vec![Scalar::Int64(1)], vec![Scalar::Int64(2)], vec![Scalar::Int64(3)]]).unwrap();

        // MANY-ONE: each source may point at at most one destination, so
        // two rels sharing source `1` violate the FWD single-multiplicity
        // side.
        let edges = vec![
            (Scalar::Int64(1), Scalar::Int64(2), vec![]),
            (Scalar::Int64(1), Scalar::Int64(3), vec![]),
        ];
        let err = storage.insert_rels(&mut cat, knows, person, person, edges).unwrap_err();
        assert!(err.to_string().contains("multiplicity violation"));
    }
}
