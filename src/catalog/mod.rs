//! Catalog (component 4.C): table/property/sequence metadata. Read-mostly
//! during query execution; mutated only by DDL or bulk copy, both of which
//! take the catalog write lock for the statement's duration (§5).

mod schema;
mod type_name;

pub use schema::{
    ConflictAction, Direction, Multiplicity, NodeTableSchema, PropertySchema, RelTableSchema,
};
pub use type_name::resolve_type_name;

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::value::LogicalType;

/// A label id. `ANY_LABEL` is the sentinel used by rel patterns whose label
/// was left unspecified in the query (`()-[]->()`), meaning "any rel label
/// adjacent in this direction is acceptable" rather than a real table.
pub type LabelId = u32;
pub const ANY_LABEL: LabelId = u32::MAX;

/// Table and sequence metadata. Node/rel schemas are append-only once
/// created (property ordinals never change); tables/sequences themselves
/// can be dropped.
#[derive(Debug, Default)]
pub struct Catalog {
    node_tables: HashMap<LabelId, NodeTableSchema>,
    rel_tables: HashMap<LabelId, RelTableSchema>,
    node_name_to_id: HashMap<String, LabelId>,
    rel_name_to_id: HashMap<String, LabelId>,
    sequences: HashMap<String, i64>,
    next_label_id: LabelId,
    graph_entries: HashMap<String, GraphEntry>,
    table_comments: HashMap<String, String>,
    installed_extensions: HashSet<String>,
}

/// A named, reusable node/rel label set, the extension seam a
/// `graph_entry_set` exposes to table functions beyond plain MATCH (e.g.
/// centrality extensions). No algorithm consumes this in the core; it is
/// kept as a registrable alias so an extension can be added later without
/// touching the catalog's shape.
#[derive(Debug, Clone, Default)]
pub struct GraphEntry {
    pub node_labels: Vec<LabelId>,
    pub rel_labels: Vec<LabelId>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog::default()
    }

    fn alloc_label_id(&mut self) -> LabelId {
        let id = self.next_label_id;
        self.next_label_id += 1;
        id
    }

    pub fn contains_node_label(&self, name: &str) -> bool {
        self.node_name_to_id.contains_key(name)
    }

    pub fn contains_rel_label(&self, name: &str) -> bool {
        self.rel_name_to_id.contains_key(name)
    }

    pub fn node_label_id(&self, name: &str) -> Option<LabelId> {
        self.node_name_to_id.get(name).copied()
    }

    pub fn rel_label_id(&self, name: &str) -> Option<LabelId> {
        self.rel_name_to_id.get(name).copied()
    }

    pub fn node_table(&self, label: LabelId) -> Option<&NodeTableSchema> {
        self.node_tables.get(&label)
    }

    pub fn rel_table(&self, label: LabelId) -> Option<&RelTableSchema> {
        self.rel_tables.get(&label)
    }

    pub fn node_tables(&self) -> impl Iterator<Item = &NodeTableSchema> {
        self.node_tables.values()
    }

    pub fn rel_tables(&self) -> impl Iterator<Item = &RelTableSchema> {
        self.rel_tables.values()
    }

    /// Property descriptor lookup; `label` may be a node or rel label id.
    pub fn get_property(&self, label: LabelId, property_name: &str) -> Option<&PropertySchema> {
        if let Some(t) = self.node_tables.get(&label) {
            return t.property(property_name);
        }
        if let Some(t) = self.rel_tables.get(&label) {
            return t.property(property_name);
        }
        None
    }

    /// Rel labels adjacent to `node_label` in `direction`, i.e. every rel
    /// table whose FWD-or-BWD endpoint (per `direction`) matches the node
    /// label, or `ANY_LABEL` matches any node label.
    pub fn rels_adjacent_to_node_label(
        &self,
        node_label: LabelId,
        direction: Direction,
    ) -> Vec<LabelId> {
        self.rel_tables
            .values()
            .filter(|r| r.connects(node_label, direction))
            .map(|r| r.label_id())
            .collect()
    }

    pub fn is_single_multiplicity(&self, rel_label: LabelId, direction: Direction) -> bool {
        self.rel_tables
            .get(&rel_label)
            .map(|r| r.multiplicity(direction).is_single())
            .unwrap_or(false)
    }

    /// `SCAN_NODE_ID` cardinality for the optimizer's cost model (§4.F).
    pub fn num_node_rows(&self, label: LabelId) -> u64 {
        self.node_tables.get(&label).map(|t| t.num_rows()).unwrap_or(0)
    }

    /// `EXTEND` cost is "proportional to the number of rels it traverses":
    /// average out-degree of the bound endpoint times its row count.
    pub fn avg_degree(&self, rel_label: LabelId, direction: Direction) -> f64 {
        let Some(rel) = self.rel_tables.get(&rel_label) else { return 0.0 };
        let bound_label = match direction {
            Direction::Forward => rel.src_node_label(),
            Direction::Backward => rel.dst_node_label(),
        };
        let bound_rows = self.num_node_rows(bound_label);
        if bound_rows == 0 {
            return 0.0;
        }
        rel.num_rels(direction) as f64 / bound_rows as f64
    }

    /// Records bulk-copy row counts so later query plans cost correctly;
    /// called by [`crate::storage`]'s `CopyNode`/`RelBatchInsert` operators.
    pub fn set_node_row_count(&mut self, label: LabelId, count: u64) {
        if let Some(t) = self.node_tables.get_mut(&label) {
            t.set_num_rows(count);
        }
    }

    pub fn set_rel_row_count(&mut self, label: LabelId, direction: Direction, count: u64) {
        if let Some(t) = self.rel_tables.get_mut(&label) {
            t.set_num_rels(direction, count);
        }
    }

    pub fn create_sequence(&mut self, name: &str, start: i64, action: ConflictAction) -> Result<()> {
        if self.sequences.contains_key(name) {
            return match action {
                ConflictAction::Fail => {
                    Err(Error::Catalog(format!("Sequence {name} already exists.")))
                }
                ConflictAction::OnConflictDoNothing => Ok(()),
            };
        }
        self.sequences.insert(name.to_string(), start);
        Ok(())
    }

    pub fn drop_sequence(&mut self, name: &str) -> Result<()> {
        if self.sequences.remove(name).is_none() {
            return Err(Error::Catalog(format!("Sequence {name} does not exist.")));
        }
        Ok(())
    }

    pub fn next_sequence_value(&mut self, name: &str) -> Result<i64> {
        let v = self
            .sequences
            .get_mut(name)
            .ok_or_else(|| Error::Catalog(format!("Sequence {name} does not exist.")))?;
        let cur = *v;
        *v += 1;
        Ok(cur)
    }

    pub fn create_node_table(
        &mut self,
        name: &str,
        properties: Vec<(String, LogicalType)>,
        primary_key: String,
        action: ConflictAction,
    ) -> Result<LabelId> {
        if self.node_name_to_id.contains_key(name) {
            return match action {
                ConflictAction::Fail => {
                    Err(Error::Catalog(format!("Node table {name} already exists.")))
                }
                ConflictAction::OnConflictDoNothing => Ok(self.node_name_to_id[name]),
            };
        }
        let id = self.alloc_label_id();
        let schema = NodeTableSchema::new(id, name.to_string(), properties, primary_key);
        self.node_tables.insert(id, schema);
        self.node_name_to_id.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn create_rel_table(
        &mut self,
        name: &str,
        src: LabelId,
        dst: LabelId,
        multiplicity: Multiplicity,
        properties: Vec<(String, LogicalType)>,
        action: ConflictAction,
    ) -> Result<LabelId> {
        if self.rel_name_to_id.contains_key(name) {
            return match action {
                ConflictAction::Fail => {
                    Err(Error::Catalog(format!("Rel table {name} already exists.")))
                }
                ConflictAction::OnConflictDoNothing => Ok(self.rel_name_to_id[name]),
            };
        }
        let id = self.alloc_label_id();
        let schema = RelTableSchema::new(id, name.to_string(), src, dst, multiplicity, properties);
        self.rel_tables.insert(id, schema);
        self.rel_name_to_id.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        if let Some(id) = self.node_name_to_id.remove(name) {
            self.node_tables.remove(&id);
            return Ok(());
        }
        if let Some(id) = self.rel_name_to_id.remove(name) {
            self.rel_tables.remove(&id);
            return Ok(());
        }
        Err(Error::Catalog(format!("Table {name} does not exist.")))
    }

    /// `COMMENT ON TABLE`: overwrites any prior comment, matching the usual
    /// comment catalog entry semantics (last write wins, no history kept).
    pub fn set_table_comment(&mut self, table_name: &str, comment: &str) -> Result<()> {
        if !self.node_name_to_id.contains_key(table_name) && !self.rel_name_to_id.contains_key(table_name) {
            return Err(Error::Catalog(format!("Table {table_name} does not exist.")));
        }
        self.table_comments.insert(table_name.to_string(), comment.to_string());
        Ok(())
    }

    pub fn table_comment(&self, table_name: &str) -> Option<&str> {
        self.table_comments.get(table_name).map(String::as_str)
    }

    /// `INSTALL EXTENSION`: idempotent, mirroring a CLI's usual behavior of not
    /// erroring when an already-installed extension is reinstalled.
    pub fn install_extension(&mut self, name: &str) {
        self.installed_extensions.insert(name.to_string());
    }

    pub fn uninstall_extension(&mut self, name: &str) -> Result<()> {
        if !self.installed_extensions.remove(name) {
            return Err(Error::Catalog(format!("Extension {name} is not installed.")));
        }
        Ok(())
    }

    pub fn is_extension_installed(&self, name: &str) -> bool {
        self.installed_extensions.contains(name)
    }

    pub fn create_graph_entry(&mut self, name: &str, entry: GraphEntry) {
        self.graph_entries.insert(name.to_string(), entry);
    }

    pub fn graph_entry(&self, name: &str) -> Option<&GraphEntry> {
        self.graph_entries.get(name)
    }

    /// ALTER TABLE ADD COLUMN: property ordinals are append-only, so this
    /// always assigns the next ordinal and never reorders existing ones.
    pub fn add_column(
        &mut self,
        table_name: &str,
        property_name: &str,
        logical_type: LogicalType,
    ) -> Result<()> {
        if let Some(id) = self.node_name_to_id.get(table_name) {
            let id = *id;
            return self.node_tables.get_mut(&id).unwrap().add_property(property_name, logical_type);
        }
        if let Some(id) = self.rel_name_to_id.get(table_name) {
            let id = *id;
            return self.rel_tables.get_mut(&id).unwrap().add_property(property_name, logical_type);
        }
        Err(Error::Catalog(format!("Table {table_name} does not exist.")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_table_twice_with_fail_errors() {
        let mut cat = Catalog::new();
        cat.create_node_table("Person", vec![], "id".into(), ConflictAction::Fail).unwrap();
        let err = cat.create_node_table("Person", vec![], "id".into(), ConflictAction::Fail);
        assert!(err.is_err());
    }

    #[test]
    fn create_table_if_not_exists_is_idempotent() {
        let mut cat = Catalog::new();
        let id1 = cat
            .create_node_table("Person", vec![], "id".into(), ConflictAction::OnConflictDoNothing)
            .unwrap();
        let id2 = cat
            .create_node_table("Person", vec![], "id".into(), ConflictAction::OnConflictDoNothing)
            .unwrap();
        assert_eq!(id1, id2);
    }

    #[test]
    fn rels_adjacent_to_node_label_respects_direction() {
        let mut cat = Catalog::new();
        let person = cat
            .create_node_table("Person", vec![], "id".into(), ConflictAction::Fail)
            .unwrap();
        let knows = cat
            .create_rel_table(
                "Knows",
                person,
                person,
                Multiplicity::ManyToMany,
                vec![],
                ConflictAction::Fail,
            )
            .unwrap();
        let fwd = cat.rels_adjacent_to_node_label(person, Direction::Forward);
        assert_eq!(fwd, vec![knows]);
    }

    #[test]
    fn table_comment_round_trips() {
        let mut cat = Catalog::new();
        cat.create_node_table("Person", vec![], "id".into(), ConflictAction::Fail).unwrap();
        cat.set_table_comment("Person", "people in the graph").unwrap();
        assert_eq!(cat.table_comment("Person"), Some("people in the graph"));
    }

    #[test]
    fn uninstalling_unknown_extension_errors() {
        let mut cat = Catalog::new();
        assert!(cat.uninstall_extension("httpfs").is_err());
        cat.install_extension("httpfs");
        assert!(cat.uninstall_extension("httpfs").is_ok());
    }
}
