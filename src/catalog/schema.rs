//! Table and property schema types backing [`super::Catalog`].

use crate::error::{Error, Result};
use crate::value::LogicalType;

use super::LabelId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// The four Cypher rel cardinalities, tracked per direction so a rel table
/// can be e.g. many-to-one in one direction and one-to-many in the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl Multiplicity {
    pub fn is_single(&self, direction: Direction) -> bool {
        match (self, direction) {
            (Multiplicity::OneToOne, _) => true,
            (Multiplicity::OneToMany, Direction::Forward) => true,
            (Multiplicity::ManyToOne, Direction::Backward) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictAction {
    Fail,
    OnConflictDoNothing,
}

#[derive(Debug, Clone)]
pub struct PropertySchema {
    pub name: String,
    pub logical_type: LogicalType,
    /// Stable once assigned; append-only across the table's lifetime.
    pub ordinal: usize,
}

#[derive(Debug, Clone)]
pub struct NodeTableSchema {
    id: LabelId,
    name: String,
    properties: Vec<PropertySchema>,
    primary_key: String,
    /// Row count maintained by `CopyNode`/DDL; the enumerator's cost model
    /// (§4.F) reads this as the `SCAN_NODE_ID` cardinality.
    num_rows: u64,
}

impl NodeTableSchema {
    pub fn new(
        id: LabelId,
        name: String,
        properties: Vec<(String, LogicalType)>,
        primary_key: String,
    ) -> Self {
        let properties = properties
            .into_iter()
            .enumerate()
            .map(|(ordinal, (name, logical_type))| PropertySchema { name, logical_type, ordinal })
            .collect();
        NodeTableSchema { id, name, properties, primary_key, num_rows: 0 }
    }

    pub fn num_rows(&self) -> u64 {
        self.num_rows
    }

    pub fn set_num_rows(&mut self, num_rows: u64) {
        self.num_rows = num_rows;
    }

    pub fn id(&self) -> LabelId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn properties(&self) -> &[PropertySchema] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn add_property(&mut self, name: &str, logical_type: LogicalType) -> Result<()> {
        if self.property(name).is_some() {
            return Err(Error::Catalog(format!(
                "Property {name} already exists on table {}.",
                self.name
            )));
        }
        let ordinal = self.properties.len();
        self.properties.push(PropertySchema { name: name.to_string(), logical_type, ordinal });
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RelTableSchema {
    id: LabelId,
    name: String,
    src_node_label: LabelId,
    dst_node_label: LabelId,
    multiplicity: Multiplicity,
    properties: Vec<PropertySchema>,
    /// Total rel count, tracked per direction so `EXTEND` cost (proportional
    /// to rels traversed) can be estimated from the bound label's average
    /// degree (§4.F: "`knows` fwd avg-degree 10, bwd 20").
    num_rels_fwd: u64,
    num_rels_bwd: u64,
}

impl RelTableSchema {
    pub fn new(
        id: LabelId,
        name: String,
        src_node_label: LabelId,
        dst_node_label: LabelId,
        multiplicity: Multiplicity,
        properties: Vec<(String, LogicalType)>,
    ) -> Self {
        let properties = properties
            .into_iter()
            .enumerate()
            .map(|(ordinal, (name, logical_type))| PropertySchema { name, logical_type, ordinal })
            .collect();
        RelTableSchema {
            id,
            name,
            src_node_label,
            dst_node_label,
            multiplicity,
            properties,
            num_rels_fwd: 0,
            num_rels_bwd: 0,
        }
    }

    pub fn num_rels(&self, direction: Direction) -> u64 {
        match direction {
            Direction::Forward => self.num_rels_fwd,
            Direction::Backward => self.num_rels_bwd,
        }
    }

    pub fn set_num_rels(&mut self, direction: Direction, count: u64) {
        match direction {
            Direction::Forward => self.num_rels_fwd = count,
            Direction::Backward => self.num_rels_bwd = count,
        }
    }

    pub fn label_id(&self) -> LabelId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn src_node_label(&self) -> LabelId {
        self.src_node_label
    }

    pub fn dst_node_label(&self) -> LabelId {
        self.dst_node_label
    }

    pub fn properties(&self) -> &[PropertySchema] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn add_property(&mut self, name: &str, logical_type: LogicalType) -> Result<()> {
        if self.property(name).is_some() {
            return Err(Error::Catalog(format!(
                "Property {name} already exists on table {}.",
                self.name
            )));
        }
        let ordinal = self.properties.len();
        self.properties.push(PropertySchema { name: name.to_string(), logical_type, ordinal });
        Ok(())
    }

    /// Whether this rel table is adjacent to `node_label` as the endpoint
    /// `direction` would scan from (FWD scans from src, BWD from dst).
    pub fn connects(&self, node_label: LabelId, direction: Direction) -> bool {
        let endpoint = match direction {
            Direction::Forward => self.src_node_label,
            Direction::Backward => self.dst_node_label,
        };
        endpoint == node_label || endpoint == super::ANY_LABEL || node_label == super::ANY_LABEL
    }

    pub fn multiplicity(&self, direction: Direction) -> MultiplicityView {
        MultiplicityView { multiplicity: self.multiplicity, direction }
    }
}

/// Binds a table's [`Multiplicity`] to one direction so callers can ask
/// `.is_single()` without repeating the direction.
pub struct MultiplicityView {
    multiplicity: Multiplicity,
    direction: Direction,
}

impl MultiplicityView {
    pub fn is_single(&self) -> bool {
        self.multiplicity.is_single(self.direction)
    }
}
