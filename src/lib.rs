//! `graph_engine`: an embedded property-graph database with a Cypher-subset
//! query language. The public surface is intentionally small — open a
//! [`Database`], open a [`Connection`] against it, and run text through
//! [`Connection::query`] to get back a [`QueryResult`] — everything else
//! (parsing, binding, planning, vectorized execution, packed-CSR storage) is
//! an implementation detail reached only through that one entry point.

pub mod ast;
pub mod binder;
pub mod cast;
pub mod catalog;
pub mod config;
pub mod error;
pub mod execution;
pub mod parser;
pub mod planner;
pub mod statistics;
pub mod storage;
pub mod temporal;
pub mod trace;
pub mod value;

use std::path::Path;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::Result;
use crate::execution::statement;
use crate::storage::csv::{CsvWarning, WarningLog};
use crate::storage::StorageEngine;
use crate::value::{LogicalType, Scalar};

/// An open database handle: owns the catalog, the storage engine, and the
/// connection-shared warnings log. Cheap to share across connections via
/// `&Database`; all mutation happens behind the catalog/storage locks so
/// `Database` itself never needs `&mut self` once opened.
pub struct Database {
    config: Config,
    catalog: RwLock<Catalog>,
    storage: RwLock<StorageEngine>,
    warnings: WarningLog,
}

impl Database {
    /// Opens (or creates) a database rooted at `path`, replaying its
    /// write-ahead log before accepting connections.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Config::load()?;
        config.storage.data_dir = path.as_ref().to_path_buf();
        Self::with_config(config)
    }

    /// An ephemeral, in-process-only database: nothing is written to disk,
    /// and its contents disappear once the handle is dropped.
    pub fn in_memory() -> Result<Self> {
        Self::with_config(Config::in_memory())
    }

    fn with_config(config: Config) -> Result<Self> {
        tracing::info!(data_dir = %config.storage.data_dir.display(), "opening database");
        let storage = StorageEngine::open(&config)?;
        Ok(Database {
            config,
            catalog: RwLock::new(Catalog::new()),
            storage: RwLock::new(storage),
            warnings: WarningLog::default(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// A handle through which queries run against a [`Database`]. Connections
/// are cheap — they carry no state of their own beyond the database
/// reference — and are safe to open one per logical unit of work.
pub struct Connection<'a> {
    db: &'a Database,
}

impl<'a> Connection<'a> {
    pub fn new(db: &'a Database) -> Self {
        Connection { db }
    }

    /// Parses, binds, plans, and executes `text`, returning every tuple the
    /// final `RETURN`/`WITH` clause projects (or a single informational row
    /// for DDL/`COPY` statements).
    pub fn query(&self, text: &str) -> Result<QueryResult> {
        let start = Instant::now();
        let parsed = parser::parse(text)?;
        tracing::debug!(statement = ?parsed, "parsed statement");
        let output = statement::execute(
            &parsed,
            &self.db.catalog,
            &self.db.storage,
            &self.db.config,
            &self.db.warnings,
        )?;
        Ok(QueryResult {
            columns: output.columns,
            rows: output.rows,
            warnings: output.warnings,
            duration: start.elapsed(),
        })
    }

    /// Every CSV-ingestion warning accumulated by any `COPY FROM` this
    /// connection's database has run, the backing data for `CALL
    /// SHOW_WARNINGS()`.
    pub fn show_warnings(&self) -> Vec<CsvWarning> {
        self.db.warnings.snapshot()
    }
}

/// The result of one [`Connection::query`] call: column shape, tuples, any
/// CSV conversion warnings folded in from a `COPY FROM` in the same
/// statement, and how long the whole pipeline took.
pub struct QueryResult {
    columns: Vec<(String, LogicalType)>,
    rows: Vec<Vec<Scalar>>,
    warnings: Vec<CsvWarning>,
    duration: Duration,
}

impl QueryResult {
    pub fn num_tuples(&self) -> usize {
        self.rows.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn column_types(&self) -> impl Iterator<Item = &LogicalType> {
        self.columns.iter().map(|(_, ty)| ty)
    }

    pub fn columns(&self) -> &[(String, LogicalType)] {
        &self.columns
    }

    /// Iterates over every tuple as a flat `&[Scalar]` row, in column order.
    pub fn tuples(&self) -> impl Iterator<Item = &[Scalar]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &CsvWarning> {
        self.warnings.iter()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_copy_query_round_trip_through_the_public_api() {
        let db = Database::in_memory().unwrap();
        let conn = Connection::new(&db);

        conn.query("CREATE NODE TABLE person(id INT64, age INT64, PRIMARY KEY(id))").unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        use std::io::Write;
        writeln!(file, "1,30").unwrap();
        writeln!(file, "2,40").unwrap();
        conn.query(&format!("COPY person FROM \"{}\"", file.path().to_str().unwrap())).unwrap();

        let result = conn.query("MATCH (a:person) RETURN a.age AS age;").unwrap();
        assert_eq!(result.num_tuples(), 2);
        assert_eq!(result.column_names().collect::<Vec<_>>(), vec!["age"]);
    }

    #[test]
    fn unknown_label_produces_a_binder_error() {
        let db = Database::in_memory().unwrap();
        let conn = Connection::new(&db);
        let err = conn.query("MATCH (a:PERSON) RETURN a;").unwrap_err();
        assert!(err.to_string().contains("Node label PERSON does not exist"));
    }
}
