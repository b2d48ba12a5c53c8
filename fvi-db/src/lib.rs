//! SQLite persistence for farm statistics batches.
//!
//! `Database` wraps a single connection behind `Rc<RefCell<_>>`. It stores
//! the parcels and the four statistics tables of each batch and answers
//! regional roll-up queries derived on the fly with SQL `GROUP BY`.
//!
//! # Usage
//!
//! ```rust,no_run
//! use fvi_db::Database;
//!
//! let db = Database::open("farms.sqlite").unwrap();
//! let summary = db.query_regional_summary("Nakuru").unwrap();
//! println!("{} farm-year(s)", summary.moisture_breakdown.len());
//! ```
//!
//! # Tables
//!
//! See [`schema::create_schema`] for the full SQL schema.

pub mod schema;
mod loader;
mod queries;
pub mod models;

use anyhow::Context;
use fvi_batch::TableSink;
use fvi_series::ParcelRef;
use fvi_stats::FarmStatsTables;
use rusqlite::Connection;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// SQLite database holding persisted batch results.
///
/// Cheaply cloneable; clones share the same connection.
#[derive(Clone)]
pub struct Database {
    conn: Rc<RefCell<Connection>>,
}

impl Database {
    /// Create a new in-memory database with the full schema applied.
    pub fn new() -> anyhow::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Open (or create) a database file and apply the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("opening database {}", path.display()))?;
        log::info!("opened database {}", path.display());
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(schema::create_schema())?;
        Ok(Self {
            conn: Rc::new(RefCell::new(conn)),
        })
    }
}

impl TableSink for Database {
    fn write_batch(&self, parcels: &[ParcelRef], tables: &FarmStatsTables) -> anyhow::Result<()> {
        self.insert_batch(parcels, tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_creates_successfully() {
        assert!(Database::new().is_ok(), "Database should create without errors");
    }

    #[test]
    fn database_starts_empty() {
        let db = Database::new().unwrap();
        assert!(db.query_parcels().unwrap().is_empty());
        assert!(db.query_regions().unwrap().is_empty());
    }

    #[test]
    fn database_is_cloneable() {
        let db = Database::new().unwrap();
        let db2 = db.clone();
        db.insert_batch(&[loader::tests::parcel("farm-1", Some("Nakuru"))], &FarmStatsTables::default())
            .unwrap();
        assert_eq!(db2.query_parcels().unwrap().len(), 1, "Clone should see same data via shared Rc");
    }

    #[test]
    fn file_database_persists_between_handles() {
        let path = std::env::temp_dir().join(format!("fvi-db-test-{}.sqlite", std::process::id()));
        let _ = std::fs::remove_file(&path);
        {
            let db = Database::open(&path).unwrap();
            db.insert_batch(&[loader::tests::parcel("farm-1", None)], &FarmStatsTables::default())
                .unwrap();
        }
        let reopened = Database::open(&path).unwrap();
        assert_eq!(reopened.query_parcels().unwrap().len(), 1);
        drop(reopened);
        let _ = std::fs::remove_file(&path);
    }
}
