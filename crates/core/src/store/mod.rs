//! SQLite persistence layer.
//!
//! A single [`Database`] handle owns the connection; the per-table stores
//! ([`DecisionStore`], [`ConflictRuleStore`], [`IndexerStore`],
//! [`ClientSearcheeStore`], [`JobLogStore`]) share it so that writes touching
//! several tables (decision + collisions) run inside one transaction.

mod clients;
mod conflict_rules;
mod decisions;
mod indexers;
mod job_log;

pub use clients::{ClientSearcheeRow, ClientSearcheeStore};
pub use conflict_rules::{ConflictRule, ConflictRuleInput, ConflictRuleStore};
pub use decisions::{CollisionPayload, CollisionRow, DecisionRow, DecisionStore, StaleCollision};
pub use indexers::IndexerStore;
pub use job_log::JobLogStore;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use thiserror::Error;

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict rule {position} has no trackers")]
    EmptyRule { position: usize },

    #[error("Only the first conflict rule may match all indexers")]
    MisplacedAllIndexersRule,

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Shared handle to the SQLite database.
///
/// Cloning is cheap; all clones serialize access through one mutex.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file and bootstrap the schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory database, useful for testing.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS searchee (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS indexer (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT,
                trackers TEXT NOT NULL DEFAULT '[]'
            );

            CREATE TABLE IF NOT EXISTS decision (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                searchee_id INTEGER NOT NULL REFERENCES searchee(id) ON DELETE CASCADE,
                guid TEXT NOT NULL,
                info_hash TEXT,
                decision TEXT NOT NULL,
                first_seen TEXT NOT NULL,
                last_seen TEXT NOT NULL,
                fuzzy_size_factor REAL NOT NULL,
                UNIQUE (searchee_id, guid)
            );

            CREATE INDEX IF NOT EXISTS idx_decision_info_hash ON decision(info_hash);

            CREATE TABLE IF NOT EXISTS collisions (
                decision_id INTEGER PRIMARY KEY REFERENCES decision(id) ON DELETE CASCADE,
                candidate_trackers TEXT NOT NULL,
                known_trackers TEXT NOT NULL,
                first_seen TEXT NOT NULL,
                last_seen TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS conflict_rules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                priority INTEGER NOT NULL UNIQUE,
                all_indexers INTEGER NOT NULL DEFAULT 0,
                trackers TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS client_searchee (
                info_hash TEXT NOT NULL,
                client_host TEXT NOT NULL,
                name TEXT,
                trackers TEXT NOT NULL DEFAULT '[]',
                private INTEGER,
                PRIMARY KEY (info_hash, client_host)
            );

            CREATE INDEX IF NOT EXISTS idx_client_searchee_hash ON client_searchee(info_hash);

            CREATE TABLE IF NOT EXISTS job_log (
                name TEXT PRIMARY KEY,
                last_run TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }
}

/// Serialize a tracker set into its canonical JSON column form.
pub(crate) fn trackers_to_json(trackers: &[String]) -> String {
    let normalized = crate::model::normalize_tracker_set(trackers.iter().map(|s| s.as_str()));
    serde_json::to_string(&normalized).unwrap_or_else(|_| "[]".to_string())
}

/// Parse a tracker JSON column, validating it is a string array.
pub(crate) fn trackers_from_json(json: &str) -> Result<Vec<String>, StoreError> {
    let parsed: Vec<String> = serde_json::from_str(json)
        .map_err(|e| StoreError::Corrupt(format!("tracker column: {}", e)))?;
    Ok(crate::model::normalize_tracker_set(
        parsed.iter().map(|s| s.as_str()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_bootstrap() {
        let db = Database::in_memory().unwrap();
        // Schema bootstrap is idempotent.
        Database::initialize_schema(&db.lock()).unwrap();
    }

    #[test]
    fn test_file_backed_bootstrap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reseed.db");
        let db = Database::open(&path).unwrap();
        drop(db);
        assert!(path.exists());
        // Re-opening an existing file must succeed.
        Database::open(&path).unwrap();
    }

    #[test]
    fn test_trackers_json_roundtrip() {
        let json = trackers_to_json(&["B.example".to_string(), "a.example".to_string()]);
        assert_eq!(json, r#"["a.example","b.example"]"#);
        let parsed = trackers_from_json(&json).unwrap();
        assert_eq!(parsed, vec!["a.example", "b.example"]);
    }

    #[test]
    fn test_trackers_json_rejects_non_array() {
        assert!(trackers_from_json("{\"not\":\"an array\"}").is_err());
        assert!(trackers_from_json("nonsense").is_err());
    }
}
