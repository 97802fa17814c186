//! Indexer tracker-set persistence.
//!
//! Each configured indexer accumulates the announce hosts observed in
//! torrents snatched from it. The union feeds `all_indexers` conflict-rule
//! matching, so the merge is append-only.

use rusqlite::params;

use super::{trackers_from_json, trackers_to_json, Database, StoreError};

/// Store for the `indexer` table.
#[derive(Clone)]
pub struct IndexerStore {
    db: Database,
}

impl IndexerStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Register an indexer and return its id.
    pub fn add(&self, url: &str) -> Result<i64, StoreError> {
        let conn = self.db.lock();
        conn.execute(
            "INSERT INTO indexer (url, trackers) VALUES (?, '[]')",
            [url],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// The persisted tracker set of one indexer.
    pub fn trackers(&self, indexer_id: i64) -> Result<Vec<String>, StoreError> {
        let conn = self.db.lock();
        let json: String = conn
            .query_row(
                "SELECT trackers FROM indexer WHERE id = ?",
                [indexer_id],
                |row| row.get(0),
            )
            .map_err(|_| StoreError::NotFound(format!("indexer {}", indexer_id)))?;
        trackers_from_json(&json)
    }

    /// Merge observed announce hosts into an indexer's tracker set.
    ///
    /// Append-only union; hosts never leave the set.
    pub fn merge_trackers(&self, indexer_id: i64, observed: &[String]) -> Result<(), StoreError> {
        let conn = self.db.lock();
        let json: String = conn
            .query_row(
                "SELECT trackers FROM indexer WHERE id = ?",
                [indexer_id],
                |row| row.get(0),
            )
            .map_err(|_| StoreError::NotFound(format!("indexer {}", indexer_id)))?;
        let mut merged = trackers_from_json(&json)?;
        merged.extend(observed.iter().cloned());
        conn.execute(
            "UPDATE indexer SET trackers = ? WHERE id = ?",
            params![trackers_to_json(&merged), indexer_id],
        )?;
        Ok(())
    }

    /// The union of every indexer's tracker set, for `all_indexers` rules.
    pub fn all_trackers(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare("SELECT trackers FROM indexer")?;
        let mut all: Vec<String> = Vec::new();
        for json in stmt.query_map([], |row| row.get::<_, String>(0))? {
            all.extend(trackers_from_json(&json?)?);
        }
        Ok(crate::model::normalize_tracker_set(
            all.iter().map(|s| s.as_str()),
        ))
    }
}
