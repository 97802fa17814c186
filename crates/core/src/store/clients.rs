//! Client-held torrent persistence.
//!
//! One row per `(info_hash, client_host)`: which client holds which torrent
//! and under which trackers. The conflict resolver reads incumbents from
//! here and deletes rows only after all owning clients confirmed removal.

use rusqlite::params;

use super::{trackers_from_json, trackers_to_json, Database, StoreError};

/// A torrent held by one client.
#[derive(Debug, Clone)]
pub struct ClientSearcheeRow {
    pub info_hash: String,
    pub client_host: String,
    pub trackers: Vec<String>,
    pub private: Option<bool>,
}

/// Store for the `client_searchee` table.
#[derive(Clone)]
pub struct ClientSearcheeStore {
    db: Database,
}

impl ClientSearcheeStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn upsert(
        &self,
        info_hash: &str,
        client_host: &str,
        trackers: &[String],
        private: Option<bool>,
    ) -> Result<(), StoreError> {
        let conn = self.db.lock();
        conn.execute(
            "INSERT INTO client_searchee (info_hash, client_host, trackers, private)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (info_hash, client_host) DO UPDATE SET
                 trackers = excluded.trackers,
                 private = excluded.private",
            params![
                info_hash.to_lowercase(),
                client_host,
                trackers_to_json(trackers),
                private.map(|p| p as i64)
            ],
        )?;
        Ok(())
    }

    /// All rows holding the given info-hash.
    pub fn rows_for_hash(&self, info_hash: &str) -> Result<Vec<ClientSearcheeRow>, StoreError> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare(
            "SELECT info_hash, client_host, trackers, private
             FROM client_searchee WHERE info_hash = ?",
        )?;
        let rows = stmt.query_map([info_hash.to_lowercase()], |row| {
            Ok(ClientSearcheeRow {
                info_hash: row.get(0)?,
                client_host: row.get(1)?,
                trackers: trackers_from_json(&row.get::<_, String>(2)?).unwrap_or_default(),
                private: row.get::<_, Option<i64>>(3)?.map(|p| p != 0),
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn has_hash(&self, info_hash: &str) -> Result<bool, StoreError> {
        let conn = self.db.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM client_searchee WHERE info_hash = ?",
            [info_hash.to_lowercase()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Delete every row for a hash, after eviction completed.
    pub fn delete_by_hash(&self, info_hash: &str) -> Result<usize, StoreError> {
        let conn = self.db.lock();
        let n = conn.execute(
            "DELETE FROM client_searchee WHERE info_hash = ?",
            [info_hash.to_lowercase()],
        )?;
        Ok(n)
    }

    /// Every tracker known to any client, for the rule editor options.
    pub fn known_trackers(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare("SELECT trackers FROM client_searchee")?;
        let mut all: Vec<String> = Vec::new();
        for json in stmt.query_map([], |row| row.get::<_, String>(0))? {
            all.extend(trackers_from_json(&json?)?);
        }
        Ok(crate::model::normalize_tracker_set(
            all.iter().map(|s| s.as_str()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ClientSearcheeStore {
        ClientSearcheeStore::new(Database::in_memory().unwrap())
    }

    #[test]
    fn test_upsert_and_lookup() {
        let s = store();
        let hash = "a".repeat(40);
        s.upsert(&hash, "qbit.local", &["t.example".to_string()], Some(true))
            .unwrap();
        s.upsert(&hash, "deluge.local", &["u.example".to_string()], None)
            .unwrap();

        let rows = s.rows_for_hash(&hash).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(s.has_hash(&hash).unwrap());
        assert!(!s.has_hash(&"b".repeat(40)).unwrap());
    }

    #[test]
    fn test_upsert_replaces_trackers() {
        let s = store();
        let hash = "a".repeat(40);
        s.upsert(&hash, "qbit.local", &["t.example".to_string()], Some(true))
            .unwrap();
        s.upsert(&hash, "qbit.local", &["v.example".to_string()], Some(true))
            .unwrap();
        let rows = s.rows_for_hash(&hash).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].trackers, vec!["v.example"]);
    }

    #[test]
    fn test_hash_case_insensitive() {
        let s = store();
        let hash = "AbCd".repeat(10);
        s.upsert(&hash, "qbit.local", &[], None).unwrap();
        assert!(s.has_hash(&hash.to_lowercase()).unwrap());
    }

    #[test]
    fn test_delete_by_hash() {
        let s = store();
        let hash = "a".repeat(40);
        s.upsert(&hash, "qbit.local", &[], None).unwrap();
        s.upsert(&hash, "deluge.local", &[], None).unwrap();
        assert_eq!(s.delete_by_hash(&hash).unwrap(), 2);
        assert!(!s.has_hash(&hash).unwrap());
    }

    #[test]
    fn test_known_trackers() {
        let s = store();
        s.upsert(&"a".repeat(40), "h1", &["B.example".to_string()], None)
            .unwrap();
        s.upsert(&"b".repeat(40), "h2", &["a.example".to_string(), "b.example".to_string()], None)
            .unwrap();
        assert_eq!(s.known_trackers().unwrap(), vec!["a.example", "b.example"]);
    }
}
