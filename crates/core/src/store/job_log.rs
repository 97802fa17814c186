//! Last-run bookkeeping for scheduled jobs.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use super::{Database, StoreError};

/// Store for the `job_log` table, one row per job name.
#[derive(Clone)]
pub struct JobLogStore {
    db: Database,
}

impl JobLogStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn last_run(&self, name: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        let conn = self.db.lock();
        let ts: Option<String> = conn
            .query_row("SELECT last_run FROM job_log WHERE name = ?", [name], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(ts.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        }))
    }

    pub fn set_last_run(&self, name: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        let conn = self.db.lock();
        conn.execute(
            "INSERT INTO job_log (name, last_run) VALUES (?, ?)
             ON CONFLICT (name) DO UPDATE SET last_run = excluded.last_run",
            params![name, at.to_rfc3339()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_job_has_no_last_run() {
        let s = JobLogStore::new(Database::in_memory().unwrap());
        assert!(s.last_run("rss").unwrap().is_none());
    }

    #[test]
    fn test_set_and_get_roundtrip() {
        let s = JobLogStore::new(Database::in_memory().unwrap());
        let at = Utc::now();
        s.set_last_run("rss", at).unwrap();
        let stored = s.last_run("rss").unwrap().unwrap();
        assert!((stored - at).num_seconds().abs() < 1);
    }

    #[test]
    fn test_upsert_overwrites() {
        let s = JobLogStore::new(Database::in_memory().unwrap());
        let first = Utc::now() - chrono::Duration::hours(1);
        let second = Utc::now();
        s.set_last_run("search", first).unwrap();
        s.set_last_run("search", second).unwrap();
        let stored = s.last_run("search").unwrap().unwrap();
        assert!((stored - second).num_seconds().abs() < 1);
    }
}
