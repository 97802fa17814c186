//! Decision and collision persistence.
//!
//! Decision rows are keyed by `(searchee_id, guid)` and refreshed on every
//! reassessment. Collision rows hang 1:1 off a decision row and only exist
//! for private cross-tracker collisions; both tables are always written
//! inside one transaction so they cannot drift apart.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Transaction};

use super::{trackers_from_json, trackers_to_json, Database, StoreError};
use crate::decide::Decision;

/// A persisted decision row, joined with its searchee name.
#[derive(Debug, Clone)]
pub struct DecisionRow {
    pub id: i64,
    pub searchee_id: i64,
    pub searchee_name: String,
    pub guid: String,
    pub info_hash: Option<String>,
    pub decision: Decision,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub fuzzy_size_factor: f64,
}

/// Tracker payloads recorded alongside a cross-tracker collision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionPayload {
    pub candidate_trackers: Vec<String>,
    pub known_trackers: Vec<String>,
}

/// A persisted collision row.
#[derive(Debug, Clone)]
pub struct CollisionRow {
    pub decision_id: i64,
    pub candidate_trackers: Vec<String>,
    pub known_trackers: Vec<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A collision whose incumbent is no longer present in any client.
#[derive(Debug, Clone)]
pub struct StaleCollision {
    pub decision_id: i64,
    pub searchee_name: String,
}

/// Store for the `decision` and `collisions` tables.
#[derive(Clone)]
pub struct DecisionStore {
    db: Database,
}

impl DecisionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Look up (or create) the searchee row for a title.
    pub fn ensure_searchee(&self, name: &str) -> Result<i64, StoreError> {
        let conn = self.db.lock();
        conn.execute("INSERT OR IGNORE INTO searchee (name) VALUES (?)", [name])?;
        let id = conn.query_row("SELECT id FROM searchee WHERE name = ?", [name], |row| {
            row.get(0)
        })?;
        Ok(id)
    }

    /// Fetch the decision row for `(searchee, guid)`, if one exists.
    pub fn get(&self, searchee_name: &str, guid: &str) -> Result<Option<DecisionRow>, StoreError> {
        let conn = self.db.lock();
        conn.query_row(
            "SELECT d.id, d.searchee_id, s.name, d.guid, d.info_hash, d.decision,
                    d.first_seen, d.last_seen, d.fuzzy_size_factor
             FROM decision d JOIN searchee s ON s.id = d.searchee_id
             WHERE s.name = ? AND d.guid = ?",
            params![searchee_name, guid],
            row_to_decision,
        )
        .optional()
        .map_err(StoreError::from)
    }

    /// Record one assessment for `(searchee, guid)`.
    ///
    /// Upserts the decision row (first_seen preserved, last_seen advanced)
    /// and, in the same transaction, upserts or deletes the collision row.
    /// A `Some` collision payload means the assessment was a private
    /// cross-tracker collision; `None` clears any stale collision row.
    ///
    /// Returns the decision row id.
    pub fn record_assessment(
        &self,
        searchee_name: &str,
        guid: &str,
        info_hash: Option<&str>,
        decision: Decision,
        fuzzy_size_factor: f64,
        collision: Option<&CollisionPayload>,
    ) -> Result<i64, StoreError> {
        let mut conn = self.db.lock();
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        tx.execute(
            "INSERT OR IGNORE INTO searchee (name) VALUES (?)",
            [searchee_name],
        )?;
        let searchee_id: i64 =
            tx.query_row("SELECT id FROM searchee WHERE name = ?", [searchee_name], |row| {
                row.get(0)
            })?;

        // Upsert by (searchee_id, guid). A reassessment keeps the previously
        // snatched info-hash unless this assessment produced a fresh one.
        tx.execute(
            "INSERT INTO decision
                 (searchee_id, guid, info_hash, decision, first_seen, last_seen, fuzzy_size_factor)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (searchee_id, guid) DO UPDATE SET
                 info_hash = COALESCE(excluded.info_hash, decision.info_hash),
                 decision = excluded.decision,
                 last_seen = excluded.last_seen,
                 fuzzy_size_factor = excluded.fuzzy_size_factor",
            params![
                searchee_id,
                guid,
                info_hash,
                decision.as_str(),
                now,
                now,
                fuzzy_size_factor
            ],
        )?;
        let decision_id: i64 = tx.query_row(
            "SELECT id FROM decision WHERE searchee_id = ? AND guid = ?",
            params![searchee_id, guid],
            |row| row.get(0),
        )?;

        match collision {
            Some(payload) => {
                Self::upsert_collision_tx(&tx, decision_id, searchee_name, payload, &now)?
            }
            None => {
                tx.execute("DELETE FROM collisions WHERE decision_id = ?", [decision_id])?;
            }
        }

        tx.commit()?;
        Ok(decision_id)
    }

    /// Collision upsert with duplicate coalescing.
    ///
    /// A torrent re-announced under a new guid produces a second decision
    /// row for the same content. When another decision row already carries a
    /// semantically equivalent collision (same info-hash, searchee name and
    /// tracker payloads), that row is refreshed and this decision's row is
    /// dropped instead of duplicated.
    fn upsert_collision_tx(
        tx: &Transaction<'_>,
        decision_id: i64,
        searchee_name: &str,
        payload: &CollisionPayload,
        now: &str,
    ) -> Result<(), StoreError> {
        let candidate_json = trackers_to_json(&payload.candidate_trackers);
        let known_json = trackers_to_json(&payload.known_trackers);

        let equivalent: Option<i64> = tx
            .query_row(
                "SELECT c.decision_id
                 FROM collisions c
                 JOIN decision d ON d.id = c.decision_id
                 JOIN decision mine ON mine.id = ?1
                 JOIN searchee s ON s.id = d.searchee_id
                 WHERE c.decision_id != ?1
                   AND d.info_hash IS mine.info_hash
                   AND s.name = ?2
                   AND c.candidate_trackers = ?3
                   AND c.known_trackers = ?4",
                params![decision_id, searchee_name, candidate_json, known_json],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(other_id) = equivalent {
            tx.execute(
                "UPDATE collisions SET last_seen = ?, updated_at = ? WHERE decision_id = ?",
                params![now, now, other_id],
            )?;
            tx.execute("DELETE FROM collisions WHERE decision_id = ?", [decision_id])?;
            return Ok(());
        }

        tx.execute(
            "INSERT INTO collisions
                 (decision_id, candidate_trackers, known_trackers, first_seen, last_seen, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (decision_id) DO UPDATE SET
                 candidate_trackers = excluded.candidate_trackers,
                 known_trackers = excluded.known_trackers,
                 last_seen = excluded.last_seen,
                 updated_at = excluded.updated_at",
            params![decision_id, candidate_json, known_json, now, now, now],
        )?;
        Ok(())
    }

    /// Fetch the collision row for a decision, if any.
    pub fn collision(&self, decision_id: i64) -> Result<Option<CollisionRow>, StoreError> {
        let conn = self.db.lock();
        conn.query_row(
            "SELECT decision_id, candidate_trackers, known_trackers, first_seen, last_seen, updated_at
             FROM collisions WHERE decision_id = ?",
            [decision_id],
            row_to_collision,
        )
        .optional()
        .map_err(StoreError::from)
    }

    /// Delete the collision row for a decision.
    pub fn delete_collision(&self, decision_id: i64) -> Result<(), StoreError> {
        let conn = self.db.lock();
        conn.execute("DELETE FROM collisions WHERE decision_id = ?", [decision_id])?;
        Ok(())
    }

    /// Decision listing for the operator surface, most recent first.
    pub fn list(&self, limit: i64, offset: i64) -> Result<Vec<DecisionRow>, StoreError> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare(
            "SELECT d.id, d.searchee_id, s.name, d.guid, d.info_hash, d.decision,
                    d.first_seen, d.last_seen, d.fuzzy_size_factor
             FROM decision d JOIN searchee s ON s.id = d.searchee_id
             ORDER BY d.last_seen DESC, d.id DESC LIMIT ? OFFSET ?",
        )?;
        let rows = stmt.query_map(params![limit, offset], row_to_decision)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn count(&self) -> Result<i64, StoreError> {
        let conn = self.db.lock();
        conn.query_row("SELECT COUNT(*) FROM decision", [], |row| row.get(0))
            .map_err(StoreError::from)
    }

    /// Collision listing joined with decision context, most recent first.
    pub fn list_collisions(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<(CollisionRow, DecisionRow)>, StoreError> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare(
            "SELECT c.decision_id, c.candidate_trackers, c.known_trackers,
                    c.first_seen, c.last_seen, c.updated_at,
                    d.id, d.searchee_id, s.name, d.guid, d.info_hash, d.decision,
                    d.first_seen, d.last_seen, d.fuzzy_size_factor
             FROM collisions c
             JOIN decision d ON d.id = c.decision_id
             JOIN searchee s ON s.id = d.searchee_id
             ORDER BY c.last_seen DESC LIMIT ? OFFSET ?",
        )?;
        let rows = stmt.query_map(params![limit, offset], |row| {
            let collision = CollisionRow {
                decision_id: row.get(0)?,
                candidate_trackers: trackers_from_json(&row.get::<_, String>(1)?)
                    .unwrap_or_default(),
                known_trackers: trackers_from_json(&row.get::<_, String>(2)?).unwrap_or_default(),
                first_seen: parse_ts(&row.get::<_, String>(3)?),
                last_seen: parse_ts(&row.get::<_, String>(4)?),
                updated_at: parse_ts(&row.get::<_, String>(5)?),
            };
            let decision = DecisionRow {
                id: row.get(6)?,
                searchee_id: row.get(7)?,
                searchee_name: row.get(8)?,
                guid: row.get(9)?,
                info_hash: row.get(10)?,
                decision: Decision::parse(&row.get::<_, String>(11)?)
                    .unwrap_or(Decision::DownloadFailed),
                first_seen: parse_ts(&row.get::<_, String>(12)?),
                last_seen: parse_ts(&row.get::<_, String>(13)?),
                fuzzy_size_factor: row.get(14)?,
            };
            Ok((collision, decision))
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Distinct searchee names and trackers appearing in collisions, for the
    /// operator filter dropdowns.
    pub fn collision_filters(&self) -> Result<(Vec<String>, Vec<String>), StoreError> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT s.name FROM collisions c
             JOIN decision d ON d.id = c.decision_id
             JOIN searchee s ON s.id = d.searchee_id
             ORDER BY s.name",
        )?;
        let names: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        let mut stmt = conn.prepare("SELECT candidate_trackers FROM collisions")?;
        let mut trackers: Vec<String> = Vec::new();
        for json in stmt.query_map([], |row| row.get::<_, String>(0))? {
            trackers.extend(trackers_from_json(&json?).unwrap_or_default());
        }
        let trackers = crate::model::normalize_tracker_set(trackers.iter().map(|s| s.as_str()));
        Ok((names, trackers))
    }

    /// Cross-tracker collisions whose incumbent is gone from every client.
    pub fn stale_cross_tracker_collisions(&self) -> Result<Vec<StaleCollision>, StoreError> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare(
            "SELECT c.decision_id, s.name
             FROM collisions c
             JOIN decision d ON d.id = c.decision_id
             JOIN searchee s ON s.id = d.searchee_id
             WHERE d.decision = ?
               AND d.info_hash IS NOT NULL
               AND NOT EXISTS (
                   SELECT 1 FROM client_searchee cs WHERE cs.info_hash = d.info_hash
               )",
        )?;
        let rows = stmt.query_map(
            [Decision::InfoHashAlreadyExistsAnotherTracker.as_str()],
            |row| {
                Ok(StaleCollision {
                    decision_id: row.get(0)?,
                    searchee_name: row.get(1)?,
                })
            },
        )?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Delete a batch of collision rows by decision id.
    pub fn delete_collisions(&self, decision_ids: &[i64]) -> Result<usize, StoreError> {
        let conn = self.db.lock();
        let mut deleted = 0;
        for id in decision_ids {
            deleted += conn.execute("DELETE FROM collisions WHERE decision_id = ?", [id])?;
        }
        Ok(deleted)
    }

    /// All `(guid, info_hash)` pairs with a snatched hash, for rebuilding the
    /// in-memory correlation map at startup.
    pub fn guid_info_hash_pairs(&self) -> Result<Vec<(String, String)>, StoreError> {
        let conn = self.db.lock();
        let mut stmt =
            conn.prepare("SELECT guid, info_hash FROM decision WHERE info_hash IS NOT NULL")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Distinct info-hashes referenced by any decision row. The cleanup job
    /// removes cache files not in this set.
    pub fn referenced_info_hashes(&self) -> Result<HashSet<String>, StoreError> {
        let conn = self.db.lock();
        let mut stmt =
            conn.prepare("SELECT DISTINCT info_hash FROM decision WHERE info_hash IS NOT NULL")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = HashSet::new();
        for row in rows {
            out.insert(row?);
        }
        Ok(out)
    }

    /// Drop decision rows not seen since the cutoff. Collisions cascade.
    pub fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let conn = self.db.lock();
        let n = conn.execute(
            "DELETE FROM decision WHERE last_seen < ?",
            [cutoff.to_rfc3339()],
        )?;
        Ok(n)
    }
}

fn row_to_decision(row: &rusqlite::Row) -> rusqlite::Result<DecisionRow> {
    Ok(DecisionRow {
        id: row.get(0)?,
        searchee_id: row.get(1)?,
        searchee_name: row.get(2)?,
        guid: row.get(3)?,
        info_hash: row.get(4)?,
        decision: Decision::parse(&row.get::<_, String>(5)?).unwrap_or(Decision::DownloadFailed),
        first_seen: parse_ts(&row.get::<_, String>(6)?),
        last_seen: parse_ts(&row.get::<_, String>(7)?),
        fuzzy_size_factor: row.get(8)?,
    })
}

fn row_to_collision(row: &rusqlite::Row) -> rusqlite::Result<CollisionRow> {
    Ok(CollisionRow {
        decision_id: row.get(0)?,
        candidate_trackers: trackers_from_json(&row.get::<_, String>(1)?).unwrap_or_default(),
        known_trackers: trackers_from_json(&row.get::<_, String>(2)?).unwrap_or_default(),
        first_seen: parse_ts(&row.get::<_, String>(3)?),
        last_seen: parse_ts(&row.get::<_, String>(4)?),
        updated_at: parse_ts(&row.get::<_, String>(5)?),
    })
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
