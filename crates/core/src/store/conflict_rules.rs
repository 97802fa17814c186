//! Conflict-rule persistence.
//!
//! Rules form an ordered priority band (priority 1 is highest). Saving
//! replaces the whole set atomically and renumbers priorities to a
//! contiguous `1..=N`. A non-empty set always ends with an `all_indexers`
//! catch-all unless the operator's first (and then only) rule is itself
//! `all_indexers`.

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};

use super::{trackers_from_json, trackers_to_json, Database, StoreError};

/// A stored conflict rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictRule {
    pub id: i64,
    /// 1 is the highest priority; contiguous across the set.
    pub priority: u32,
    /// Matches any tracker currently configured as an indexer.
    pub all_indexers: bool,
    /// Normalized tracker hostnames this rule covers.
    pub trackers: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Operator input for one rule; priorities are assigned by position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictRuleInput {
    #[serde(default)]
    pub all_indexers: bool,
    #[serde(default)]
    pub trackers: Vec<String>,
}

/// Store for the `conflict_rules` table.
#[derive(Clone)]
pub struct ConflictRuleStore {
    db: Database,
}

impl ConflictRuleStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Active rules ordered by priority ascending.
    pub fn get_rules(&self) -> Result<Vec<ConflictRule>, StoreError> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare(
            "SELECT id, priority, all_indexers, trackers, created_at, updated_at
             FROM conflict_rules ORDER BY priority ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ConflictRule {
                id: row.get(0)?,
                priority: row.get(1)?,
                all_indexers: row.get::<_, i64>(2)? != 0,
                trackers: trackers_from_json(&row.get::<_, String>(3)?).unwrap_or_default(),
                created_at: parse_ts(&row.get::<_, String>(4)?),
                updated_at: parse_ts(&row.get::<_, String>(5)?),
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Replace the entire rule set atomically.
    ///
    /// Validation:
    /// - a rule without `all_indexers` must name at least one tracker;
    /// - `all_indexers` is only allowed as the first rule (then the set must
    ///   be that single rule) or as the trailing catch-all;
    /// - when no trailing catch-all is supplied, one is appended.
    ///
    /// Saving the same input twice yields the same stored set.
    pub fn save_rules(
        &self,
        inputs: &[ConflictRuleInput],
    ) -> Result<Vec<ConflictRule>, StoreError> {
        let last = inputs.len().saturating_sub(1);
        for (i, rule) in inputs.iter().enumerate() {
            if rule.all_indexers {
                if i == 0 && inputs.len() > 1 {
                    return Err(StoreError::MisplacedAllIndexersRule);
                }
                if i != 0 && i != last {
                    return Err(StoreError::MisplacedAllIndexersRule);
                }
            } else if rule.trackers.iter().all(|t| t.trim().is_empty()) {
                return Err(StoreError::EmptyRule { position: i + 1 });
            }
        }

        let mut effective: Vec<ConflictRuleInput> = inputs.to_vec();
        let needs_catch_all = !effective.is_empty()
            && !effective.first().map(|r| r.all_indexers).unwrap_or(false)
            && !effective.last().map(|r| r.all_indexers).unwrap_or(false);
        if needs_catch_all {
            effective.push(ConflictRuleInput {
                all_indexers: true,
                trackers: Vec::new(),
            });
        }

        let mut conn = self.db.lock();
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();
        tx.execute("DELETE FROM conflict_rules", [])?;
        for (i, rule) in effective.iter().enumerate() {
            tx.execute(
                "INSERT INTO conflict_rules (priority, all_indexers, trackers, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    (i + 1) as u32,
                    rule.all_indexers as i64,
                    trackers_to_json(&rule.trackers),
                    now,
                    now
                ],
            )?;
        }
        tx.commit()?;
        drop(conn);

        self.get_rules()
    }
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ConflictRuleStore {
        ConflictRuleStore::new(Database::in_memory().unwrap())
    }

    fn rule(trackers: &[&str]) -> ConflictRuleInput {
        ConflictRuleInput {
            all_indexers: false,
            trackers: trackers.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn all_indexers() -> ConflictRuleInput {
        ConflictRuleInput {
            all_indexers: true,
            trackers: Vec::new(),
        }
    }

    #[test]
    fn test_save_appends_catch_all() {
        let s = store();
        let saved = s.save_rules(&[rule(&["a.example"])]).unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].priority, 1);
        assert_eq!(saved[0].trackers, vec!["a.example"]);
        assert!(!saved[0].all_indexers);
        assert_eq!(saved[1].priority, 2);
        assert!(saved[1].all_indexers);
    }

    #[test]
    fn test_save_is_idempotent() {
        let s = store();
        let first = s
            .save_rules(&[rule(&["a.example"]), rule(&["b.example"])])
            .unwrap();
        let second = s
            .save_rules(&[rule(&["a.example"]), rule(&["b.example"])])
            .unwrap();
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.priority, b.priority);
            assert_eq!(a.all_indexers, b.all_indexers);
            assert_eq!(a.trackers, b.trackers);
        }
    }

    #[test]
    fn test_priorities_contiguous() {
        let s = store();
        let saved = s
            .save_rules(&[rule(&["a.example"]), rule(&["b.example"]), rule(&["c.example"])])
            .unwrap();
        let priorities: Vec<u32> = saved.iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_first_rule_all_indexers_forces_single() {
        let s = store();
        let saved = s.save_rules(&[all_indexers()]).unwrap();
        assert_eq!(saved.len(), 1);
        assert!(saved[0].all_indexers);

        let err = s
            .save_rules(&[all_indexers(), rule(&["a.example"])])
            .unwrap_err();
        assert!(matches!(err, StoreError::MisplacedAllIndexersRule));
    }

    #[test]
    fn test_all_indexers_only_first_or_last() {
        let s = store();
        let err = s
            .save_rules(&[rule(&["a.example"]), all_indexers(), rule(&["b.example"])])
            .unwrap_err();
        assert!(matches!(err, StoreError::MisplacedAllIndexersRule));

        // Explicit trailing catch-all is accepted and not duplicated.
        let saved = s
            .save_rules(&[rule(&["a.example"]), all_indexers()])
            .unwrap();
        assert_eq!(saved.len(), 2);
    }

    #[test]
    fn test_empty_rule_rejected() {
        let s = store();
        let err = s.save_rules(&[rule(&[])]).unwrap_err();
        assert!(matches!(err, StoreError::EmptyRule { position: 1 }));
        let err = s
            .save_rules(&[rule(&["a.example"]), rule(&["  "])])
            .unwrap_err();
        assert!(matches!(err, StoreError::EmptyRule { position: 2 }));
    }

    #[test]
    fn test_empty_set_clears_without_catch_all() {
        let s = store();
        s.save_rules(&[rule(&["a.example"])]).unwrap();
        let saved = s.save_rules(&[]).unwrap();
        assert!(saved.is_empty());
    }

    #[test]
    fn test_tracker_normalization_on_save() {
        let s = store();
        let saved = s
            .save_rules(&[rule(&["B.Example ", "a.example", "b.example"])])
            .unwrap();
        assert_eq!(saved[0].trackers, vec!["a.example", "b.example"]);
    }
}
