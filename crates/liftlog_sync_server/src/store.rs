//! Server-side record storage.
//!
//! Rows are keyed by `(user_id, record_id)` within each table, so every
//! read and write is user-scoped by construction. Foreign key rules are
//! declared per table and always resolve within the same user's data.

use std::collections::{BTreeMap, HashMap};

use liftlog_sync_protocol::Record;
use parking_lot::RwLock;

/// A declared reference from a child table's field to a parent table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRule {
    /// Field on the child row holding the parent id.
    pub field: String,
    /// Table the parent row lives in.
    pub parent_table: String,
}

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<String, BTreeMap<(String, String), Record>>,
}

/// In-memory, user-partitioned record store.
#[derive(Debug, Default)]
pub struct ServerStore {
    inner: RwLock<Tables>,
    foreign_keys: HashMap<String, Vec<ForeignKeyRule>>,
}

impl ServerStore {
    /// Creates an empty store with no foreign key rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with the workout-log schema's reference rules declared.
    pub fn workout_log() -> Self {
        Self::new()
            .with_foreign_key("sessions", "workoutId", "workouts")
            .with_foreign_key("setTemplates", "workoutId", "workouts")
            .with_foreign_key("setTemplates", "exerciseId", "exercises")
            .with_foreign_key("loggedExercises", "sessionId", "sessions")
            .with_foreign_key("loggedExercises", "exerciseId", "exercises")
            .with_foreign_key("loggedSets", "loggedExerciseId", "loggedExercises")
            .with_foreign_key("metricEntries", "metricDefinitionId", "metricDefinitions")
    }

    /// Declares that `table.field` references a row of `parent_table`.
    pub fn with_foreign_key(
        mut self,
        table: impl Into<String>,
        field: impl Into<String>,
        parent_table: impl Into<String>,
    ) -> Self {
        self.foreign_keys
            .entry(table.into())
            .or_default()
            .push(ForeignKeyRule {
                field: field.into(),
                parent_table: parent_table.into(),
            });
        self
    }

    /// The reference rules declared for `table`.
    pub fn foreign_keys(&self, table: &str) -> &[ForeignKeyRule] {
        self.foreign_keys
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Reads one row for one user.
    pub fn get(&self, table: &str, user_id: &str, id: &str) -> Option<Record> {
        let tables = self.inner.read();
        tables
            .rows
            .get(table)
            .and_then(|rows| rows.get(&(user_id.to_string(), id.to_string())))
            .cloned()
    }

    /// Returns true if the user owns a row with this id.
    pub fn contains(&self, table: &str, user_id: &str, id: &str) -> bool {
        self.get(table, user_id, id).is_some()
    }

    /// Inserts or replaces a row.
    pub fn upsert(&self, table: &str, record: Record) {
        let mut tables = self.inner.write();
        tables
            .rows
            .entry(table.to_string())
            .or_default()
            .insert((record.user_id.clone(), record.id.clone()), record);
    }

    /// All of a user's rows in `table` modified strictly after `cursor_ms`,
    /// tombstones included, in id order.
    pub fn changes_since(&self, table: &str, user_id: &str, cursor_ms: i64) -> Vec<Record> {
        let tables = self.inner.read();
        let Some(rows) = tables.rows.get(table) else {
            return Vec::new();
        };
        let user = user_id.to_string();
        rows.range((user.clone(), String::new())..)
            .take_while(|((owner, _), _)| *owner == user)
            .filter(|(_, record)| record.updated_at_ms() > cursor_ms)
            .map(|(_, record)| record.clone())
            .collect()
    }
}
