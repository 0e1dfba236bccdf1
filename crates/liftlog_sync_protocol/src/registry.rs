//! Explicitly injected registry of syncable tables.

use std::collections::BTreeSet;

/// Column names carrying epoch-millisecond timestamps on the wire.
pub const TIMESTAMP_FIELDS: &[&str] = &[
    "createdAt",
    "updatedAt",
    "deletedAt",
    "startedAt",
    "finishedAt",
];

/// The set of tables participating in sync.
///
/// Push/pull entry points take a registry explicitly, keeping the engine
/// agnostic of any concrete storage schema and testable with fakes. Every
/// registered table is assumed to carry the fixed replication columns
/// (`id`, `userId`, `updatedAt`, `deletedAt`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRegistry {
    tables: BTreeSet<String>,
}

impl TableRegistry {
    /// Builds a registry from table names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tables: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The registry for the workout-log schema.
    pub fn workout_log() -> Self {
        Self::new([
            "workouts",
            "exercises",
            "setTemplates",
            "sessions",
            "loggedExercises",
            "loggedSets",
            "metricDefinitions",
            "metricEntries",
        ])
    }

    /// Returns true if `table` is syncable.
    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains(table)
    }

    /// Iterates table names in a stable order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(String::as_str)
    }

    /// Number of registered tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if no tables are registered.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workout_log_tables() {
        let registry = TableRegistry::workout_log();
        assert_eq!(registry.len(), 8);
        assert!(registry.contains("workouts"));
        assert!(registry.contains("loggedSets"));
        assert!(!registry.contains("_sync_queue"));
        assert!(!registry.contains("unknownTable"));
    }

    #[test]
    fn custom_registry() {
        let registry = TableRegistry::new(["notes", "tags"]);
        assert!(registry.contains("notes"));
        assert!(!registry.contains("workouts"));

        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["notes", "tags"]);
    }

    #[test]
    fn empty_registry() {
        let registry = TableRegistry::default();
        assert!(registry.is_empty());
        assert!(!registry.contains("workouts"));
    }
}
