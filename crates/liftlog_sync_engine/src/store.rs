//! Local storage abstraction.
//!
//! The engine never talks to a concrete database. It drives a [`LocalStore`]
//! that owns the syncable tables, the durable outbox and the sync metadata.
//! Local writes go through [`LocalStore::transaction`] so the data change and
//! its outbox entry commit or roll back together.

use chrono::{DateTime, Utc};
use liftlog_sync_protocol::{QueueEntry, Record};
use serde_json::{Map, Value};
use thiserror::Error;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by a local store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying backend failed.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Stored data could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Mutations available inside a local write transaction.
///
/// All operations in one transaction become durable atomically. Updating or
/// tombstoning an absent row is a no-op on the data side; the return value
/// reports whether the row existed.
pub trait StoreTxn {
    /// Inserts a full row.
    fn insert_record(&mut self, table: &str, record: Record) -> StoreResult<()>;

    /// Overwrites a subset of a row's fields and bumps its conflict
    /// timestamp. Returns false if the row does not exist.
    fn update_fields(
        &mut self,
        table: &str,
        id: &str,
        fields: &Map<String, Value>,
        at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Soft-deletes a row. Returns false if the row does not exist.
    fn tombstone(&mut self, table: &str, id: &str, at: DateTime<Utc>) -> StoreResult<bool>;

    /// Appends an entry to the durable outbox.
    fn enqueue(&mut self, entry: QueueEntry) -> StoreResult<()>;
}

/// Client-side storage for syncable tables, outbox and sync metadata.
pub trait LocalStore: Send + Sync {
    /// Runs `f` atomically: if it returns an error, every mutation it made
    /// is rolled back and the error is returned.
    fn transaction(
        &self,
        f: &mut dyn FnMut(&mut dyn StoreTxn) -> StoreResult<()>,
    ) -> StoreResult<()>;

    /// Reads one row.
    fn get_record(&self, table: &str, id: &str) -> StoreResult<Option<Record>>;

    /// Inserts a row outside a local-write transaction (used when applying
    /// pulled changes).
    fn insert_record(&self, table: &str, record: Record) -> StoreResult<()>;

    /// Replaces a row wholesale with the given record.
    fn replace_record(&self, table: &str, record: Record) -> StoreResult<()>;

    /// All outbox entries in commit order.
    fn queue_entries(&self) -> StoreResult<Vec<QueueEntry>>;

    /// Removes delivered outbox entries by id.
    fn remove_queue_entries(&self, ids: &[String]) -> StoreResult<()>;

    /// Marks a failed delivery attempt on the given entries: increments
    /// `attempts` and records the error message.
    fn record_queue_failure(&self, ids: &[String], error: &str) -> StoreResult<()>;

    /// The pull high-water mark (epoch ms); 0 before the first sync.
    fn last_cursor(&self) -> StoreResult<i64>;

    /// Persists a new pull high-water mark.
    fn set_last_cursor(&self, cursor: i64) -> StoreResult<()>;
}
