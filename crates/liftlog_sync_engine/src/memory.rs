//! In-memory [`LocalStore`] backend.
//!
//! Used by the test suites and as a reference for wiring a real database
//! backend. The transaction rollback is a whole-state snapshot, which is
//! fine at in-memory scale.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use liftlog_sync_protocol::{QueueEntry, Record};
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::store::{LocalStore, StoreResult, StoreTxn};

/// Key in the metadata table holding the pull cursor.
const CURSOR_KEY: &str = "lastSyncCursor";

#[derive(Debug, Clone, Default)]
struct StoreState {
    tables: HashMap<String, BTreeMap<String, Record>>,
    queue: Vec<QueueEntry>,
    meta: HashMap<String, String>,
}

/// An in-memory local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<StoreState>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All live (non-tombstoned) records of a table, in id order.
    pub fn live_records(&self, table: &str) -> Vec<Record> {
        let state = self.inner.lock();
        state
            .tables
            .get(table)
            .map(|rows| {
                rows.values()
                    .filter(|record| !record.is_tombstoned())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

struct MemoryTxn<'a> {
    state: &'a mut StoreState,
}

impl StoreTxn for MemoryTxn<'_> {
    fn insert_record(&mut self, table: &str, record: Record) -> StoreResult<()> {
        self.state
            .tables
            .entry(table.to_string())
            .or_default()
            .insert(record.id.clone(), record);
        Ok(())
    }

    fn update_fields(
        &mut self,
        table: &str,
        id: &str,
        fields: &Map<String, Value>,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let Some(row) = self
            .state
            .tables
            .get_mut(table)
            .and_then(|rows| rows.get_mut(id))
        else {
            return Ok(false);
        };
        for (key, value) in fields {
            row.fields.insert(key.clone(), value.clone());
        }
        row.updated_at = at;
        Ok(true)
    }

    fn tombstone(&mut self, table: &str, id: &str, at: DateTime<Utc>) -> StoreResult<bool> {
        let Some(row) = self
            .state
            .tables
            .get_mut(table)
            .and_then(|rows| rows.get_mut(id))
        else {
            return Ok(false);
        };
        row.deleted_at = Some(at);
        row.updated_at = at;
        Ok(true)
    }

    fn enqueue(&mut self, entry: QueueEntry) -> StoreResult<()> {
        self.state.queue.push(entry);
        Ok(())
    }
}

impl LocalStore for MemoryStore {
    fn transaction(
        &self,
        f: &mut dyn FnMut(&mut dyn StoreTxn) -> StoreResult<()>,
    ) -> StoreResult<()> {
        let mut state = self.inner.lock();
        let snapshot = state.clone();
        let mut txn = MemoryTxn { state: &mut state };
        match f(&mut txn) {
            Ok(()) => Ok(()),
            Err(err) => {
                *state = snapshot;
                Err(err)
            }
        }
    }

    fn get_record(&self, table: &str, id: &str) -> StoreResult<Option<Record>> {
        let state = self.inner.lock();
        Ok(state
            .tables
            .get(table)
            .and_then(|rows| rows.get(id))
            .cloned())
    }

    fn insert_record(&self, table: &str, record: Record) -> StoreResult<()> {
        let mut state = self.inner.lock();
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .insert(record.id.clone(), record);
        Ok(())
    }

    fn replace_record(&self, table: &str, record: Record) -> StoreResult<()> {
        self.insert_record(table, record)
    }

    fn queue_entries(&self) -> StoreResult<Vec<QueueEntry>> {
        Ok(self.inner.lock().queue.clone())
    }

    fn remove_queue_entries(&self, ids: &[String]) -> StoreResult<()> {
        let mut state = self.inner.lock();
        state.queue.retain(|entry| !ids.contains(&entry.id));
        Ok(())
    }

    fn record_queue_failure(&self, ids: &[String], error: &str) -> StoreResult<()> {
        let mut state = self.inner.lock();
        for entry in state.queue.iter_mut() {
            if ids.contains(&entry.id) {
                entry.attempts += 1;
                entry.last_error = Some(error.to_string());
            }
        }
        Ok(())
    }

    fn last_cursor(&self) -> StoreResult<i64> {
        let state = self.inner.lock();
        Ok(state
            .meta
            .get(CURSOR_KEY)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0))
    }

    fn set_last_cursor(&self, cursor: i64) -> StoreResult<()> {
        let mut state = self.inner.lock();
        state.meta.insert(CURSOR_KEY.to_string(), cursor.to_string());
        Ok(())
    }
}
