//! The synchronized write path.
//!
//! Every local mutation of a syncable table goes through [`sync_write`],
//! which applies the change and appends the matching outbox entry in one
//! transaction. A write can never become durable without its queue entry,
//! and vice versa.

use chrono::Utc;
use liftlog_sync_protocol::{ms_from_datetime, QueueEntry, Record, TableRegistry, WriteOperation};
use serde_json::{Map, Value};

use crate::error::{SyncError, SyncResult};
use crate::store::LocalStore;

enum Staged {
    Insert(Record),
    Update(Map<String, Value>),
    Delete,
}

/// Applies a local write and records it for later push.
///
/// Fails fast (before touching the store) on a table outside `registry` or
/// an insert with no usable id. Updates and deletes of rows that do not
/// exist locally skip the data change but still enqueue, so the mutation
/// reaches the server.
pub fn sync_write(
    store: &dyn LocalStore,
    registry: &TableRegistry,
    table: &str,
    operation: WriteOperation,
) -> SyncResult<()> {
    if !registry.contains(table) {
        return Err(SyncError::UnknownTable(table.to_string()));
    }

    let record_id = operation.record_id()?.to_string();
    let now = Utc::now();
    let entry = QueueEntry::new(table, record_id.clone(), operation.clone(), ms_from_datetime(now));

    // Validate the payload before opening the transaction so the closure
    // only sees store errors.
    let staged = match &operation {
        WriteOperation::Insert { .. } => Staged::Insert(Record::from_change(&entry.to_change())?),
        WriteOperation::Update { fields, .. } => Staged::Update(fields.clone()),
        WriteOperation::Delete { .. } => Staged::Delete,
    };

    store.transaction(&mut |txn| {
        match &staged {
            Staged::Insert(record) => txn.insert_record(table, record.clone())?,
            Staged::Update(fields) => {
                if !txn.update_fields(table, &record_id, fields, now)? {
                    tracing::debug!(table, id = %record_id, "update of absent row, queueing anyway");
                }
            }
            Staged::Delete => {
                if !txn.tombstone(table, &record_id, now)? {
                    tracing::debug!(table, id = %record_id, "delete of absent row, queueing anyway");
                }
            }
        }
        txn.enqueue(entry.clone())
    })?;

    Ok(())
}
