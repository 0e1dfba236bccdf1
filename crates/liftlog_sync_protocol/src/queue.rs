//! Durable outbox entries.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::change::ChangeItem;
use crate::operation::WriteOperation;

/// One committed local mutation awaiting delivery.
///
/// Exactly one entry is appended per synchronized write, in the same
/// transaction as the data change. Entries are removed only on a confirmed
/// push; a failed push retains them with `attempts` incremented and
/// `last_error` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    /// Entry id (UUID v4).
    pub id: String,
    /// Table the mutation targets.
    pub table_name: String,
    /// Record the mutation targets.
    pub record_id: String,
    /// The captured mutation.
    pub operation: WriteOperation,
    /// Commit time of the local write (epoch ms).
    pub created_at: i64,
    /// Failed delivery attempts so far.
    pub attempts: u32,
    /// Message from the most recent failed attempt.
    pub last_error: Option<String>,
}

impl QueueEntry {
    /// Captures a new entry for a committed write.
    pub fn new(
        table_name: impl Into<String>,
        record_id: impl Into<String>,
        operation: WriteOperation,
        created_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            table_name: table_name.into(),
            record_id: record_id.into(),
            operation,
            created_at,
            attempts: 0,
            last_error: None,
        }
    }

    /// Maps this entry to its wire change.
    ///
    /// The entry's commit time becomes the change's conflict timestamp.
    pub fn to_change(&self) -> ChangeItem {
        let (data, deleted_at) = self.operation.change_data(self.created_at);
        ChangeItem {
            table: self.table_name.clone(),
            id: self.record_id.clone(),
            data,
            updated_at: self.created_at,
            deleted_at,
        }
    }
}
