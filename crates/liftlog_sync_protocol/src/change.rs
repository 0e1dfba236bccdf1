//! The wire unit exchanged between client and server.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single replicated change for one record.
///
/// The same shape travels in both directions. Pull responses tag each item
/// with its table at the top level; push batches carry the table per item
/// as well. Timestamps are epoch milliseconds; `updated_at` is the
/// authoritative conflict timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeItem {
    /// Table the record belongs to.
    pub table: String,
    /// Stable record id.
    pub id: String,
    /// Row fields, timestamps as epoch milliseconds.
    pub data: Map<String, Value>,
    /// Conflict timestamp (epoch ms).
    pub updated_at: i64,
    /// Tombstone timestamp (epoch ms), if the record is soft-deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
}

impl ChangeItem {
    /// Last-write-wins comparison.
    ///
    /// Returns true iff this change replaces state last written at
    /// `existing_ms`. Ties and staler candidates lose.
    pub fn supersedes(&self, existing_ms: i64) -> bool {
        self.updated_at > existing_ms
    }
}
