//! Request/response message types for the push and pull endpoints.

use serde::{Deserialize, Serialize};

use crate::change::ChangeItem;

/// A batch of local changes uploaded to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    /// Changes in local commit order.
    pub changes: Vec<ChangeItem>,
}

/// Acknowledgement of a fully applied push batch.
///
/// Pushes are all-or-nothing: a response is only produced when every change
/// in the batch was accepted, so there is no per-item status to report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushResponse {
    /// Always true on a successful push.
    pub success: bool,
}

impl PushResponse {
    /// The acknowledgement for an applied batch.
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// A request for changes newer than the client's cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    /// High-water mark (epoch ms) from the previous pull; 0 on first sync.
    pub cursor: i64,
}

/// Changes newer than the requested cursor, plus the next cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullResponse {
    /// Matching changes for the calling user.
    pub changes: Vec<ChangeItem>,
    /// New high-water mark; equals the request cursor when nothing changed.
    pub cursor: i64,
}

impl PullResponse {
    /// A response carrying no changes, echoing the client's cursor.
    pub fn empty(cursor: i64) -> Self {
        Self {
            changes: Vec::new(),
            cursor,
        }
    }
}
