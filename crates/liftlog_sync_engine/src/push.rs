//! Uploading the outbox.

use liftlog_sync_protocol::{PushRequest, QueueEntry};

use crate::error::SyncResult;
use crate::store::LocalStore;
use crate::transport::SyncTransport;

/// Drains the outbox to the server.
///
/// An empty outbox makes no transport call. On a confirmed push exactly the
/// drained entries are removed; on failure they stay, with the attempt and
/// error recorded, and the error propagates to the caller.
pub async fn push_changes<T: SyncTransport>(
    store: &dyn LocalStore,
    transport: &T,
) -> SyncResult<()> {
    let entries = store.queue_entries()?;
    if entries.is_empty() {
        return Ok(());
    }

    let ids: Vec<String> = entries.iter().map(|entry| entry.id.clone()).collect();
    let changes = entries.iter().map(QueueEntry::to_change).collect();

    tracing::debug!(count = ids.len(), "pushing queued changes");
    match transport.push(PushRequest { changes }).await {
        Ok(_) => {
            store.remove_queue_entries(&ids)?;
            tracing::debug!(count = ids.len(), "push confirmed");
            Ok(())
        }
        Err(err) => {
            store.record_queue_failure(&ids, &err.to_string())?;
            Err(err)
        }
    }
}
