//! Applying server changes locally.

use liftlog_sync_protocol::{PullRequest, Record, TableRegistry};

use crate::error::SyncResult;
use crate::store::LocalStore;
use crate::transport::SyncTransport;

/// Fetches changes newer than the stored cursor and merges them.
///
/// Unknown-table items are skipped, so a client on an older schema keeps
/// syncing the tables it knows. Merging is last-write-wins per record:
/// incoming changes replace local state only when strictly newer; ties keep
/// the local row. The cursor only ever advances.
pub async fn pull_changes<T: SyncTransport>(
    store: &dyn LocalStore,
    registry: &TableRegistry,
    transport: &T,
) -> SyncResult<()> {
    let cursor = store.last_cursor()?;
    let response = transport.pull(PullRequest { cursor }).await?;

    let mut applied = 0usize;
    for change in &response.changes {
        if !registry.contains(&change.table) {
            tracing::debug!(table = %change.table, id = %change.id, "skipping change for unknown table");
            continue;
        }

        let incoming = Record::from_change(change)?;
        match store.get_record(&change.table, &change.id)? {
            None => {
                store.insert_record(&change.table, incoming)?;
                applied += 1;
            }
            Some(existing) => {
                if change.supersedes(existing.updated_at_ms()) {
                    store.replace_record(&change.table, incoming)?;
                    applied += 1;
                }
            }
        }
    }

    if response.cursor > cursor {
        store.set_last_cursor(response.cursor)?;
    }
    tracing::debug!(
        received = response.changes.len(),
        applied,
        cursor = response.cursor,
        "pull applied"
    );
    Ok(())
}
