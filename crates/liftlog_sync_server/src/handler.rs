//! Push and pull request handling.

use std::sync::Arc;

use liftlog_sync_protocol::{
    PullRequest, PullResponse, PushRequest, PushResponse, Record, TableRegistry,
};
use serde_json::Value;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::store::ServerStore;

/// Everything a handler needs to serve one authenticated user.
pub struct HandlerContext {
    /// The record store.
    pub store: Arc<ServerStore>,
    /// Tables accepted for sync.
    pub registry: TableRegistry,
    /// Limits.
    pub config: ServerConfig,
}

/// Applies authenticated push and pull requests.
///
/// The caller has already authenticated the user; the handler trusts the
/// `user_id` argument and nothing inside the request. Any `userId` a client
/// puts in a change payload is overwritten with the authenticated one.
pub struct RequestHandler {
    ctx: HandlerContext,
}

impl RequestHandler {
    /// Creates a handler over the given context.
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }

    /// Applies a push batch for `user_id`.
    ///
    /// The batch is validated in full before anything is applied, so a
    /// rejected batch leaves the store untouched. Within the batch a change
    /// may reference a parent introduced by an earlier change. Per record
    /// the merge is last-write-wins: stale or tied changes are dropped
    /// silently, and a winning change updates only the columns it carries.
    pub fn handle_push(&self, user_id: &str, request: PushRequest) -> ServerResult<PushResponse> {
        if request.changes.len() > self.ctx.config.max_push_batch {
            return Err(ServerError::InvalidRequest(format!(
                "push batch of {} exceeds limit {}",
                request.changes.len(),
                self.ctx.config.max_push_batch
            )));
        }

        let mut staged: Vec<(String, Record)> = Vec::with_capacity(request.changes.len());
        for change in &request.changes {
            if !self.ctx.registry.contains(&change.table) {
                return Err(ServerError::UnknownTable(change.table.clone()));
            }

            // Force ownership before interpreting the payload.
            let mut owned = change.clone();
            owned
                .data
                .insert("userId".to_string(), Value::String(user_id.to_string()));
            let record = Record::from_change(&owned)
                .map_err(|err| ServerError::InvalidRequest(err.to_string()))?;

            for rule in self.ctx.store.foreign_keys(&change.table) {
                let Some(parent_id) = record.fields.get(&rule.field).and_then(Value::as_str)
                else {
                    continue;
                };
                let in_store = self.ctx.store.contains(&rule.parent_table, user_id, parent_id);
                let in_batch = staged
                    .iter()
                    .any(|(table, row)| *table == rule.parent_table && row.id == parent_id);
                if !in_store && !in_batch {
                    return Err(ServerError::ForeignKey {
                        table: change.table.clone(),
                        id: change.id.clone(),
                        message: format!(
                            "references missing {} record '{}'",
                            rule.parent_table, parent_id
                        ),
                    });
                }
            }

            staged.push((change.table.clone(), record));
        }

        let mut applied = 0usize;
        for ((table, record), change) in staged.into_iter().zip(&request.changes) {
            match self.ctx.store.get(&table, user_id, &record.id) {
                Some(existing) if !change.supersedes(existing.updated_at_ms()) => {
                    tracing::debug!(table, id = %record.id, "dropping stale push change");
                }
                Some(existing) => {
                    self.ctx.store.upsert(&table, merge_into(existing, record));
                    applied += 1;
                }
                None => {
                    self.ctx.store.upsert(&table, record);
                    applied += 1;
                }
            }
        }

        tracing::debug!(user = user_id, received = request.changes.len(), applied, "push applied");
        Ok(PushResponse::ok())
    }

    /// Serves a pull for `user_id`: every change of theirs strictly newer
    /// than the cursor, across all registered tables, plus the new cursor.
    pub fn handle_pull(&self, user_id: &str, request: PullRequest) -> ServerResult<PullResponse> {
        let mut changes = Vec::new();
        let mut cursor = request.cursor;

        for table in self.ctx.registry.names() {
            for record in self.ctx.store.changes_since(table, user_id, request.cursor) {
                cursor = cursor.max(record.updated_at_ms());
                changes.push(record.to_change(table));
            }
        }

        tracing::debug!(user = user_id, count = changes.len(), cursor, "pull served");
        Ok(PullResponse { changes, cursor })
    }
}

/// Merges a winning change into the stored row.
///
/// Update changes carry only the fields the client touched, so columns the
/// change does not name must survive. The conflict timestamp always comes
/// from the change; `created_at` and `deleted_at` are overwritten only when
/// the change carries them.
fn merge_into(mut existing: Record, incoming: Record) -> Record {
    for (key, value) in incoming.fields {
        existing.fields.insert(key, value);
    }
    if incoming.created_at.is_some() {
        existing.created_at = incoming.created_at;
    }
    if incoming.deleted_at.is_some() {
        existing.deleted_at = incoming.deleted_at;
    }
    existing.updated_at = incoming.updated_at;
    existing
}
