//! The auth-aware sync cycle.

use std::future::Future;

use liftlog_sync_protocol::TableRegistry;

use crate::error::SyncResult;
use crate::pull::pull_changes;
use crate::push::push_changes;
use crate::store::LocalStore;
use crate::transport::SyncTransport;

/// Supplies a fresh session when the server stops accepting the current one.
pub trait SessionProvider: Send + Sync {
    /// Obtains a new session (e.g. re-authenticates and installs a new
    /// token in the transport). Failing here aborts the cycle.
    fn refresh_session(&self) -> impl Future<Output = SyncResult<()>> + Send;
}

/// One push-then-pull cycle with no retry.
pub async fn sync_once<T: SyncTransport>(
    store: &dyn LocalStore,
    registry: &TableRegistry,
    transport: &T,
) -> SyncResult<()> {
    push_changes(store, transport).await?;
    pull_changes(store, registry, transport).await
}

/// One sync cycle with a single session-refresh retry.
///
/// An unauthorized failure triggers exactly one refresh followed by one more
/// cycle; a second unauthorized failure propagates. Every other error
/// propagates immediately and is retried only by the next scheduled cycle.
pub async fn run_with_retry<T, S>(
    store: &dyn LocalStore,
    registry: &TableRegistry,
    transport: &T,
    sessions: &S,
) -> SyncResult<()>
where
    T: SyncTransport,
    S: SessionProvider,
{
    match sync_once(store, registry, transport).await {
        Err(err) if err.is_unauthorized() => {
            tracing::info!("session rejected, refreshing and retrying once");
            sessions.refresh_session().await?;
            sync_once(store, registry, transport).await
        }
        other => other,
    }
}
