//! Connectivity- and lifecycle-aware sync orchestration.
//!
//! The orchestrator owns the scheduler and a status cell, reacts to
//! connectivity and app-lifecycle events, and runs the auth-aware cycle
//! against the injected store, transport and session provider.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use liftlog_sync_protocol::TableRegistry;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::config::SyncConfig;
use crate::retry::{run_with_retry, SessionProvider};
use crate::scheduler::SyncScheduler;
use crate::store::LocalStore;
use crate::transport::SyncTransport;

/// Where the engine currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// A cycle is in flight.
    Syncing,
    /// The last cycle completed.
    Synced,
    /// No connectivity; local writes queue up.
    Offline,
    /// The last cycle failed for a reason other than connectivity.
    Error,
}

/// External events the orchestrator reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Network reachability changed.
    ConnectivityChanged {
        /// Whether the network is now reachable.
        online: bool,
    },
    /// The app returned to the foreground.
    Foregrounded,
}

/// Answers whether the network is currently reachable.
pub trait ConnectivityProbe: Send + Sync {
    /// One reachability check.
    fn is_online(&self) -> impl Future<Output = bool> + Send;
}

/// Ties scheduler, status and lifecycle events together.
pub struct SyncOrchestrator {
    scheduler: Arc<SyncScheduler>,
    status: Arc<RwLock<SyncStatus>>,
    online: Arc<AtomicBool>,
    events: Mutex<Option<JoinHandle<()>>>,
}

impl SyncOrchestrator {
    /// Builds an orchestrator around the injected parts.
    ///
    /// The orchestrator starts assuming connectivity; call
    /// [`start`](SyncOrchestrator::start) to probe and begin reacting to
    /// events.
    pub fn new<T, S>(
        config: SyncConfig,
        store: Arc<dyn LocalStore>,
        registry: TableRegistry,
        transport: Arc<T>,
        sessions: Arc<S>,
    ) -> Self
    where
        T: SyncTransport + 'static,
        S: SessionProvider + 'static,
    {
        let status = Arc::new(RwLock::new(SyncStatus::Syncing));
        let online = Arc::new(AtomicBool::new(true));

        let cycle_status = Arc::clone(&status);
        let cycle_online = Arc::clone(&online);
        let sync_fn = move || {
            let store = Arc::clone(&store);
            let registry = registry.clone();
            let transport = Arc::clone(&transport);
            let sessions = Arc::clone(&sessions);
            let status = Arc::clone(&cycle_status);
            let online = Arc::clone(&cycle_online);
            async move {
                if !online.load(Ordering::SeqCst) {
                    *status.write() = SyncStatus::Offline;
                    return;
                }
                *status.write() = SyncStatus::Syncing;
                match run_with_retry(store.as_ref(), &registry, transport.as_ref(), sessions.as_ref())
                    .await
                {
                    Ok(()) => *status.write() = SyncStatus::Synced,
                    Err(err) => {
                        tracing::warn!(error = %err, "sync cycle failed");
                        *status.write() = SyncStatus::Error;
                    }
                }
            }
        };

        Self {
            scheduler: Arc::new(SyncScheduler::new(config.debounce, sync_fn)),
            status,
            online,
            events: Mutex::new(None),
        }
    }

    /// Probes connectivity, runs an initial cycle when online, and begins
    /// consuming lifecycle events.
    pub async fn start<P>(&self, probe: P, mut events: UnboundedReceiver<LifecycleEvent>)
    where
        P: ConnectivityProbe + 'static,
    {
        let online_now = probe.is_online().await;
        self.online.store(online_now, Ordering::SeqCst);
        if online_now {
            self.scheduler.trigger_now();
        } else {
            *self.status.write() = SyncStatus::Offline;
        }

        let scheduler = Arc::clone(&self.scheduler);
        let status = Arc::clone(&self.status);
        let online = Arc::clone(&self.online);
        let handle = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    LifecycleEvent::ConnectivityChanged { online: true } => {
                        tracing::info!("connectivity regained, syncing");
                        online.store(true, Ordering::SeqCst);
                        scheduler.trigger_now();
                    }
                    LifecycleEvent::ConnectivityChanged { online: false } => {
                        tracing::info!("connectivity lost");
                        online.store(false, Ordering::SeqCst);
                        scheduler.cancel();
                        *status.write() = SyncStatus::Offline;
                    }
                    LifecycleEvent::Foregrounded => {
                        if online.load(Ordering::SeqCst) {
                            scheduler.trigger_now();
                        }
                    }
                }
            }
        });

        if let Some(previous) = self.events.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Signals a committed local write (debounced).
    pub fn notify_write(&self) {
        self.scheduler.notify_write();
    }

    /// Forces an immediate cycle.
    pub fn trigger_sync(&self) {
        self.scheduler.trigger_now();
    }

    /// Current engine status.
    pub fn status(&self) -> SyncStatus {
        *self.status.read()
    }

    /// Stops consuming events and cancels any pending cycle.
    pub fn shutdown(&self) {
        if let Some(handle) = self.events.lock().take() {
            handle.abort();
        }
        self.scheduler.cancel();
    }
}

impl Drop for SyncOrchestrator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
