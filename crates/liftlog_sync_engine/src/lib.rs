//! # liftlog_sync_engine
//!
//! The client half of the sync system:
//!
//! - [`sync_write`]: transactional local writes with a durable outbox
//! - [`push_changes`] / [`pull_changes`]: the two halves of a sync cycle
//! - [`run_with_retry`]: the auth-aware cycle with one session refresh
//! - [`SyncScheduler`]: write debouncing
//! - [`SyncOrchestrator`]: connectivity and lifecycle handling
//! - [`MemoryStore`]: in-memory [`LocalStore`] for tests and prototyping
//!
//! The engine is storage- and transport-agnostic: callers inject a
//! [`LocalStore`], a [`SyncTransport`] and a [`SessionProvider`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod memory;
mod orchestrator;
mod pull;
mod push;
mod retry;
mod scheduler;
mod store;
mod transport;
mod write;

pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use memory::MemoryStore;
pub use orchestrator::{ConnectivityProbe, LifecycleEvent, SyncOrchestrator, SyncStatus};
pub use pull::pull_changes;
pub use push::push_changes;
pub use retry::{run_with_retry, sync_once, SessionProvider};
pub use scheduler::SyncScheduler;
pub use store::{LocalStore, StoreError, StoreResult, StoreTxn};
pub use transport::{MockTransport, SyncTransport};
pub use write::sync_write;
