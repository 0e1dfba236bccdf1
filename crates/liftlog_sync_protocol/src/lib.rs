//! # Liftlog Sync Protocol
//!
//! Wire types shared by the liftlog sync engine and sync server.
//!
//! This crate provides:
//! - [`ChangeItem`], the wire unit (JSON with camelCase field names)
//! - [`WriteOperation`] and [`QueueEntry`] for the durable outbox
//! - [`Record`], the stored-row model with native timestamp columns
//! - [`TableRegistry`], the explicitly injected set of syncable tables
//! - Push/pull request and response bodies
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod change;
mod error;
mod messages;
mod operation;
mod queue;
mod record;
mod registry;

pub use change::ChangeItem;
pub use error::{ErrorCode, ProtocolError, ProtocolResult};
pub use messages::{PullRequest, PullResponse, PushRequest, PushResponse};
pub use operation::WriteOperation;
pub use queue::QueueEntry;
pub use record::{datetime_from_ms, ms_from_datetime, Record};
pub use registry::{TableRegistry, TIMESTAMP_FIELDS};
