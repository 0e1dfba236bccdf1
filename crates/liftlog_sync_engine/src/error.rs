//! Engine error types.

use liftlog_sync_protocol::{ErrorCode, ProtocolError};
use thiserror::Error;

use crate::store::StoreError;

/// Result alias for engine operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors produced by the client sync engine.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A write targeted a table outside the registry.
    #[error("table '{0}' is not registered for sync")]
    UnknownTable(String),

    /// The local store failed.
    #[error("local store error: {0}")]
    Store(#[from] StoreError),

    /// A wire payload could not be interpreted.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The transport could not reach the server or the call failed in
    /// transit. Retryable failures are retried by the next scheduled cycle.
    #[error("transport error: {message}")]
    Transport {
        /// Human-readable failure description.
        message: String,
        /// Whether a later attempt may succeed without intervention.
        retryable: bool,
    },

    /// The server rejected the session token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The server rejected the request contents.
    #[error("request rejected: {0}")]
    Rejected(String),
}

impl SyncError {
    /// Maps a server error code to the matching engine error.
    pub fn from_code(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            ErrorCode::Unauthorized => SyncError::Unauthorized(message),
            ErrorCode::BadRequest => SyncError::Rejected(message),
            ErrorCode::Internal => SyncError::Transport {
                message,
                retryable: true,
            },
        }
    }

    /// Returns true if this failure calls for a session refresh.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SyncError::Unauthorized(_))
    }
}
