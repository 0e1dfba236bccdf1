//! Server error types.

use liftlog_sync_protocol::ErrorCode;
use thiserror::Error;

/// Result alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors produced while serving push and pull requests.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The request was malformed or violated a limit.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A change targeted a table the server does not sync.
    #[error("table '{0}' is not registered for sync")]
    UnknownTable(String),

    /// The session token was missing, malformed, tampered or expired.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// A change referenced a parent record that does not exist for this
    /// user. Carries the table and id of the offending change so the
    /// client can surface it.
    #[error("foreign key violation on {table}/{id}: {message}")]
    ForeignKey {
        /// Table of the rejected change.
        table: String,
        /// Record id of the rejected change.
        id: String,
        /// What was missing.
        message: String,
    },

    /// The backing store failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl ServerError {
    /// The wire error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            ServerError::NotAuthorized(_) => ErrorCode::Unauthorized,
            ServerError::InvalidRequest(_)
            | ServerError::UnknownTable(_)
            | ServerError::ForeignKey { .. } => ErrorCode::BadRequest,
            ServerError::Storage(_) => ErrorCode::Internal,
        }
    }

    /// Returns true if the client, not the server, must change something
    /// for the request to succeed.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ServerError::Storage(_))
    }
}
