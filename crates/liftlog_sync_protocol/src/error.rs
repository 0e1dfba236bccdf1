//! Error types for the sync protocol.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for protocol conversions.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Machine-readable discriminator attached to sync failures.
///
/// Both sides of the wire classify errors with this code. The engine's
/// reauth retry keys off [`ErrorCode::Unauthorized`] specifically; retrying a
/// [`ErrorCode::BadRequest`] with identical data cannot succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// The caller's session is missing or expired.
    Unauthorized,
    /// The request data cannot be applied.
    BadRequest,
    /// Transient server-side fault.
    Internal,
}

impl ErrorCode {
    /// Returns the wire string for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::Internal => "INTERNAL",
        }
    }

    /// Parses a wire string.
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "UNAUTHORIZED" => Some(ErrorCode::Unauthorized),
            "BAD_REQUEST" => Some(ErrorCode::BadRequest),
            "INTERNAL" => Some(ErrorCode::Internal),
            _ => None,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced while converting between wire and stored shapes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A change or operation payload is missing a required field.
    #[error("missing required field `{field}`")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A field holds a value of an unexpected type.
    #[error("field `{field}` has an unexpected type")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A millisecond timestamp is outside the representable range.
    #[error("timestamp {0} out of range")]
    TimestampOutOfRange(i64),
}
