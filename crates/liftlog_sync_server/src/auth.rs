//! Session token issuance and validation.
//!
//! Tokens are opaque byte strings: an 8-byte big-endian issue timestamp
//! (epoch ms), the UTF-8 user id, and a 32-byte HMAC-SHA256 tag over the
//! first two parts. Validation checks the tag in constant time before
//! trusting anything else in the token.

use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use liftlog_sync_protocol::ms_from_datetime;
use sha2::Sha256;

use crate::error::{ServerError, ServerResult};

type HmacSha256 = Hmac<Sha256>;

const TIMESTAMP_LEN: usize = 8;
const TAG_LEN: usize = 32;

/// Issues and validates session tokens for a shared secret.
pub struct SessionTokens {
    secret: Vec<u8>,
    ttl: Duration,
}

impl SessionTokens {
    /// Creates a token authority with the given secret and lifetime.
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    /// Issues a token for `user_id`, stamped with `now`.
    pub fn issue(&self, user_id: &str, now: DateTime<Utc>) -> Vec<u8> {
        let mut token = Vec::with_capacity(TIMESTAMP_LEN + user_id.len() + TAG_LEN);
        token.extend_from_slice(&ms_from_datetime(now).to_be_bytes());
        token.extend_from_slice(user_id.as_bytes());

        let mut mac = self.mac();
        mac.update(&token);
        token.extend_from_slice(&mac.finalize().into_bytes());
        token
    }

    /// Validates a token against `now`, returning the user id it names.
    pub fn validate(&self, token: &[u8], now: DateTime<Utc>) -> ServerResult<String> {
        if token.len() < TIMESTAMP_LEN + TAG_LEN {
            return Err(ServerError::NotAuthorized("malformed token".into()));
        }
        let (payload, tag) = token.split_at(token.len() - TAG_LEN);

        let mut mac = self.mac();
        mac.update(payload);
        mac.verify_slice(tag)
            .map_err(|_| ServerError::NotAuthorized("invalid token signature".into()))?;

        let mut issued_be = [0u8; TIMESTAMP_LEN];
        issued_be.copy_from_slice(&payload[..TIMESTAMP_LEN]);
        let issued_ms = i64::from_be_bytes(issued_be);

        let age_ms = ms_from_datetime(now).saturating_sub(issued_ms);
        if age_ms < 0 || age_ms as u128 > self.ttl.as_millis() {
            return Err(ServerError::NotAuthorized("session expired".into()));
        }

        let user_id = std::str::from_utf8(&payload[TIMESTAMP_LEN..])
            .map_err(|_| ServerError::NotAuthorized("malformed token".into()))?;
        if user_id.is_empty() {
            return Err(ServerError::NotAuthorized("empty user id".into()));
        }
        Ok(user_id.to_string())
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length.
        HmacSha256::new_from_slice(&self.secret).unwrap_or_else(|_| unreachable!())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tokens() -> SessionTokens {
        SessionTokens::new(*b"test-secret-key!", Duration::from_secs(3600))
    }

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn issue_then_validate() {
        let tokens = tokens();
        let token = tokens.issue("user-1", at(1_000_000));
        let user = tokens.validate(&token, at(1_500_000)).unwrap();
        assert_eq!(user, "user-1");
    }

    #[test]
    fn expired_token_rejected() {
        let tokens = tokens();
        let token = tokens.issue("user-1", at(0));
        let err = tokens.validate(&token, at(3_600_001)).unwrap_err();
        assert!(matches!(err, ServerError::NotAuthorized(message) if message.contains("expired")));
    }

    #[test]
    fn token_from_the_future_rejected() {
        let tokens = tokens();
        let token = tokens.issue("user-1", at(5_000_000));
        assert!(tokens.validate(&token, at(1_000_000)).is_err());
    }

    #[test]
    fn tampered_user_id_rejected() {
        let tokens = tokens();
        let mut token = tokens.issue("user-1", at(1_000_000));
        token[TIMESTAMP_LEN] ^= 0xff;
        assert!(tokens.validate(&token, at(1_000_000)).is_err());
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = tokens().issue("user-1", at(1_000_000));
        let other = SessionTokens::new(*b"another-secret!!", Duration::from_secs(3600));
        assert!(other.validate(&token, at(1_000_000)).is_err());
    }

    #[test]
    fn truncated_token_rejected() {
        let tokens = tokens();
        let token = tokens.issue("user-1", at(1_000_000));
        assert!(tokens.validate(&token[..TAG_LEN], at(1_000_000)).is_err());
        assert!(tokens.validate(&[], at(1_000_000)).is_err());
    }
}
