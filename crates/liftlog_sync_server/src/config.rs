//! Server configuration.

use std::time::Duration;

/// Tunables for the sync server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Maximum number of changes accepted in one push batch.
    pub max_push_batch: usize,
    /// How long an issued session token stays valid.
    pub token_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_push_batch: 500,
            token_ttl: Duration::from_secs(60 * 60 * 24),
        }
    }
}

impl ServerConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the push batch cap.
    pub fn with_max_push_batch(mut self, max: usize) -> Self {
        self.max_push_batch = max;
        self
    }

    /// Sets the session token lifetime.
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }
}
