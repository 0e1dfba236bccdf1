//! Engine configuration.

use std::time::Duration;

/// Tunables for the client engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Quiet period after a local write before a sync cycle starts.
    /// Further writes inside the window restart it.
    pub debounce: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1000),
        }
    }
}

impl SyncConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the write debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_debounce_is_one_second() {
        assert_eq!(SyncConfig::default().debounce, Duration::from_millis(1000));
    }

    #[test]
    fn builder_overrides() {
        let config = SyncConfig::new().with_debounce(Duration::from_millis(250));
        assert_eq!(config.debounce, Duration::from_millis(250));
    }
}
