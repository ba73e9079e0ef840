//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for wizards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum time a single commit may take, in milliseconds.
    pub commit_timeout_ms: u64,

    /// Buffered events per subscriber before the slowest one starts lagging.
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            commit_timeout_ms: 30_000,
            event_capacity: 64,
        }
    }
}

impl EngineConfig {
    /// Set the commit timeout.
    pub fn with_commit_timeout(mut self, timeout: Duration) -> Self {
        self.commit_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// The commit timeout as a [`Duration`].
    pub fn commit_timeout(&self) -> Duration {
        Duration::from_millis(self.commit_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.commit_timeout(), Duration::from_secs(30));
        assert_eq!(config.event_capacity, 64);
    }

    #[test]
    fn test_partial_override_from_json() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"commit_timeout_ms": 500}"#).unwrap();
        assert_eq!(config.commit_timeout(), Duration::from_millis(500));
        assert_eq!(config.event_capacity, 64);

        let config = EngineConfig::default().with_commit_timeout(Duration::from_millis(20));
        assert_eq!(config.commit_timeout_ms, 20);
    }

    #[test]
    fn test_huge_timeout_saturates() {
        let config = EngineConfig::default().with_commit_timeout(Duration::MAX);
        assert_eq!(config.commit_timeout_ms, u64::MAX);
    }
}
