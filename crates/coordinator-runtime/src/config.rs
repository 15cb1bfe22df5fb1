//! Coordinator configuration from environment variables.

use std::env;
use std::time::Duration;

/// Configuration for the coordinator runtime.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Maximum time the acceptor waits for readiness before rejecting.
    pub ready_max_wait: Duration,

    /// Poll interval for the readiness wait.
    pub ready_poll_interval: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            ready_max_wait: shared_messaging::READY_MAX_WAIT,
            ready_poll_interval: shared_messaging::READY_POLL_INTERVAL,
        }
    }
}

impl CoordinatorConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CROSSLINK_READY_MAX_WAIT_MS`: readiness wait bound (default: 5000)
    /// - `CROSSLINK_READY_POLL_MS`: readiness poll interval (default: 100)
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ready_max_wait: env_duration_ms("CROSSLINK_READY_MAX_WAIT_MS")
                .unwrap_or(defaults.ready_max_wait),
            ready_poll_interval: env_duration_ms("CROSSLINK_READY_POLL_MS")
                .unwrap_or(defaults.ready_poll_interval),
        }
    }
}

fn env_duration_ms(key: &str) -> Option<Duration> {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bounds() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.ready_max_wait, Duration::from_secs(5));
        assert_eq!(config.ready_poll_interval, Duration::from_millis(100));
    }
}
