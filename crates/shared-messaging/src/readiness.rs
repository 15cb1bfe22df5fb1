//! # Readiness Gate
//!
//! Coordinator-wide flag plus a bounded polling wait, used by the channel
//! acceptor to avoid rejecting requests that arrive before the coordinator
//! has finished initializing. Initialized false, flipped to true exactly
//! once after startup completes, never reset.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// Write-once readiness flag with a bounded wait.
#[derive(Debug, Default)]
pub struct ReadinessGate {
    ready: AtomicBool,
}

impl ReadinessGate {
    /// Create a gate in the not-ready state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
        }
    }

    /// True once the coordinator's setup has completed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Flip the gate to ready. Called exactly once by the coordinator's own
    /// initialization sequence; a second call is a no-op with a warning.
    pub fn mark_ready(&self) {
        if self.ready.swap(true, Ordering::AcqRel) {
            warn!("readiness gate marked ready more than once");
        } else {
            debug!("readiness gate open");
        }
    }

    /// Poll until ready or until `max_wait` elapses, checking every
    /// `poll_interval`. Returns the final readiness state.
    pub async fn wait_ready(&self, max_wait: Duration, poll_interval: Duration) -> bool {
        let deadline = Instant::now() + max_wait;
        while !self.is_ready() {
            if Instant::now() >= deadline {
                return false;
            }
            sleep(poll_interval.min(deadline - Instant::now())).await;
        }
        true
    }
}
