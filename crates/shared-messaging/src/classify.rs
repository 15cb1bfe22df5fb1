//! # Transport Classifier
//!
//! Categorizes each action as fast (expected to complete quickly, safe on
//! the ephemeral one-shot primitive) or slow (long-running, requires the
//! persistent channel). Unclassified actions, including runtime-registered
//! extension actions, default to the fast path.

use crate::{FAST_TIMEOUT, SLOW_TIMEOUT};
use shared_types::Action;
use std::time::Duration;

/// Which transport strategy an action should use by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportClass {
    /// Safe on the one-shot primitive; short default timeout.
    Fast,
    /// Long-running; goes straight to the persistent channel.
    Slow,
}

impl TransportClass {
    /// Classify an action. Pure membership test.
    #[must_use]
    pub fn of(action: &Action) -> Self {
        match action {
            Action::Translate | Action::CaptureScreen | Action::Speak | Action::SelectElement => {
                Self::Slow
            }
            // Unclassified actions default to the fast path.
            Action::Ping
            | Action::GetState
            | Action::UpdateSettings
            | Action::StopSpeaking
            | Action::Other(_) => Self::Fast,
        }
    }

    /// Default send timeout for this class. Callers may override per call.
    #[must_use]
    pub fn default_timeout(self) -> Duration {
        match self {
            Self::Fast => FAST_TIMEOUT,
            Self::Slow => SLOW_TIMEOUT,
        }
    }
}

/// True when the action is safe on the one-shot primitive.
#[must_use]
pub fn is_fast(action: &Action) -> bool {
    TransportClass::of(action) == TransportClass::Fast
}

/// True when the action requires the persistent channel.
#[must_use]
pub fn is_slow(action: &Action) -> bool {
    TransportClass::of(action) == TransportClass::Slow
}
