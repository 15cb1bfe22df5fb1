//! # Error Taxonomy
//!
//! Delivery-level failures, as observed by callers of the messaging layer.
//! Handler-level failures are not errors at this layer: they arrive as
//! ordinary `Reply` values with `success == false`.

use crate::action::Action;
use thiserror::Error;

/// Errors of the host transport primitives.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// No response within the bounded wait.
    #[error("transport timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The execution context itself is gone. Retrying is futile.
    #[error("execution context invalidated")]
    ContextInvalidated,

    /// The one-shot send found no listener on the other end.
    #[error("no listener for one-shot message")]
    NoListener,

    /// Persistent channel failure (connect refused, write after close).
    #[error("channel error: {0}")]
    Channel(String),
}

impl TransportError {
    /// True when the originating execution context has been torn down.
    /// The delivery layer uses this to short-circuit retries and fallback.
    #[must_use]
    pub fn is_context_invalidated(&self) -> bool {
        matches!(self, Self::ContextInvalidated)
    }
}

/// Everything a `send` / `send_reliable` caller can observe as a failure.
///
/// Every outstanding request settles exactly once: with a `Reply`, with one
/// of these, or with a timeout represented as one of these.
#[derive(Debug, Clone, Error)]
pub enum SendError {
    /// Acknowledgement not received within the per-attempt window.
    #[error("no acknowledgement within {timeout_ms}ms (attempt {attempt})")]
    AckTimeout { timeout_ms: u64, attempt: u32 },

    /// The fallback phase exceeded its total timeout.
    #[error("no response within {timeout_ms}ms")]
    TotalTimeout { timeout_ms: u64 },

    /// The persistent channel was torn down before a RESULT frame arrived.
    /// Not retried automatically; callers decide whether to re-issue.
    #[error("channel disconnected before response")]
    DisconnectedBeforeResponse,

    /// The execution context itself is gone. Never retried, propagated
    /// immediately without any fallback attempt.
    #[error("execution context invalidated")]
    ContextInvalidated,

    /// The coordinator had not finished initializing within the bounded wait.
    #[error("coordinator not ready")]
    NotReady,

    /// No handler registered for the action. Deterministic, never retried.
    #[error("no handler registered for action \"{0}\"")]
    NoHandler(Action),

    /// A handler failed; the failure text is preserved.
    #[error("handler failed: {0}")]
    Handler(String),

    /// Any other transport-level failure.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl From<TransportError> for SendError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::ContextInvalidated => Self::ContextInvalidated,
            TransportError::Timeout { timeout_ms } => Self::TotalTimeout { timeout_ms },
            other => Self::Transport(other.to_string()),
        }
    }
}

/// The reply path closed before a reply could be written.
///
/// Swallowed (logged, never escalated) everywhere it can occur: a late
/// disconnect race on a reply write is tolerated by design.
#[derive(Debug, Clone, Copy, Error)]
#[error("reply sink closed before the reply could be written")]
pub struct SinkClosed;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_invalidated_predicate() {
        assert!(TransportError::ContextInvalidated.is_context_invalidated());
        assert!(!TransportError::NoListener.is_context_invalidated());
        assert!(!TransportError::Timeout { timeout_ms: 100 }.is_context_invalidated());
    }

    #[test]
    fn test_transport_error_conversion() {
        let err: SendError = TransportError::ContextInvalidated.into();
        assert!(matches!(err, SendError::ContextInvalidated));

        let err: SendError = TransportError::NoListener.into();
        assert!(matches!(err, SendError::Transport(_)));
    }

    #[test]
    fn test_no_handler_names_action() {
        let err = SendError::NoHandler(Action::Other("bogus".into()));
        assert!(err.to_string().contains("bogus"));
    }
}
