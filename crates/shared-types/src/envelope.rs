//! # Message Envelope
//!
//! The universal wrapper for every request travelling between execution
//! contexts.
//!
//! ## Contract
//!
//! - **Versioning**: All envelopes include a `version` field for forward
//!   compatibility.
//! - **Correlation**: Every envelope that expects a reply carries a
//!   `correlation_id`; replies MUST echo the same id. Ids are generated by
//!   the sender, exactly once, and never reused.
//! - **Sender Authority**: The `sender` tag on the envelope is the sole
//!   source of truth for the originating context; payloads do not duplicate it.
//! - Envelopes are immutable once sent.

use crate::action::Action;
use crate::context::ContextKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Current protocol version for cross-context messages.
pub const PROTOCOL_VERSION: u16 = 1;

/// The universal message envelope for all cross-context communication.
///
/// Every field except `action` carries a serde default so that legacy
/// minimal messages (bare `{"action": ...}` objects from older contexts)
/// still deserialize; the registry normalizes the missing fields before
/// dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Protocol version for forward compatibility.
    #[serde(default = "default_version")]
    pub version: u16,

    /// Unique identifier correlating this request with its eventual reply.
    /// For requests: a newly generated UUID.
    /// For replies: the UUID from the original request.
    #[serde(default = "Uuid::nil")]
    pub correlation_id: Uuid,

    /// The operation this request asks for.
    pub action: Action,

    /// The request payload. Opaque to the transport.
    #[serde(default)]
    pub payload: Value,

    /// The kind of execution context that originated this envelope.
    #[serde(default = "default_sender")]
    pub sender: ContextKind,

    /// Unix timestamp in milliseconds when the envelope was created.
    #[serde(default)]
    pub timestamp_ms: u64,
}

fn default_version() -> u16 {
    PROTOCOL_VERSION
}

fn default_sender() -> ContextKind {
    ContextKind::Page
}

impl Envelope {
    /// Build a request envelope with a fresh, collision-resistant
    /// correlation id and the current timestamp. Pure construction, no side
    /// effects beyond id generation.
    #[must_use]
    pub fn request(action: Action, payload: Value, sender: ContextKind) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            correlation_id: Uuid::new_v4(),
            action,
            payload,
            sender,
            timestamp_ms: now_ms(),
        }
    }
}

/// The terminal payload for a given correlation id.
///
/// A reply is delivered even when the handler failed: `success` is false and
/// `error` names the failure. Delivery-level failures (timeouts, disconnects)
/// never produce a `Reply`; they surface as `SendError` at the call site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    /// Echo of the request's correlation id.
    pub correlation_id: Uuid,

    /// Whether the handler completed successfully.
    pub success: bool,

    /// Result data on success; may carry structured error details on failure.
    pub payload: Value,

    /// Human-readable failure description when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reply {
    /// Build a success reply echoing the request's correlation id.
    #[must_use]
    pub fn success(correlation_id: Uuid, payload: Value) -> Self {
        Self {
            correlation_id,
            success: true,
            payload,
            error: None,
        }
    }

    /// Build a failure reply preserving the original correlation id.
    #[must_use]
    pub fn failure(correlation_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            correlation_id,
            success: false,
            payload: Value::Null,
            error: Some(error.into()),
        }
    }
}

/// Milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
