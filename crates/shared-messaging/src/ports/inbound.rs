//! # Inbound Port - The Messaging API
//!
//! The entire contract other subsystems need from the messaging fabric:
//! send, reliable send, handler registration, and dispatch.

use crate::registry::{Handler, ReplySink};
use crate::service::{ReliableOptions, SendOptions};
use async_trait::async_trait;
use shared_types::{Action, Envelope, Reply, SendError};
use std::sync::Arc;

/// Cross-context request/response, as seen by callers in any context.
#[async_trait]
pub trait MessagingApi: Send + Sync {
    /// Send a request, picking the transport by action classification.
    async fn send(&self, envelope: Envelope, options: SendOptions) -> Result<Reply, SendError>;

    /// Send a request with bounded retries, backoff, and channel fallback.
    async fn send_reliable(
        &self,
        envelope: Envelope,
        options: ReliableOptions,
    ) -> Result<Reply, SendError>;

    /// Register a handler for an action in this context's registry.
    /// Last write wins.
    fn register_handler(&self, action: Action, handler: Arc<dyn Handler>);

    /// Dispatch an inbound envelope to this context's registered handler.
    /// Returns true when asynchronous work is pending and the reply path
    /// must stay open.
    fn dispatch(&self, envelope: Envelope, sink: Arc<dyn ReplySink>) -> bool;
}
