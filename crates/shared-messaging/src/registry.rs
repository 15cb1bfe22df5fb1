//! # Handler Registry
//!
//! Maps action names to handler functions for one execution context,
//! normalizes inbound envelopes, and bridges synchronous and deferred
//! handler results back onto the reply channel.
//!
//! ## Dispatch Contract
//!
//! - No handler registered: a well-formed failure reply is routed through
//!   the sink; no asynchronous work is pending.
//! - Immediate outcome: the reply is written before `dispatch` returns.
//! - Deferred outcome: the correlation id is parked in the pending-reply
//!   map and `dispatch` reports that the reply path must stay open; the
//!   spawned task writes the normalized result when the future settles.
//! - A failing handler becomes an error-shaped reply, never a crash out of
//!   `dispatch`.

use crosslink_telemetry::DISPATCH_FAILURES;
use serde_json::Value;
use shared_types::envelope::now_ms;
use shared_types::{Action, ContextKind, Envelope, Reply, SinkClosed, PROTOCOL_VERSION};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

/// What a handler produced: a value on success, a failure description
/// otherwise. Failures become failure replies, not dispatcher errors.
pub type HandlerResult = Result<Value, String>;

/// A handler's result, either available now or pending.
///
/// The dispatcher branches on this tag; there is no runtime promise
/// detection anywhere.
pub enum HandlerOutcome {
    /// The handler completed synchronously.
    Immediate(HandlerResult),
    /// The handler started asynchronous work; the reply path must stay
    /// open until the future settles.
    Deferred(Pin<Box<dyn Future<Output = HandlerResult> + Send>>),
}

impl HandlerOutcome {
    /// Immediate success.
    #[must_use]
    pub fn ok(value: Value) -> Self {
        Self::Immediate(Ok(value))
    }

    /// Immediate failure.
    #[must_use]
    pub fn err(message: impl Into<String>) -> Self {
        Self::Immediate(Err(message.into()))
    }

    /// Deferred result from a future.
    #[must_use]
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::Deferred(Box::pin(future))
    }
}

/// Metadata about the sender of a dispatched envelope.
#[derive(Debug, Clone)]
pub struct SenderMeta {
    /// The kind of context the envelope came from.
    pub context: ContextKind,
    /// Purpose name of the channel it arrived on, if any.
    pub channel: Option<String>,
}

impl SenderMeta {
    /// Metadata derived from the envelope itself (one-shot path).
    #[must_use]
    pub fn from_envelope(envelope: &Envelope) -> Self {
        Self {
            context: envelope.sender,
            channel: None,
        }
    }
}

/// A business-logic handler registered for one action.
pub trait Handler: Send + Sync {
    /// Handle an inbound envelope.
    fn call(&self, envelope: &Envelope, meta: &SenderMeta) -> HandlerOutcome;
}

struct FnHandler<F>(F);

impl<F> Handler for FnHandler<F>
where
    F: Fn(&Envelope, &SenderMeta) -> HandlerOutcome + Send + Sync,
{
    fn call(&self, envelope: &Envelope, meta: &SenderMeta) -> HandlerOutcome {
        (self.0)(envelope, meta)
    }
}

/// Wrap a closure as a [`Handler`].
pub fn handler_fn<F>(f: F) -> Arc<dyn Handler>
where
    F: Fn(&Envelope, &SenderMeta) -> HandlerOutcome + Send + Sync + 'static,
{
    Arc::new(FnHandler(f))
}

/// Where replies are written. Implemented by the channel acceptor, the
/// one-shot listener, and test collectors.
pub trait ReplySink: Send + Sync {
    /// Write a reply. An error means the reply path is gone; callers log
    /// and swallow it, they never escalate.
    fn send_reply(&self, reply: Reply) -> Result<(), SinkClosed>;
}

/// Per-context action-to-handler table.
///
/// Registration is last-write-wins: re-registering an action overwrites the
/// previous handler and logs a warning. This allows hot-reload of feature
/// handlers.
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<Action, Arc<dyn Handler>>>,
    /// Correlation ids with a deferred reply still pending.
    pending: Arc<Mutex<HashMap<Uuid, Arc<dyn ReplySink>>>>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register a handler for an action. Last write wins.
    pub fn register(&self, action: Action, handler: Arc<dyn Handler>) {
        let Ok(mut handlers) = self.handlers.write() else {
            return;
        };
        if handlers.insert(action.clone(), handler).is_some() {
            warn!(action = %action, "handler re-registered, previous handler overwritten");
        } else {
            debug!(action = %action, "handler registered");
        }
    }

    /// Remove the handler for an action.
    pub fn unregister(&self, action: &Action) {
        let Ok(mut handlers) = self.handlers.write() else {
            return;
        };
        if handlers.remove(action).is_some() {
            debug!(action = %action, "handler unregistered");
        }
    }

    /// True when a handler is registered for the action.
    #[must_use]
    pub fn is_registered(&self, action: &Action) -> bool {
        self.handlers
            .read()
            .map(|handlers| handlers.contains_key(action))
            .unwrap_or(false)
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.read().map(|handlers| handlers.len()).unwrap_or(0)
    }

    /// Number of deferred replies still pending.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().map(|pending| pending.len()).unwrap_or(0)
    }

    /// Dispatch an inbound envelope to its registered handler.
    ///
    /// Returns `true` when asynchronous work is pending and the reply path
    /// must stay open; `false` when the reply has already been written (or
    /// never will be for this envelope).
    pub fn dispatch(
        &self,
        envelope: Envelope,
        meta: SenderMeta,
        sink: Arc<dyn ReplySink>,
    ) -> bool {
        let envelope = normalize(envelope);
        let correlation_id = envelope.correlation_id;

        let handler = self
            .handlers
            .read()
            .ok()
            .and_then(|handlers| handlers.get(&envelope.action).cloned());

        let Some(handler) = handler else {
            warn!(
                action = %envelope.action,
                correlation_id = %correlation_id,
                "no handler registered"
            );
            write_reply(
                sink.as_ref(),
                correlation_id,
                Err(format!(
                    "no handler registered for action \"{}\"",
                    envelope.action
                )),
            );
            return false;
        };

        match handler.call(&envelope, &meta) {
            HandlerOutcome::Immediate(result) => {
                write_reply(sink.as_ref(), correlation_id, result);
                false
            }
            HandlerOutcome::Deferred(future) => {
                if let Ok(mut pending) = self.pending.lock() {
                    pending.insert(correlation_id, sink);
                }
                let pending = self.pending.clone();
                tokio::spawn(async move {
                    let result = future.await;
                    let sink = pending
                        .lock()
                        .ok()
                        .and_then(|mut pending| pending.remove(&correlation_id));
                    match sink {
                        Some(sink) => write_reply(sink.as_ref(), correlation_id, result),
                        None => debug!(
                            correlation_id = %correlation_id,
                            "deferred reply dropped, no pending sink"
                        ),
                    }
                });
                true
            }
        }
    }
}

/// Fill in fields a legacy minimal message omitted.
fn normalize(mut envelope: Envelope) -> Envelope {
    if envelope.correlation_id.is_nil() {
        envelope.correlation_id = Uuid::new_v4();
        debug!(
            action = %envelope.action,
            correlation_id = %envelope.correlation_id,
            "synthesized correlation id for legacy message"
        );
    }
    if envelope.timestamp_ms == 0 {
        envelope.timestamp_ms = now_ms();
    }
    if envelope.version == 0 {
        envelope.version = PROTOCOL_VERSION;
    }
    envelope
}

/// Convert a handler result into a reply and write it, swallowing a closed
/// sink.
fn write_reply(sink: &dyn ReplySink, correlation_id: Uuid, result: HandlerResult) {
    let reply = match result {
        Ok(value) => Reply::success(correlation_id, value),
        Err(message) => {
            DISPATCH_FAILURES.inc();
            Reply::failure(correlation_id, message)
        }
    };
    if sink.send_reply(reply).is_err() {
        debug!(
            correlation_id = %correlation_id,
            "reply path closed before reply could be written"
        );
    }
}
