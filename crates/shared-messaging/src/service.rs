//! # Messenger - Smart Send and Reliable Delivery
//!
//! The caller-facing delivery layer. Picks a transport per action
//! classification, wraps the one-shot primitive with bounded retries and
//! backoff, and falls back to a persistent channel session when the direct
//! path fails or signals "acknowledged but not yet resolved."
//!
//! The two phases are sequential, never concurrent: the fallback channel
//! is opened only after the direct phase has definitively failed.

use crate::classify::TransportClass;
use crate::ports::inbound::MessagingApi;
use crate::ports::outbound::{ChannelConnector, OneShotResponse, OneShotTransport};
use crate::registry::{Handler, HandlerRegistry, ReplySink, SenderMeta};
use crate::session;
use crate::{DEFAULT_ACK_TIMEOUT, DEFAULT_RETRIES, SLOW_TIMEOUT};
use async_trait::async_trait;
use crosslink_telemetry::{FALLBACKS_OPENED, MESSAGES_RETRIED, MESSAGES_SENT};
use shared_types::{Action, Envelope, Reply, SendError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Per-call options for [`Messenger::send`].
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Override the class-default timeout for the direct phase.
    pub timeout: Option<Duration>,
    /// Skip the one-shot primitive and go straight to a channel session.
    pub force_persistent: bool,
}

/// Options for [`Messenger::send_reliable`].
#[derive(Debug, Clone)]
pub struct ReliableOptions {
    /// Per-attempt acknowledgement timeout on the one-shot primitive.
    pub ack_timeout: Duration,
    /// Bounded retry count; attempts run `0..=retries`.
    pub retries: u32,
    /// Backoff durations per attempt index; the last value is reused for
    /// any attempt beyond the list length.
    pub backoff: Vec<Duration>,
    /// Total timeout for the fallback channel session.
    pub total_timeout: Duration,
}

impl Default for ReliableOptions {
    fn default() -> Self {
        Self {
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            retries: DEFAULT_RETRIES,
            backoff: vec![Duration::from_millis(300), Duration::from_millis(1000)],
            total_timeout: SLOW_TIMEOUT,
        }
    }
}

impl ReliableOptions {
    /// Backoff for a given attempt index, reusing the last configured value
    /// beyond the list length.
    fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff
            .get(attempt as usize)
            .or_else(|| self.backoff.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }
}

/// Outcome of one direct-phase attempt.
enum DirectAttempt {
    /// A full result arrived.
    Reply(Reply),
    /// Ack-only: receiver alive, result pending elsewhere. Stop retrying.
    AckOnly,
    /// Timed out or failed at the transport level. Retry or fall back.
    Failed,
}

/// The caller-facing messaging service for one execution context.
pub struct Messenger {
    one_shot: Arc<dyn OneShotTransport>,
    connector: Arc<dyn ChannelConnector>,
    registry: Arc<HandlerRegistry>,
}

impl Messenger {
    /// Wire a messenger over the host primitives and this context's
    /// handler registry.
    #[must_use]
    pub fn new(
        one_shot: Arc<dyn OneShotTransport>,
        connector: Arc<dyn ChannelConnector>,
        registry: Arc<HandlerRegistry>,
    ) -> Self {
        Self {
            one_shot,
            connector,
            registry,
        }
    }

    /// This context's handler registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    /// Send a request, picking the transport by action classification.
    ///
    /// Fast actions try the one-shot primitive once, bounded by the class
    /// timeout, and fall back to a channel session on timeout, transport
    /// failure, or an ack-only response. A context-invalidated failure is
    /// rethrown immediately: retrying or falling back is futile once the
    /// execution context itself is gone.
    pub async fn send(
        &self,
        envelope: Envelope,
        options: SendOptions,
    ) -> Result<Reply, SendError> {
        let class = TransportClass::of(&envelope.action);
        if options.force_persistent || class == TransportClass::Slow {
            MESSAGES_SENT.with_label_values(&["slow"]).inc();
            let total = options.timeout.unwrap_or(SLOW_TIMEOUT);
            return session::open_and_await(self.connector.as_ref(), envelope, total).await;
        }

        MESSAGES_SENT.with_label_values(&["fast"]).inc();
        let direct_timeout = options.timeout.unwrap_or_else(|| class.default_timeout());
        match self.attempt_one_shot(&envelope, direct_timeout).await? {
            DirectAttempt::Reply(reply) => Ok(reply),
            DirectAttempt::AckOnly | DirectAttempt::Failed => {
                debug!(
                    correlation_id = %envelope.correlation_id,
                    action = %envelope.action,
                    "direct path failed, falling back to persistent channel"
                );
                FALLBACKS_OPENED.inc();
                session::open_and_await(self.connector.as_ref(), envelope, SLOW_TIMEOUT).await
            }
        }
    }

    /// Send with bounded retries, backoff, and channel fallback.
    ///
    /// Attempts `0..=retries` on the one-shot primitive, each raced against
    /// `ack_timeout`. An ack-only response stops the retry loop early; the
    /// result is pending on the other side and only the fallback channel
    /// will deliver it. After the loop, one channel session bounded by
    /// `total_timeout`.
    pub async fn send_reliable(
        &self,
        envelope: Envelope,
        options: ReliableOptions,
    ) -> Result<Reply, SendError> {
        MESSAGES_SENT.with_label_values(&["fast"]).inc();
        for attempt in 0..=options.retries {
            match self.attempt_one_shot(&envelope, options.ack_timeout).await? {
                DirectAttempt::Reply(reply) => return Ok(reply),
                DirectAttempt::AckOnly => {
                    debug!(
                        correlation_id = %envelope.correlation_id,
                        attempt,
                        "skipping remaining retries, result pending on the other side"
                    );
                    break;
                }
                DirectAttempt::Failed => {
                    if attempt < options.retries {
                        let backoff = options.backoff_for(attempt);
                        debug!(
                            correlation_id = %envelope.correlation_id,
                            attempt,
                            backoff_ms = backoff.as_millis() as u64,
                            "one-shot attempt failed, backing off"
                        );
                        MESSAGES_RETRIED.inc();
                        sleep(backoff).await;
                    }
                }
            }
        }

        debug!(
            correlation_id = %envelope.correlation_id,
            action = %envelope.action,
            "retries exhausted, opening fallback channel"
        );
        FALLBACKS_OPENED.inc();
        session::open_and_await(self.connector.as_ref(), envelope, options.total_timeout).await
    }

    /// One direct-phase attempt. Only a context-invalidated transport
    /// failure escapes as an error; everything else is a retriable outcome.
    async fn attempt_one_shot(
        &self,
        envelope: &Envelope,
        attempt_timeout: Duration,
    ) -> Result<DirectAttempt, SendError> {
        match timeout(attempt_timeout, self.one_shot.send_once(envelope.clone())).await {
            Ok(Ok(OneShotResponse::Reply(reply))) => Ok(DirectAttempt::Reply(reply)),
            Ok(Ok(OneShotResponse::AckOnly { correlation_id })) => {
                warn!(
                    correlation_id = %correlation_id,
                    action = %envelope.action,
                    "ack-only response on the one-shot path"
                );
                Ok(DirectAttempt::AckOnly)
            }
            Ok(Err(err)) if err.is_context_invalidated() => {
                warn!(
                    correlation_id = %envelope.correlation_id,
                    "execution context invalidated, aborting without fallback"
                );
                Err(SendError::ContextInvalidated)
            }
            Ok(Err(err)) => {
                debug!(
                    correlation_id = %envelope.correlation_id,
                    error = %err,
                    "one-shot send failed"
                );
                Ok(DirectAttempt::Failed)
            }
            Err(_elapsed) => {
                debug!(
                    correlation_id = %envelope.correlation_id,
                    timeout_ms = attempt_timeout.as_millis() as u64,
                    "one-shot send timed out"
                );
                Ok(DirectAttempt::Failed)
            }
        }
    }
}

#[async_trait]
impl MessagingApi for Messenger {
    async fn send(&self, envelope: Envelope, options: SendOptions) -> Result<Reply, SendError> {
        Messenger::send(self, envelope, options).await
    }

    async fn send_reliable(
        &self,
        envelope: Envelope,
        options: ReliableOptions,
    ) -> Result<Reply, SendError> {
        Messenger::send_reliable(self, envelope, options).await
    }

    fn register_handler(&self, action: Action, handler: Arc<dyn Handler>) {
        self.registry.register(action, handler);
    }

    fn dispatch(&self, envelope: Envelope, sink: Arc<dyn ReplySink>) -> bool {
        let meta = SenderMeta::from_envelope(&envelope);
        self.registry.dispatch(envelope, meta, sink)
    }
}
