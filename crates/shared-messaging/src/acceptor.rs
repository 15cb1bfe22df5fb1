//! # Channel Acceptor
//!
//! Coordinator-side handling of inbound persistent channel connections.
//!
//! Connections are classified by their declared purpose name:
//!
//! - The generic request/response purpose ([`crate::SMART_MESSAGING_CHANNEL`]):
//!   every inbound request frame is acknowledged immediately, gated on
//!   coordinator readiness, dispatched through the handler registry, and
//!   answered with a RESULT frame guarded against a channel that has since
//!   disconnected.
//! - Lifecycle purposes: frames are observed but never dispatched; the
//!   disconnect itself is the significant signal and is forwarded to the
//!   [`LifecycleObserver`].
//! - Anything else is ignored entirely.

use crate::ports::outbound::{ChannelWriter, DuplexChannel, IncomingChannel, LifecycleObserver};
use crate::readiness::ReadinessGate;
use crate::registry::{HandlerRegistry, ReplySink, SenderMeta};
use crate::{
    POPUP_LIFECYCLE_CHANNEL, READY_MAX_WAIT, READY_POLL_INTERVAL, SIDEPANEL_LIFECYCLE_CHANNEL,
    SMART_MESSAGING_CHANNEL,
};
use crosslink_telemetry::{CHANNELS_ACCEPTED, LIFECYCLE_DISCONNECTS};
use shared_types::{Frame, Reply, SinkClosed};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Reply sink that writes RESULT frames back through a channel, skipping
/// the write when the channel has disconnected in the meantime.
pub struct ChannelReplySink {
    writer: ChannelWriter,
}

impl ChannelReplySink {
    /// Wrap a channel write half.
    #[must_use]
    pub fn new(writer: ChannelWriter) -> Self {
        Self { writer }
    }
}

impl ReplySink for ChannelReplySink {
    fn send_reply(&self, reply: Reply) -> Result<(), SinkClosed> {
        if self.writer.is_disconnected() {
            // Disconnect observed mid-handler: the write is skipped, not
            // retried, not escalated.
            debug!(
                correlation_id = %reply.correlation_id,
                "result write skipped, channel disconnected"
            );
            return Err(SinkClosed);
        }
        self.writer
            .send(Frame::Result(reply))
            .map_err(|_| SinkClosed)
    }
}

/// Accepts inbound duplex connections and serves them by purpose.
pub struct ChannelAcceptor {
    registry: Arc<HandlerRegistry>,
    readiness: Arc<ReadinessGate>,
    lifecycle: Arc<dyn LifecycleObserver>,
    ready_max_wait: Duration,
    ready_poll_interval: Duration,
}

impl ChannelAcceptor {
    /// Create an acceptor with the default readiness bounds.
    #[must_use]
    pub fn new(
        registry: Arc<HandlerRegistry>,
        readiness: Arc<ReadinessGate>,
        lifecycle: Arc<dyn LifecycleObserver>,
    ) -> Self {
        Self {
            registry,
            readiness,
            lifecycle,
            ready_max_wait: READY_MAX_WAIT,
            ready_poll_interval: READY_POLL_INTERVAL,
        }
    }

    /// Override the readiness wait bounds.
    #[must_use]
    pub fn with_ready_bounds(mut self, max_wait: Duration, poll_interval: Duration) -> Self {
        self.ready_max_wait = max_wait;
        self.ready_poll_interval = poll_interval;
        self
    }

    /// Accept connections until the listener closes. Each connection is
    /// served on its own task; a slow request on one channel never blocks
    /// another channel.
    pub async fn run(self: Arc<Self>, mut incoming: mpsc::UnboundedReceiver<IncomingChannel>) {
        info!("channel acceptor running");
        while let Some(IncomingChannel { name, channel }) = incoming.recv().await {
            match name.as_str() {
                SMART_MESSAGING_CHANNEL => {
                    debug!(channel = %name, "generic channel accepted");
                    CHANNELS_ACCEPTED.with_label_values(&[SMART_MESSAGING_CHANNEL]).inc();
                    tokio::spawn(self.clone().serve_generic(channel));
                }
                SIDEPANEL_LIFECYCLE_CHANNEL | POPUP_LIFECYCLE_CHANNEL => {
                    CHANNELS_ACCEPTED.with_label_values(&[name.as_str()]).inc();
                    tokio::spawn(self.clone().serve_lifecycle(name, channel));
                }
                other => {
                    // Unrelated, unexpected persistent connections carry no
                    // protocol here; dropping the endpoint disconnects them.
                    warn!(channel = %other, "ignoring connection with unrecognized purpose");
                }
            }
        }
        debug!("channel acceptor stopped, listener closed");
    }

    async fn serve_generic(self: Arc<Self>, mut channel: DuplexChannel) {
        let writer = channel.writer();
        while let Some(frame) = channel.recv().await {
            let envelope = match frame {
                Frame::Request(envelope) => envelope,
                other => {
                    debug!(
                        correlation_id = %other.correlation_id(),
                        "non-request frame on generic channel ignored"
                    );
                    continue;
                }
            };
            let correlation_id = envelope.correlation_id;

            // Immediate ACK so the other end can distinguish "received but
            // still processing" from "never received."
            if writer.send(Frame::Ack { correlation_id }).is_err() {
                debug!(correlation_id = %correlation_id, "channel gone before ack");
                continue;
            }

            // Requests may arrive before the coordinator finished
            // initializing; give it a bounded chance to catch up.
            if !self.readiness.is_ready() {
                debug!(correlation_id = %correlation_id, "waiting for coordinator readiness");
                if !self
                    .readiness
                    .wait_ready(self.ready_max_wait, self.ready_poll_interval)
                    .await
                {
                    warn!(
                        correlation_id = %correlation_id,
                        action = %envelope.action,
                        "coordinator not ready, rejecting request"
                    );
                    let reply = Reply::failure(correlation_id, "coordinator not ready");
                    if writer.send(Frame::Result(reply)).is_err() {
                        debug!(correlation_id = %correlation_id, "channel gone before not-ready result");
                    }
                    continue;
                }
            }

            let meta = SenderMeta {
                context: envelope.sender,
                channel: Some(channel.name().to_string()),
            };
            let sink = Arc::new(ChannelReplySink::new(writer.clone()));
            let pending = self.registry.dispatch(envelope, meta, sink);
            if pending {
                debug!(
                    correlation_id = %correlation_id,
                    "deferred handler pending, reply path held open"
                );
            }
        }
        // Per-channel in-flight bookkeeping lives in the reply sinks, which
        // observe the disconnect themselves; nothing to tear down here.
        debug!(channel = SMART_MESSAGING_CHANNEL, "generic channel disconnected");
    }

    async fn serve_lifecycle(self: Arc<Self>, name: String, mut channel: DuplexChannel) {
        let surface = name
            .strip_suffix("-lifecycle")
            .unwrap_or(name.as_str())
            .to_string();
        info!(surface = %surface, "lifecycle channel connected");
        self.lifecycle.surface_opened(&surface).await;

        // Lifecycle channels never carry a dispatch/result protocol.
        while let Some(frame) = channel.recv().await {
            debug!(surface = %surface, frame = ?frame, "lifecycle frame observed");
        }

        info!(surface = %surface, "lifecycle channel disconnected");
        LIFECYCLE_DISCONNECTS.with_label_values(&[surface.as_str()]).inc();
        self.lifecycle.surface_closed(&surface).await;
    }
}
