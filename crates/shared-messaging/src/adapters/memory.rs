//! # In-Memory Host
//!
//! In-process implementation of both host transport primitives, used by the
//! coordinator's loopback wiring and by the integration tests. The duplex
//! side pairs each `connect` with the acceptor's listener; the one-shot side
//! forwards to a registered responder and fails with `NoListener` when none
//! is installed, matching the host primitive's silent-failure mode.

use crate::ports::outbound::{
    ChannelConnector, DuplexChannel, IncomingChannel, OneShotResponse, OneShotTransport,
};
use crate::registry::{HandlerRegistry, ReplySink, SenderMeta};
use async_trait::async_trait;
use shared_types::{Envelope, Reply, SinkClosed, TransportError};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// The receiving end of the one-shot primitive.
#[async_trait]
pub trait OneShotResponder: Send + Sync {
    /// Produce the immediate-or-soon response for a one-shot send.
    async fn respond(&self, envelope: Envelope) -> Result<OneShotResponse, TransportError>;
}

/// In-process host: duplex connect plus one-shot send.
pub struct InMemoryHost {
    incoming_tx: mpsc::UnboundedSender<IncomingChannel>,
    responder: RwLock<Option<Arc<dyn OneShotResponder>>>,
}

impl InMemoryHost {
    /// Create the host and the listener feed for the channel acceptor.
    #[must_use]
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<IncomingChannel>) {
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                incoming_tx,
                responder: RwLock::new(None),
            }),
            incoming_rx,
        )
    }

    /// Install (or replace) the one-shot listener.
    pub fn set_one_shot_responder(&self, responder: Arc<dyn OneShotResponder>) {
        if let Ok(mut slot) = self.responder.write() {
            *slot = Some(responder);
        }
    }

    /// Remove the one-shot listener; subsequent sends fail with
    /// `NoListener`.
    pub fn clear_one_shot_responder(&self) {
        if let Ok(mut slot) = self.responder.write() {
            *slot = None;
        }
    }
}

#[async_trait]
impl ChannelConnector for InMemoryHost {
    async fn connect(&self, name: &str) -> Result<DuplexChannel, TransportError> {
        let (initiator, acceptor) = DuplexChannel::pair(name);
        self.incoming_tx
            .send(IncomingChannel {
                name: name.to_string(),
                channel: acceptor,
            })
            .map_err(|_| TransportError::Channel("coordinator listener closed".to_string()))?;
        debug!(channel = %name, "in-memory channel connected");
        Ok(initiator)
    }
}

#[async_trait]
impl OneShotTransport for InMemoryHost {
    async fn send_once(&self, envelope: Envelope) -> Result<OneShotResponse, TransportError> {
        let responder = self
            .responder
            .read()
            .ok()
            .and_then(|slot| slot.clone());
        match responder {
            Some(responder) => responder.respond(envelope).await,
            None => Err(TransportError::NoListener),
        }
    }
}

/// Reply sink backed by a oneshot channel; accepts exactly one reply.
pub struct OneshotReplySink {
    tx: Mutex<Option<oneshot::Sender<Reply>>>,
}

impl OneshotReplySink {
    /// Wrap a oneshot sender.
    #[must_use]
    pub fn new(tx: oneshot::Sender<Reply>) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
        }
    }
}

impl ReplySink for OneshotReplySink {
    fn send_reply(&self, reply: Reply) -> Result<(), SinkClosed> {
        let tx = self
            .tx
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
            .ok_or(SinkClosed)?;
        tx.send(reply).map_err(|_| SinkClosed)
    }
}

/// One-shot listener that feeds the handler registry, bridging immediate
/// and deferred handler results onto the single one-shot reply.
pub struct DispatchResponder {
    registry: Arc<HandlerRegistry>,
}

impl DispatchResponder {
    /// Serve one-shot sends from this registry.
    #[must_use]
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl OneShotResponder for DispatchResponder {
    async fn respond(&self, envelope: Envelope) -> Result<OneShotResponse, TransportError> {
        let (tx, rx) = oneshot::channel();
        let sink = Arc::new(OneshotReplySink::new(tx));
        let meta = SenderMeta::from_envelope(&envelope);
        self.registry.dispatch(envelope, meta, sink);
        rx.await
            .map(OneShotResponse::Reply)
            .map_err(|_| TransportError::Channel("reply path dropped".to_string()))
    }
}
