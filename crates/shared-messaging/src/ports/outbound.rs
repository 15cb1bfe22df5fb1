//! # Outbound Ports - Host Transport Primitives
//!
//! The two unreliable primitives the host platform provides, plus the
//! lifecycle side-effect collaborator. The delivery layer builds its
//! guarantees on top of these; it never assumes more than their contracts:
//!
//! - The one-shot send is fire-and-forget with at most one response and may
//!   silently fail if no listener exists.
//! - The persistent channel is duplex and ordered per channel, but may
//!   disconnect at any moment, including mid-handler on the remote side.

use async_trait::async_trait;
use shared_types::{Envelope, Frame, Reply, TransportError};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::debug;
use uuid::Uuid;

/// Response observed on the one-shot primitive.
#[derive(Debug, Clone)]
pub enum OneShotResponse {
    /// A full result arrived (success or explicit error payload).
    Reply(Reply),
    /// Liveness acknowledgement without a final payload. The receiver is
    /// alive but the result is pending elsewhere.
    AckOnly {
        /// Echo of the request's correlation id.
        correlation_id: Uuid,
    },
}

/// The host's ephemeral one-shot send primitive.
#[async_trait]
pub trait OneShotTransport: Send + Sync {
    /// Send an envelope and await its immediate-or-soon response.
    async fn send_once(&self, envelope: Envelope) -> Result<OneShotResponse, TransportError>;
}

/// The host's persistent-channel connect primitive.
#[async_trait]
pub trait ChannelConnector: Send + Sync {
    /// Open a duplex channel tagged with a purpose name.
    async fn connect(&self, name: &str) -> Result<DuplexChannel, TransportError>;
}

/// Observer for UI-surface lifecycle channels. The disconnect of such a
/// channel is the significant signal: the surface is gone and any
/// long-running background activity associated with it should stop.
#[async_trait]
pub trait LifecycleObserver: Send + Sync {
    /// A lifecycle channel for `surface` connected.
    async fn surface_opened(&self, surface: &str);
    /// The lifecycle channel for `surface` disconnected.
    async fn surface_closed(&self, surface: &str);
}

/// One endpoint of a persistent duplex channel.
///
/// The `disconnected` flag flips once and is monotonic: no frame is written
/// after it is observed true. Writes are checked-then-attempted; a late
/// disconnect race loses the frame, which the protocol tolerates.
#[derive(Debug)]
pub struct DuplexChannel {
    name: String,
    tx: mpsc::UnboundedSender<Frame>,
    rx: mpsc::UnboundedReceiver<Frame>,
    closed_tx: Arc<watch::Sender<bool>>,
    closed_rx: watch::Receiver<bool>,
}

impl DuplexChannel {
    /// Create a connected pair of endpoints, one per side.
    #[must_use]
    pub fn pair(name: &str) -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        let (closed_tx, closed_rx) = watch::channel(false);
        let closed_tx = Arc::new(closed_tx);

        let initiator = Self {
            name: name.to_string(),
            tx: a_tx,
            rx: b_rx,
            closed_tx: closed_tx.clone(),
            closed_rx: closed_rx.clone(),
        };
        let acceptor = Self {
            name: name.to_string(),
            tx: b_tx,
            rx: a_rx,
            closed_tx,
            closed_rx,
        };
        (initiator, acceptor)
    }

    /// The purpose name this channel was opened with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True once either side has disconnected.
    #[must_use]
    pub fn is_disconnected(&self) -> bool {
        *self.closed_rx.borrow()
    }

    /// Write a frame. Checked-then-attempted: returns an error if the
    /// channel is already disconnected or the peer endpoint is gone.
    pub fn send(&self, frame: Frame) -> Result<(), TransportError> {
        if self.is_disconnected() {
            return Err(TransportError::Channel("channel disconnected".to_string()));
        }
        self.tx
            .send(frame)
            .map_err(|_| TransportError::Channel("peer endpoint dropped".to_string()))
    }

    /// Receive the next frame. Queued frames are drained before a
    /// disconnect is reported; `None` means the channel disconnected.
    pub async fn recv(&mut self) -> Option<Frame> {
        loop {
            tokio::select! {
                biased;
                frame = self.rx.recv() => return frame,
                changed = self.closed_rx.changed() => {
                    if changed.is_err() || *self.closed_rx.borrow() {
                        return None;
                    }
                }
            }
        }
    }

    /// Disconnect the channel. Idempotent; both endpoints observe it.
    pub fn disconnect(&self) {
        let _ = self.closed_tx.send(true);
    }

    /// A cloneable write half for replying from spawned tasks.
    #[must_use]
    pub fn writer(&self) -> ChannelWriter {
        ChannelWriter {
            name: self.name.clone(),
            tx: self.tx.clone(),
            closed_tx: self.closed_tx.clone(),
            closed_rx: self.closed_rx.clone(),
        }
    }
}

impl Drop for DuplexChannel {
    fn drop(&mut self) {
        // Dropping an endpoint disconnects the channel for both sides.
        let _ = self.closed_tx.send(true);
    }
}

/// Cloneable write half of a [`DuplexChannel`].
#[derive(Debug, Clone)]
pub struct ChannelWriter {
    name: String,
    tx: mpsc::UnboundedSender<Frame>,
    closed_tx: Arc<watch::Sender<bool>>,
    closed_rx: watch::Receiver<bool>,
}

impl ChannelWriter {
    /// The purpose name of the underlying channel.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True once either side has disconnected.
    #[must_use]
    pub fn is_disconnected(&self) -> bool {
        *self.closed_rx.borrow()
    }

    /// Write a frame, checked-then-attempted like [`DuplexChannel::send`].
    pub fn send(&self, frame: Frame) -> Result<(), TransportError> {
        if self.is_disconnected() {
            debug!(channel = %self.name, "skipping write on disconnected channel");
            return Err(TransportError::Channel("channel disconnected".to_string()));
        }
        self.tx
            .send(frame)
            .map_err(|_| TransportError::Channel("peer endpoint dropped".to_string()))
    }

    /// Disconnect the channel. Idempotent.
    pub fn disconnect(&self) {
        let _ = self.closed_tx.send(true);
    }
}

/// An inbound duplex connection handed to the coordinator-side acceptor.
#[derive(Debug)]
pub struct IncomingChannel {
    /// Purpose name declared by the connecting side.
    pub name: String,
    /// The acceptor-side endpoint.
    pub channel: DuplexChannel,
}
