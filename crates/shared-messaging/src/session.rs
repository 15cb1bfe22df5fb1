//! # Persistent Channel Session
//!
//! One request over one persistent duplex channel: open, send the envelope
//! as the first frame, then race an ACK frame followed by a RESULT frame
//! against a total timeout and the channel's disconnect.
//!
//! ## State Machine
//!
//! ```text
//! OPEN ──ACK(id)──→ ACK_RECEIVED ──RESULT(id)──→ RESOLVED (terminal)
//!   │                    │
//!   ├──RESULT(id)────────┼──────────────────────→ RESOLVED (terminal)
//!   │                    │
//!   └──disconnect / total timeout───────────────→ FAILED   (terminal)
//! ```
//!
//! Exactly one terminal transition occurs per session; later events for the
//! same correlation id are ignored. Frames with a mismatched correlation id
//! are ignored in any state.

use crate::ports::outbound::ChannelConnector;
use crate::SMART_MESSAGING_CHANNEL;
use shared_types::{Envelope, Frame, Reply, SendError};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Session progress. `Resolved` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Envelope sent, nothing observed yet.
    Open,
    /// ACK observed. Purely informational; does not resolve.
    AckReceived,
    /// RESULT observed. Terminal.
    Resolved,
    /// Disconnected or timed out before a RESULT. Terminal.
    Failed,
}

/// Tracks one request's progress on a persistent channel.
///
/// The session is the single owner of its state; the driving loop feeds it
/// events and it guarantees at most one terminal transition.
#[derive(Debug)]
pub struct ChannelSession {
    correlation_id: Uuid,
    state: SessionState,
}

impl ChannelSession {
    /// Start tracking a request by its correlation id.
    #[must_use]
    pub fn new(correlation_id: Uuid) -> Self {
        Self {
            correlation_id,
            state: SessionState::Open,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True once the session has settled.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, SessionState::Resolved | SessionState::Failed)
    }

    /// Feed an inbound frame. Returns the reply when this frame resolves
    /// the session; frames for other correlation ids and post-terminal
    /// frames are ignored.
    pub fn on_frame(&mut self, frame: Frame) -> Option<Reply> {
        if self.is_terminal() {
            debug!(
                correlation_id = %self.correlation_id,
                "frame after terminal state ignored"
            );
            return None;
        }
        if frame.correlation_id() != self.correlation_id {
            debug!(
                expected = %self.correlation_id,
                received = %frame.correlation_id(),
                "frame with mismatched correlation id ignored"
            );
            return None;
        }
        match frame {
            Frame::Ack { .. } => {
                self.state = SessionState::AckReceived;
                debug!(correlation_id = %self.correlation_id, "ack received");
                None
            }
            Frame::Result(reply) => {
                self.state = SessionState::Resolved;
                Some(reply)
            }
            Frame::Request(_) => {
                // Only the acceptor side sees requests.
                warn!(
                    correlation_id = %self.correlation_id,
                    "unexpected request frame on initiator side ignored"
                );
                None
            }
        }
    }

    /// The channel disconnected. Returns the failure if this settles the
    /// session.
    pub fn on_disconnect(&mut self) -> Option<SendError> {
        if self.is_terminal() {
            return None;
        }
        self.state = SessionState::Failed;
        Some(SendError::DisconnectedBeforeResponse)
    }

    /// The total timeout fired. Returns the failure if this settles the
    /// session.
    pub fn on_timeout(&mut self, total_timeout: Duration) -> Option<SendError> {
        if self.is_terminal() {
            return None;
        }
        self.state = SessionState::Failed;
        Some(SendError::TotalTimeout {
            timeout_ms: u64::try_from(total_timeout.as_millis()).unwrap_or(u64::MAX),
        })
    }
}

/// Open a channel, post the envelope, and await its RESULT bounded by
/// `total_timeout`.
///
/// The channel is closed on any terminal transition; a session only reacts
/// to frames for the request it opened.
pub async fn open_and_await(
    connector: &dyn ChannelConnector,
    envelope: Envelope,
    total_timeout: Duration,
) -> Result<Reply, SendError> {
    let mut channel = connector
        .connect(SMART_MESSAGING_CHANNEL)
        .await
        .map_err(SendError::from)?;

    let mut session = ChannelSession::new(envelope.correlation_id);
    debug!(
        correlation_id = %envelope.correlation_id,
        action = %envelope.action,
        "channel session opened"
    );

    channel
        .send(Frame::Request(envelope))
        .map_err(SendError::from)?;

    let deadline = tokio::time::sleep(total_timeout);
    tokio::pin!(deadline);

    let outcome = loop {
        tokio::select! {
            frame = channel.recv() => match frame {
                Some(frame) => {
                    if let Some(reply) = session.on_frame(frame) {
                        break Ok(reply);
                    }
                }
                None => {
                    if let Some(err) = session.on_disconnect() {
                        break Err(err);
                    }
                }
            },
            () = &mut deadline => {
                if let Some(err) = session.on_timeout(total_timeout) {
                    break Err(err);
                }
            }
        }
    };

    // Terminal transition: deregister and close. The disconnect is
    // idempotent, so a race with the remote side is harmless.
    channel.disconnect();
    match &outcome {
        Ok(_) => debug!(state = ?session.state(), "channel session resolved"),
        Err(err) => debug!(state = ?session.state(), error = %err, "channel session failed"),
    }
    outcome
}
