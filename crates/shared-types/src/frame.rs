//! # Channel Frames
//!
//! What actually travels on a persistent duplex channel. A request is sent as
//! the first frame; the receiving side acknowledges it with an ACK frame
//! (liveness only, never terminal) and later posts exactly one RESULT frame
//! carrying the reply.

use crate::envelope::{Envelope, Reply};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One frame on a persistent duplex channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Frame {
    /// A request envelope. Always the first frame a session sends.
    Request(Envelope),

    /// Liveness acknowledgement: the request was received but is not yet
    /// resolved. Never settles a session.
    #[serde(rename_all = "camelCase")]
    Ack {
        /// Echo of the request's correlation id.
        correlation_id: Uuid,
    },

    /// The final, terminal payload for a correlation id.
    Result(Reply),
}

impl Frame {
    /// The correlation id this frame refers to.
    #[must_use]
    pub fn correlation_id(&self) -> Uuid {
        match self {
            Self::Request(envelope) => envelope.correlation_id,
            Self::Ack { correlation_id } => *correlation_id,
            Self::Result(reply) => reply.correlation_id,
        }
    }
}
