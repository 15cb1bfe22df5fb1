//! # Shared Messaging - Reliable Cross-Context Request/Response
//!
//! Turns two independently unreliable host primitives — a fire-and-forget
//! one-shot send and a persistent duplex channel — into a request/response
//! abstraction with retries, acknowledgement, timeout, and graceful fallback.
//!
//! ## Delivery Strategy
//!
//! ```text
//! ┌──────────┐  Envelope   ┌─────────────┐  FAST  ┌───────────────────┐
//! │  Caller  │ ──────────→ │ Classifier  │ ─────→ │ One-shot primitive │
//! └──────────┘             └─────────────┘        └─────────┬─────────┘
//!                                 │ SLOW                    │ timeout /
//!                                 ▼                         │ ack-only
//!                          ┌─────────────────┐              │
//!                          │ Channel Session │ ←────────────┘
//!                          │ (ACK → RESULT)  │     fallback
//!                          └─────────────────┘
//! ```
//!
//! On the coordinator side, the [`acceptor::ChannelAcceptor`] accepts inbound
//! channel connections, acknowledges every request frame immediately, gates
//! processing on coordinator readiness, and dispatches through the
//! [`registry::HandlerRegistry`].
//!
//! ## Guarantees
//!
//! - Every request settles exactly once: success reply, failure reply, or a
//!   typed [`shared_types::SendError`].
//! - Correlation is by id, never by position; frames with a mismatched id
//!   are ignored by the session that observes them.
//! - A context-invalidated transport error short-circuits retries and
//!   fallback: the execution context is gone and re-sending is futile.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod acceptor;
pub mod adapters;
pub mod classify;
pub mod ports;
pub mod readiness;
pub mod registry;
pub mod service;
pub mod session;

// Re-export main types
pub use acceptor::ChannelAcceptor;
pub use classify::{is_fast, is_slow, TransportClass};
pub use ports::inbound::MessagingApi;
pub use ports::outbound::{
    ChannelConnector, ChannelWriter, DuplexChannel, IncomingChannel, LifecycleObserver,
    OneShotResponse, OneShotTransport,
};
pub use readiness::ReadinessGate;
pub use registry::{handler_fn, Handler, HandlerOutcome, HandlerRegistry, ReplySink, SenderMeta};
pub use service::{Messenger, ReliableOptions, SendOptions};
pub use session::{ChannelSession, SessionState};

use std::time::Duration;

/// Purpose name of the generic request/response channel.
pub const SMART_MESSAGING_CHANNEL: &str = "smart-messaging";

/// Purpose name of the side panel lifecycle channel. Carries no
/// request/response protocol; its disconnect is the signal.
pub const SIDEPANEL_LIFECYCLE_CHANNEL: &str = "sidepanel-lifecycle";

/// Purpose name of the popup lifecycle channel.
pub const POPUP_LIFECYCLE_CHANNEL: &str = "popup-lifecycle";

/// Default timeout for fast-classified actions on the one-shot path.
pub const FAST_TIMEOUT: Duration = Duration::from_secs(3);

/// Default total timeout for slow-classified actions and the fallback phase.
pub const SLOW_TIMEOUT: Duration = Duration::from_secs(15);

/// Default per-attempt acknowledgement timeout for reliable delivery.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(1);

/// Default bounded attempt count for reliable delivery.
pub const DEFAULT_RETRIES: u32 = 2;

/// Maximum time the acceptor waits for the coordinator to become ready.
pub const READY_MAX_WAIT: Duration = Duration::from_secs(5);

/// Poll interval for the readiness wait.
pub const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);
