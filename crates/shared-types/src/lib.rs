//! # Shared Types Crate
//!
//! This crate contains the message envelope, channel frame types, action
//! names, and the error taxonomy shared by every Crosslink execution context.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-context wire types are defined here.
//! - **Envelope Integrity**: The `Envelope` is the sole wrapper for every
//!   request travelling between contexts.
//! - **Correlation Authority**: Replies MUST echo the request's
//!   `correlation_id`; the id is generated exactly once, by the sender.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod action;
pub mod context;
pub mod envelope;
pub mod errors;
pub mod frame;

pub use action::Action;
pub use context::ContextKind;
pub use envelope::{Envelope, Reply, PROTOCOL_VERSION};
pub use errors::{SendError, SinkClosed, TransportError};
pub use frame::Frame;
