//! # Adapters
//!
//! Implementations of the outbound ports. Only the in-memory host lives
//! here; real host bridges implement the same traits in their own crates.

pub mod memory;

pub use memory::{DispatchResponder, InMemoryHost, OneShotResponder, OneshotReplySink};
