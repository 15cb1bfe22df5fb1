//! # Crosslink Test Suite
//!
//! Unified test crate for cross-context messaging flows.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/          # Cross-crate delivery flows
//!     ├── messaging_flows.rs    # Fast/slow paths over the loopback runtime
//!     └── reliability.rs        # Retry, fallback, correlation, lifecycle
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p crosslink-tests
//!
//! # By category
//! cargo test -p crosslink-tests integration::
//! ```

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
