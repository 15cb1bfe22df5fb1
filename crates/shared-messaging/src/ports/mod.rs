//! # Ports
//!
//! Contracts at the subsystem boundary. Inbound ports are what other
//! subsystems call; outbound ports are the host primitives this subsystem
//! consumes.

pub mod inbound;
pub mod outbound;
