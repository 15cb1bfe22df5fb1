//! Cross-crate integration flows for the messaging fabric.

pub mod messaging_flows;
pub mod reliability;
