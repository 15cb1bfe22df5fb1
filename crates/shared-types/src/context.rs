//! # Execution Context Tags
//!
//! Identifies which kind of isolated execution context originated a message.
//! Contexts cannot share memory; the tag is carried on every envelope so the
//! receiver can log and authorize without out-of-band state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of execution context that originated a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContextKind {
    /// The long-lived coordinator context.
    Coordinator,
    /// A per-page injected context.
    Page,
    /// The popup UI surface.
    Popup,
    /// The side panel UI surface.
    SidePanel,
    /// The options UI surface.
    Options,
}

impl ContextKind {
    /// Wire name for this context kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Coordinator => "coordinator",
            Self::Page => "page",
            Self::Popup => "popup",
            Self::SidePanel => "sidePanel",
            Self::Options => "options",
        }
    }

    /// True for the UI surfaces (popup, side panel, options).
    #[must_use]
    pub fn is_ui_surface(&self) -> bool {
        matches!(self, Self::Popup | Self::SidePanel | Self::Options)
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(ContextKind::Coordinator.as_str(), "coordinator");
        assert_eq!(ContextKind::SidePanel.as_str(), "sidePanel");
    }

    #[test]
    fn test_ui_surface_split() {
        assert!(ContextKind::Popup.is_ui_surface());
        assert!(ContextKind::SidePanel.is_ui_surface());
        assert!(!ContextKind::Coordinator.is_ui_surface());
        assert!(!ContextKind::Page.is_ui_surface());
    }

    #[test]
    fn test_serde_round_trip() {
        let json = serde_json::to_string(&ContextKind::SidePanel).unwrap();
        assert_eq!(json, "\"sidePanel\"");
        let back: ContextKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ContextKind::SidePanel);
    }
}
