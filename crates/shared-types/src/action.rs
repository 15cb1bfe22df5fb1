//! # Action Names
//!
//! Every request names the operation it wants as an `Action`. Known actions
//! are first-class enum variants so routing and classification are `match`
//! arms; unknown or extension actions are preserved verbatim in
//! `Action::Other` so feature modules can register handlers at runtime
//! without touching this crate.
//!
//! Actions serialize as their wire string (camelCase), matching what the
//! non-Rust contexts put on the wire.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// The operation a request asks for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// Liveness probe. Expected reply: `{"success":true,"message":"pong"}`.
    Ping,
    /// Read the coordinator's current state snapshot.
    GetState,
    /// Push a settings change to the coordinator.
    UpdateSettings,
    /// Stop any in-progress speech synthesis.
    StopSpeaking,
    /// Translate a text selection. Long-running.
    Translate,
    /// Capture the visible page. Long-running.
    CaptureScreen,
    /// Synthesize speech for a text selection. Long-running.
    Speak,
    /// Interactive element selection on the page. Long-running.
    SelectElement,
    /// An action this crate does not know about. Routed by its wire string.
    Other(String),
}

impl Action {
    /// Wire name for this action.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ping => "ping",
            Self::GetState => "getState",
            Self::UpdateSettings => "updateSettings",
            Self::StopSpeaking => "stopSpeaking",
            Self::Translate => "translate",
            Self::CaptureScreen => "captureScreen",
            Self::Speak => "speak",
            Self::SelectElement => "selectElement",
            Self::Other(name) => name,
        }
    }

    /// Parse a wire name, preserving unknown names in `Other`.
    #[must_use]
    pub fn from_wire(name: &str) -> Self {
        match name {
            "ping" => Self::Ping,
            "getState" => Self::GetState,
            "updateSettings" => Self::UpdateSettings,
            "stopSpeaking" => Self::StopSpeaking,
            "translate" => Self::Translate,
            "captureScreen" => Self::CaptureScreen,
            "speak" => Self::Speak,
            "selectElement" => Self::SelectElement,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Action {
    fn from(name: &str) -> Self {
        Self::from_wire(name)
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ActionVisitor;

        impl Visitor<'_> for ActionVisitor {
            type Value = Action;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an action name string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Action, E> {
                Ok(Action::from_wire(v))
            }
        }

        deserializer.deserialize_str(ActionVisitor)
    }
}
