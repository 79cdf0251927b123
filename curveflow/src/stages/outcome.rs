//! What a stage handler hands back to the sequencer.

use serde::{Deserialize, Serialize};

/// The result of one handler invocation.
///
/// Mirrors the external handler contract: a success flag, an optional
/// opaque payload and a human-readable message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerOutcome {
    /// Whether the stage succeeded.
    pub success: bool,
    /// Payload stored on the stage when successful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Status or failure message.
    #[serde(default)]
    pub message: String,
}

impl HandlerOutcome {
    /// Creates a successful outcome with a payload.
    #[must_use]
    pub fn ok(result: serde_json::Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            message: String::new(),
        }
    }

    /// Creates a successful outcome with no payload.
    #[must_use]
    pub fn ok_empty() -> Self {
        Self {
            success: true,
            result: None,
            message: String::new(),
        }
    }

    /// Creates a failed outcome.
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            message: message.into(),
        }
    }

    /// Sets the message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attaches a payload, e.g. partial output on failure.
    #[must_use]
    pub fn with_result(mut self, result: serde_json::Value) -> Self {
        self.result = Some(result);
        self
    }
}

impl Default for HandlerOutcome {
    fn default() -> Self {
        Self::ok_empty()
    }
}
