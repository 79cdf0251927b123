//! The per-stage record owned by the sequencer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Parameters, StageKind, StageStatus};

/// One stage of the workflow with its parameters and latest result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Which stage this is.
    pub kind: StageKind,
    /// Current status.
    pub status: StageStatus,
    /// Parameters handed to the handler. Survive a reset.
    pub parameters: Parameters,
    /// Payload returned by the handler on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Message returned by the handler (or the failure reason).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// When the handler was dispatched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the handler's completion was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Handler wall time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
}

impl Stage {
    /// Creates a pending stage with the kind's default parameters.
    #[must_use]
    pub fn new(kind: StageKind) -> Self {
        Self::with_parameters(kind, kind.default_parameters())
    }

    /// Creates a pending stage with the given parameters.
    #[must_use]
    pub fn with_parameters(kind: StageKind, parameters: Parameters) -> Self {
        Self {
            kind,
            status: StageStatus::Pending,
            parameters,
            result: None,
            message: None,
            started_at: None,
            ended_at: None,
            duration_ms: None,
        }
    }

    /// The stage's fixed identifier.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind.display_name()
    }

    /// The stage's description.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        self.kind.description()
    }

    /// Returns the stage to `Pending`, dropping run output but keeping parameters.
    pub fn reset(&mut self) {
        self.status = StageStatus::Pending;
        self.result = None;
        self.message = None;
        self.started_at = None;
        self.ended_at = None;
        self.duration_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stage_is_pending() {
        let stage = Stage::new(StageKind::Offset);
        assert_eq!(stage.status, StageStatus::Pending);
        assert_eq!(stage.name(), "Offset Curve Generation");
        assert!(stage.result.is_none());
        assert_eq!(stage.parameters.get_f64("offset_distance"), Some(1.0));
    }

    #[test]
    fn test_reset_keeps_parameters() {
        let mut stage = Stage::new(StageKind::Export);
        stage.parameters.insert_scalar("output_path", "/tmp/out");
        stage.status = StageStatus::Failed;
        stage.result = Some(serde_json::json!({"status": "error"}));
        stage.message = Some("disk full".to_string());
        stage.started_at = Some(Utc::now());

        stage.reset();

        assert_eq!(stage.status, StageStatus::Pending);
        assert!(stage.result.is_none());
        assert!(stage.message.is_none());
        assert!(stage.started_at.is_none());
        assert_eq!(stage.parameters.get_str("output_path"), Some("/tmp/out"));
    }
}
