//! Read-only progress view of a workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{Parameters, Stage, StageKind, StageStatus, WorkflowStatus};

/// A point-in-time copy of the sequencer state for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    /// Overall workflow status.
    pub status: WorkflowStatus,
    /// Index of the stage being worked on (equals `total_steps` when done).
    pub current_step: usize,
    /// Number of stages.
    pub total_steps: usize,
    /// Id of the current run, if one has been started since the last reset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    /// Per-stage state in pipeline order.
    pub steps: Vec<StageSnapshot>,
}

/// One stage inside a [`WorkflowSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSnapshot {
    /// Stage kind.
    pub kind: StageKind,
    /// Fixed stage name.
    pub name: String,
    /// Stage description.
    pub description: String,
    /// Stage status.
    pub status: StageStatus,
    /// Stage parameters.
    pub parameters: Parameters,
    /// Handler payload, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Handler message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Dispatch time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Completion time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Handler wall time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
}

impl From<&Stage> for StageSnapshot {
    fn from(stage: &Stage) -> Self {
        Self {
            kind: stage.kind,
            name: stage.name().to_string(),
            description: stage.description().to_string(),
            status: stage.status,
            parameters: stage.parameters.clone(),
            result: stage.result.clone(),
            message: stage.message.clone(),
            started_at: stage.started_at,
            ended_at: stage.ended_at,
            duration_ms: stage.duration_ms,
        }
    }
}

impl WorkflowSnapshot {
    /// Statuses of every stage in order.
    #[must_use]
    pub fn stage_statuses(&self) -> Vec<StageStatus> {
        self.steps.iter().map(|s| s.status).collect()
    }

    /// Number of completed stages.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StageStatus::Completed)
            .count()
    }

    /// Fraction of stages completed, in `0.0..=1.0`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.total_steps == 0 {
            return 0.0;
        }
        self.completed_count() as f64 / self.total_steps as f64
    }

    /// The stage that failed, if any.
    #[must_use]
    pub fn failed_stage(&self) -> Option<&StageSnapshot> {
        self.steps.iter().find(|s| s.status == StageStatus::Failed)
    }
}
