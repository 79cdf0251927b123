//! Error types for the curveflow workflow.
//!
//! Errors fall into two classes. A [`ProtocolError`] means the caller drove
//! the sequencer in an invalid order and should be surfaced immediately. A
//! [`StageExecutionError`] means a stage handler reported failure; it is
//! recorded on the stage and never retried automatically.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::core::{StageKind, WorkflowStatus};

/// The main error type for curveflow operations.
#[derive(Debug, Error)]
pub enum CurveflowError {
    /// The sequencer was driven in an invalid order.
    #[error("{0}")]
    Protocol(#[from] ProtocolError),

    /// A stage handler reported failure.
    #[error("{0}")]
    StageExecution(#[from] StageExecutionError),

    /// A parameter value was rejected.
    #[error("{0}")]
    Parameter(#[from] ParameterError),

    /// A configuration error.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Caller protocol violations.
///
/// These indicate a programming error in whoever drives the sequencer,
/// not a problem with curve data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The operation is not allowed in the current state.
    #[error("Invalid state for '{operation}': {detail} (workflow is {status})")]
    InvalidState {
        /// The operation that was attempted.
        operation: &'static str,
        /// The workflow status at the time of the call.
        status: WorkflowStatus,
        /// What was wrong.
        detail: String,
    },

    /// The current stage index is past the end of the pipeline.
    #[error("Stage index {index} out of range (stage count {count})")]
    OutOfRange {
        /// The offending index.
        index: usize,
        /// The number of stages.
        count: usize,
    },

    /// A worker completion arrived for a stage that is not running.
    #[error("Stale completion for stage {got} (running stage is {expected:?})")]
    StaleCompletion {
        /// The index of the stage currently running, if any.
        expected: Option<usize>,
        /// The index carried by the completion.
        got: usize,
    },
}

impl ProtocolError {
    /// Creates an invalid state error.
    #[must_use]
    pub fn invalid_state(
        operation: &'static str,
        status: WorkflowStatus,
        detail: impl Into<String>,
    ) -> Self {
        Self::InvalidState {
            operation,
            status,
            detail: detail.into(),
        }
    }

    /// Returns a stable error code for diagnostics.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidState { .. } => "PROTOCOL-INVALID-STATE",
            Self::OutOfRange { .. } => "PROTOCOL-OUT-OF-RANGE",
            Self::StaleCompletion { .. } => "PROTOCOL-STALE-COMPLETION",
        }
    }
}

/// A stage handler failure, recorded against the stage.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Stage '{stage}' failed: {message}")]
pub struct StageExecutionError {
    /// The stage that failed.
    pub stage: StageKind,
    /// The failure reason reported by the handler.
    pub message: String,
}

impl StageExecutionError {
    /// Creates a new stage execution error.
    #[must_use]
    pub fn new(stage: StageKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!("StageExecutionError"));
        map.insert("stage".to_string(), serde_json::json!(self.stage.display_name()));
        map.insert("message".to_string(), serde_json::json!(self.message));
        map
    }
}

/// Rejected stage parameter values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    /// Parameters must be scalars.
    #[error("Parameter '{key}' must be a scalar (bool, number, string or null)")]
    NotScalar {
        /// The parameter key.
        key: String,
    },

    /// The value has the wrong type.
    #[error("Parameter '{key}' of stage '{stage}' must be {expected}")]
    WrongType {
        /// The stage the parameter belongs to.
        stage: StageKind,
        /// The parameter key.
        key: String,
        /// A description of the expected type.
        expected: &'static str,
    },

    /// A numeric value is outside its allowed range.
    #[error("Parameter '{key}' of stage '{stage}' is {value}, expected {min}..={max}")]
    OutOfRange {
        /// The stage the parameter belongs to.
        stage: StageKind,
        /// The parameter key.
        key: String,
        /// The rejected value.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A dot-path does not name an existing setting.
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// A value could not be applied to a setting.
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue {
        /// The dot-path of the setting.
        key: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The configuration file could not be read or written.
    #[error("Config file {path}: {source}")]
    File {
        /// The file path.
        path: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON.
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result alias for curveflow operations.
pub type Result<T, E = CurveflowError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_message() {
        let err = ProtocolError::invalid_state("start", WorkflowStatus::Running, "already running");
        let msg = err.to_string();
        assert!(msg.contains("start"));
        assert!(msg.contains("running"));
        assert_eq!(err.code(), "PROTOCOL-INVALID-STATE");
    }

    #[test]
    fn test_out_of_range_message() {
        let err = ProtocolError::OutOfRange { index: 5, count: 5 };
        assert_eq!(err.to_string(), "Stage index 5 out of range (stage count 5)");
        assert_eq!(err.code(), "PROTOCOL-OUT-OF-RANGE");
    }

    #[test]
    fn test_stage_execution_error_to_dict() {
        let err = StageExecutionError::new(StageKind::Offset, "bad offset_distance");
        let dict = err.to_dict();

        assert_eq!(dict.get("type").unwrap(), "StageExecutionError");
        assert_eq!(dict.get("stage").unwrap(), "Offset Curve Generation");
        assert_eq!(dict.get("message").unwrap(), "bad offset_distance");
        assert!(err.to_string().contains("bad offset_distance"));
    }

    #[test]
    fn test_protocol_error_converts() {
        let err: CurveflowError = ProtocolError::OutOfRange { index: 7, count: 5 }.into();
        assert!(matches!(err, CurveflowError::Protocol(_)));
    }

    #[test]
    fn test_parameter_error_message() {
        let err = ParameterError::OutOfRange {
            stage: StageKind::Optimize,
            key: "optimization_level".to_string(),
            value: 11.0,
            min: 1.0,
            max: 10.0,
        };
        assert!(err.to_string().contains("optimization_level"));
        assert!(err.to_string().contains("Input Curve Optimization"));
    }
}
