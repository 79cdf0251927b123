//! Stage kind and status enums.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Parameters;

/// The five fixed stages of the curve workflow, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Load the input curve from disk.
    Load,
    /// Reduce and smooth the input curve.
    Optimize,
    /// Generate the offset curves.
    Offset,
    /// Check the generated curves.
    Validate,
    /// Write the results out.
    Export,
}

impl StageKind {
    /// All stage kinds in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Load,
        Self::Optimize,
        Self::Offset,
        Self::Validate,
        Self::Export,
    ];

    /// Number of stages in the pipeline.
    pub const COUNT: usize = Self::ALL.len();

    /// Returns the fixed human-readable stage identifier.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Load => "Input Curve Loading",
            Self::Optimize => "Input Curve Optimization",
            Self::Offset => "Offset Curve Generation",
            Self::Validate => "Result Validation",
            Self::Export => "Export Results",
        }
    }

    /// Returns the snake_case identifier used in events and serialized forms.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Optimize => "optimize",
            Self::Offset => "offset",
            Self::Validate => "validate",
            Self::Export => "export",
        }
    }

    /// Returns a short description of the stage's work.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Load => "Load the input curve file and check its format",
            Self::Optimize => "Simplify and smooth the input curve with the optimizer plugin",
            Self::Offset => "Generate offset curves with the offset deformer plugin",
            Self::Validate => "Check the resulting curves for quality issues",
            Self::Export => "Write the resulting curves and metadata",
        }
    }

    /// Returns the position of this stage in the pipeline.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Load => 0,
            Self::Optimize => 1,
            Self::Offset => 2,
            Self::Validate => 3,
            Self::Export => 4,
        }
    }

    /// Returns the stage at a pipeline position.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Parses a display name or snake_case id.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.display_name() == name || kind.id().eq_ignore_ascii_case(name))
    }

    /// Returns the default parameter bag for this stage.
    #[must_use]
    pub fn default_parameters(self) -> Parameters {
        let mut params = Parameters::new();
        match self {
            Self::Load => {
                params.insert_scalar("file_path", "");
                params.insert_scalar("file_format", "svg");
            }
            Self::Optimize => {
                params.insert_scalar("optimization_level", 5);
                params.insert_scalar("target_point_count", 0);
                params.insert_scalar("smoothness_factor", 0.5);
                params.insert_scalar("complexity_reduction", 0.3);
            }
            Self::Offset => {
                params.insert_scalar("offset_distance", 1.0);
                params.insert_scalar("offset_algorithm", "arc_segment");
                params.insert_scalar("quality_level", 5);
                params.insert_scalar("corner_handling", "round");
            }
            Self::Validate => {
                params.insert_scalar("validation_level", "standard");
            }
            Self::Export => {
                params.insert_scalar("output_format", "svg");
                params.insert_scalar("output_path", "output");
                params.insert_scalar("include_metadata", true);
            }
        }
        params
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for StageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown stage: {s}"))
    }
}

/// The execution status of a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage has not run in this workflow run.
    #[default]
    Pending,
    /// Stage handler is executing.
    Running,
    /// Stage handler succeeded.
    Completed,
    /// Stage handler failed.
    Failed,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl StageStatus {
    /// Returns true if the status represents a terminal state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// The overall status of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Not started, or reset.
    #[default]
    Idle,
    /// Stages are being executed.
    Running,
    /// Every stage completed.
    Completed,
    /// A stage failed.
    Failed,
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl WorkflowStatus {
    /// Returns true for `Completed` and `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_kind_order() {
        for (i, kind) in StageKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
            assert_eq!(StageKind::from_index(i), Some(*kind));
        }
        assert_eq!(StageKind::from_index(5), None);
        assert_eq!(StageKind::COUNT, 5);
    }

    #[test]
    fn test_stage_kind_display() {
        assert_eq!(StageKind::Load.to_string(), "Input Curve Loading");
        assert_eq!(StageKind::Optimize.to_string(), "Input Curve Optimization");
        assert_eq!(StageKind::Offset.to_string(), "Offset Curve Generation");
        assert_eq!(StageKind::Validate.to_string(), "Result Validation");
        assert_eq!(StageKind::Export.to_string(), "Export Results");
    }

    #[test]
    fn test_stage_kind_from_name() {
        assert_eq!(
            StageKind::from_name("Offset Curve Generation"),
            Some(StageKind::Offset)
        );
        assert_eq!(StageKind::from_name("export"), Some(StageKind::Export));
        assert_eq!("Result Validation".parse::<StageKind>(), Ok(StageKind::Validate));
        assert!(StageKind::from_name("Maya Integration").is_none());
    }

    #[test]
    fn test_default_parameters_cover_declared_keys() {
        let optimize = StageKind::Optimize.default_parameters();
        for key in [
            "optimization_level",
            "target_point_count",
            "smoothness_factor",
            "complexity_reduction",
        ] {
            assert!(optimize.contains_key(key), "missing {key}");
        }

        let export = StageKind::Export.default_parameters();
        assert_eq!(export.get_bool("include_metadata"), Some(true));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(StageStatus::Pending.to_string(), "pending");
        assert_eq!(StageStatus::Failed.to_string(), "failed");
        assert_eq!(WorkflowStatus::Idle.to_string(), "idle");
        assert_eq!(WorkflowStatus::Completed.to_string(), "completed");
    }

    #[test]
    fn test_status_is_terminal() {
        assert!(StageStatus::Completed.is_terminal());
        assert!(StageStatus::Failed.is_terminal());
        assert!(!StageStatus::Running.is_terminal());
        assert!(WorkflowStatus::Failed.is_terminal());
        assert!(!WorkflowStatus::Idle.is_terminal());
    }

    #[test]
    fn test_status_serialize() {
        let json = serde_json::to_string(&StageStatus::Completed).unwrap();
        assert_eq!(json, r#""completed""#);

        let kind: StageKind = serde_json::from_str(r#""offset""#).unwrap();
        assert_eq!(kind, StageKind::Offset);
    }
}
