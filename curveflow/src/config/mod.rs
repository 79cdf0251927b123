//! Application configuration.
//!
//! [`AppConfig`] is a plain value that the caller loads and passes to the
//! pieces that need it. Settings are stored as JSON and can be addressed
//! by dot-path (`"offset.offset_distance"`), which is how a settings form
//! binds its fields.

mod file;

pub use file::ConfigFile;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

use crate::core::{Parameters, StageKind};
use crate::errors::{ConfigError, CurveflowError};

/// General application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Persist every `set` immediately when editing through a [`ConfigFile`].
    pub auto_save: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { auto_save: true }
    }
}

/// Workflow driving behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Advance to the next stage automatically after a successful step.
    pub auto_advance: bool,
}

/// Defaults for the loading stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputDefaults {
    /// Expected input file format.
    pub file_format: String,
}

impl Default for InputDefaults {
    fn default() -> Self {
        Self {
            file_format: "svg".to_string(),
        }
    }
}

/// Defaults for the optimization stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationDefaults {
    /// Optimization strength, 1-10.
    pub optimization_level: i64,
    /// Desired point count, 0 for no target.
    pub target_point_count: i64,
    /// Smoothing strength, 0-1.
    pub smoothness_factor: f64,
    /// Complexity reduction, 0-1.
    pub complexity_reduction: f64,
}

impl Default for OptimizationDefaults {
    fn default() -> Self {
        Self {
            optimization_level: 5,
            target_point_count: 0,
            smoothness_factor: 0.5,
            complexity_reduction: 0.3,
        }
    }
}

/// Defaults for the offset stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffsetDefaults {
    /// Offset distance in scene units.
    pub offset_distance: f64,
    /// Offset algorithm name understood by the deformer plugin.
    pub offset_algorithm: String,
    /// Quality level, 1-10.
    pub quality_level: i64,
    /// Corner treatment (`round`, `sharp`, `smooth`).
    pub corner_handling: String,
}

impl Default for OffsetDefaults {
    fn default() -> Self {
        Self {
            offset_distance: 1.0,
            offset_algorithm: "arc_segment".to_string(),
            quality_level: 5,
            corner_handling: "round".to_string(),
        }
    }
}

/// Defaults for the validation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationDefaults {
    /// Validation strictness.
    pub validation_level: String,
}

impl Default for ValidationDefaults {
    fn default() -> Self {
        Self {
            validation_level: "standard".to_string(),
        }
    }
}

/// Defaults for the export stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    /// Output file format.
    pub output_format: String,
    /// Output directory or file.
    pub output_path: String,
    /// Write run metadata next to the curves.
    pub include_metadata: bool,
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            output_format: "svg".to_string(),
            output_path: "output".to_string(),
            include_metadata: true,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, e.g. `info` or `curveflow=debug`.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// The full application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General settings.
    pub general: GeneralConfig,
    /// Workflow driving.
    pub workflow: WorkflowConfig,
    /// Loading stage defaults.
    pub input: InputDefaults,
    /// Optimization stage defaults.
    pub optimization: OptimizationDefaults,
    /// Offset stage defaults.
    pub offset: OffsetDefaults,
    /// Validation stage defaults.
    pub validation: ValidationDefaults,
    /// Export stage defaults.
    pub export: ExportDefaults,
    /// Logging.
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration from a JSON file.
    ///
    /// A missing file yields the defaults. Keys absent from the file keep
    /// their default values.
    pub fn load(path: &Path) -> Result<Self, CurveflowError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::File {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parses and validates configuration from a JSON string.
    pub fn from_json_str(text: &str) -> Result<Self, CurveflowError> {
        let config: Self = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), CurveflowError> {
        let file_error = |source| ConfigError::File {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(file_error)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(file_error)?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Checks that every stage default is within its declared range.
    pub fn validate(&self) -> Result<(), CurveflowError> {
        for kind in StageKind::ALL {
            kind.validate_parameters(&self.stage_defaults(kind))?;
        }
        Ok(())
    }

    /// Returns a setting by dot-path.
    pub fn get(&self, key: &str) -> Result<Value, CurveflowError> {
        let root = serde_json::to_value(self)?;
        key.split('.')
            .try_fold(&root, |node, part| node.get(part))
            .cloned()
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()).into())
    }

    /// Replaces a setting by dot-path.
    ///
    /// The path must already exist and the new value must keep the whole
    /// configuration valid.
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), CurveflowError> {
        let mut root = serde_json::to_value(&*self)?;
        let slot = key
            .split('.')
            .try_fold(&mut root, |node, part| node.get_mut(part))
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        *slot = value;

        let updated: Self =
            serde_json::from_value(root).map_err(|err| ConfigError::InvalidValue {
                key: key.to_string(),
                reason: err.to_string(),
            })?;
        updated.validate().map_err(|err| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: err.to_string(),
        })?;

        *self = updated;
        info!(key, "Configuration updated");
        Ok(())
    }

    /// Returns the default parameter bag for a stage with overrides applied.
    #[must_use]
    pub fn stage_defaults(&self, kind: StageKind) -> Parameters {
        let params = Parameters::new();
        match kind {
            StageKind::Load => params
                .with("file_path", "")
                .with("file_format", self.input.file_format.as_str()),
            StageKind::Optimize => params
                .with("optimization_level", self.optimization.optimization_level)
                .with("target_point_count", self.optimization.target_point_count)
                .with("smoothness_factor", self.optimization.smoothness_factor)
                .with("complexity_reduction", self.optimization.complexity_reduction),
            StageKind::Offset => params
                .with("offset_distance", self.offset.offset_distance)
                .with("offset_algorithm", self.offset.offset_algorithm.as_str())
                .with("quality_level", self.offset.quality_level)
                .with("corner_handling", self.offset.corner_handling.as_str()),
            StageKind::Validate => {
                params.with("validation_level", self.validation.validation_level.as_str())
            }
            StageKind::Export => params
                .with("output_format", self.export.output_format.as_str())
                .with("output_path", self.export.output_path.as_str())
                .with("include_metadata", self.export.include_metadata),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_defaults_match_stage_defaults() {
        let config = AppConfig::default();
        for kind in StageKind::ALL {
            assert_eq!(config.stage_defaults(kind), kind.default_parameters());
        }
    }

    #[test]
    fn test_unknown_settings_are_ignored() {
        let config = AppConfig::from_json_str(
            r#"{"general": {"language": "de", "max_recent_files": 3, "auto_save": false}}"#,
        )
        .unwrap();
        assert!(!config.general.auto_save);
        assert_eq!(config.workflow, WorkflowConfig::default());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            AppConfig::from_json_str(r#"{"offset": {"offset_distance": 2.5}}"#).unwrap();
        assert!((config.offset.offset_distance - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.offset.corner_handling, "round");
        assert_eq!(config.export, ExportDefaults::default());
    }

    #[test]
    fn test_invalid_range_rejected() {
        let result = AppConfig::from_json_str(r#"{"optimization": {"optimization_level": 42}}"#);
        assert!(matches!(result, Err(CurveflowError::Parameter(_))));
    }

    #[test]
    fn test_get_by_path() {
        let config = AppConfig::default();
        assert_eq!(config.get("offset.corner_handling").unwrap(), json!("round"));
        assert_eq!(config.get("general.auto_save").unwrap(), json!(true));
        assert!(matches!(
            config.get("offset.missing"),
            Err(CurveflowError::Config(ConfigError::UnknownKey(_)))
        ));
    }

    #[test]
    fn test_set_by_path() {
        let mut config = AppConfig::default();
        config.set("offset.offset_distance", json!(3.0)).unwrap();
        assert!((config.offset.offset_distance - 3.0).abs() < f64::EPSILON);
        assert_eq!(config.stage_defaults(StageKind::Offset).get_f64("offset_distance"), Some(3.0));
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = AppConfig::default();

        let wrong_type = config.set("offset.quality_level", json!("high"));
        assert!(matches!(
            wrong_type,
            Err(CurveflowError::Config(ConfigError::InvalidValue { .. }))
        ));

        let out_of_range = config.set("optimization.smoothness_factor", json!(2.0));
        assert!(out_of_range.is_err());

        let unknown = config.set("nope.value", json!(1));
        assert!(matches!(
            unknown,
            Err(CurveflowError::Config(ConfigError::UnknownKey(_)))
        ));

        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.export.output_format = "dxf".to_string();
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = AppConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded, AppConfig::default());
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            AppConfig::load(&path),
            Err(CurveflowError::Config(ConfigError::Parse(_)))
        ));
    }
}
