//! A configuration bound to its file on disk.

use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::AppConfig;
use crate::errors::CurveflowError;

/// An [`AppConfig`] together with the path it persists to.
///
/// With `general.auto_save` enabled, every successful [`ConfigFile::set`]
/// writes the file immediately.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    config: AppConfig,
}

impl ConfigFile {
    /// Opens the file, writing the defaults out if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CurveflowError> {
        let path = path.into();
        let existed = path.exists();
        let config = AppConfig::load(&path)?;
        let file = Self { path, config };
        if !existed {
            file.save()?;
        }
        Ok(file)
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current configuration.
    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Returns a setting by dot-path.
    pub fn get(&self, key: &str) -> Result<Value, CurveflowError> {
        self.config.get(key)
    }

    /// Replaces a setting and saves when auto-save is on.
    ///
    /// Toggling `general.auto_save` itself is saved in both directions.
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), CurveflowError> {
        let was_auto_save = self.config.general.auto_save;
        self.config.set(key, value)?;
        if was_auto_save || self.config.general.auto_save {
            self.save()?;
        }
        Ok(())
    }

    /// Writes the configuration to its file.
    pub fn save(&self) -> Result<(), CurveflowError> {
        self.config.save(&self.path)
    }

    /// Re-reads the file, discarding unsaved changes.
    pub fn reload(&mut self) -> Result<(), CurveflowError> {
        self.config = AppConfig::load(&self.path)?;
        Ok(())
    }

    /// Restores every setting to its default and saves.
    pub fn reset_to_defaults(&mut self) -> Result<(), CurveflowError> {
        warn!(path = %self.path.display(), "Resetting configuration to defaults");
        self.config = AppConfig::default();
        self.save()
    }

    /// Writes a copy of the configuration somewhere else.
    pub fn export_to(&self, path: &Path) -> Result<(), CurveflowError> {
        self.config.save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_open_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings").join("config.json");

        let file = ConfigFile::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(file.config(), &AppConfig::default());
    }

    #[test]
    fn test_set_auto_saves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut file = ConfigFile::open(&path).unwrap();
        file.set("export.output_format", json!("dxf")).unwrap();

        let reopened = ConfigFile::open(&path).unwrap();
        assert_eq!(reopened.get("export.output_format").unwrap(), json!("dxf"));
    }

    #[test]
    fn test_set_without_auto_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut file = ConfigFile::open(&path).unwrap();
        file.set("general.auto_save", json!(false)).unwrap();
        file.set("offset.corner_handling", json!("sharp")).unwrap();

        file.reload().unwrap();
        assert_eq!(file.config().offset.corner_handling, "round");
        assert!(!file.config().general.auto_save);
    }

    #[test]
    fn test_enabling_auto_save_flushes_pending_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut file = ConfigFile::open(&path).unwrap();
        file.set("general.auto_save", json!(false)).unwrap();
        file.set("offset.corner_handling", json!("sharp")).unwrap();
        file.set("general.auto_save", json!(true)).unwrap();

        let reopened = ConfigFile::open(&path).unwrap();
        assert!(reopened.config().general.auto_save);
        assert_eq!(reopened.config().offset.corner_handling, "sharp");
    }

    #[test]
    fn test_reset_and_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let export_path = dir.path().join("backup.json");

        let mut file = ConfigFile::open(&path).unwrap();
        file.set("workflow.auto_advance", json!(true)).unwrap();
        file.export_to(&export_path).unwrap();
        file.reset_to_defaults().unwrap();

        assert!(!file.config().workflow.auto_advance);
        let exported = AppConfig::load(&export_path).unwrap();
        assert!(exported.workflow.auto_advance);
    }
}
