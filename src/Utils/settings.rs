//! Session configuration read from a TOML file.
//!
//! ```toml
//! [session]
//! history_limit = 10
//! undo_limit = 20
//!
//! [logging]
//! level = "info"
//! log_to_file = false
//!
//! [catalog]
//! path = "symbols.toml"
//! include_builtin = true
//! ```
//! Every key is optional.
use crate::formula::errors::FormulaError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// most recent formulas kept in the history
    pub history_limit: usize,
    /// deepest undo stack
    pub undo_limit: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            history_limit: 10,
            undo_limit: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub log_to_file: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: "info".to_string(),
            log_to_file: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub include_builtin: bool,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        CatalogSettings {
            path: None,
            include_builtin: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub session: SessionSettings,
    pub logging: LoggingSettings,
    pub catalog: CatalogSettings,
}

impl Settings {
    pub fn from_toml_str(content: &str) -> Result<Settings, FormulaError> {
        let settings: Settings = toml::from_str(content)
            .map_err(|e| FormulaError::Config(format!("invalid settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads the settings file; a missing file gives the defaults. A relative catalog
    /// path is resolved against the directory of the settings file.
    pub fn from_file(path: &Path) -> Result<Settings, FormulaError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("no settings file at {}, using defaults", path.display());
                return Ok(Settings::default());
            }
            Err(e) => {
                return Err(FormulaError::Config(format!(
                    "cannot read settings {}: {}",
                    path.display(),
                    e
                )));
            }
        };
        let mut settings = Settings::from_toml_str(&content)?;
        if let (Some(catalog), Some(dir)) = (&settings.catalog.path, path.parent()) {
            if catalog.is_relative() {
                settings.catalog.path = Some(dir.join(catalog));
            }
        }
        Ok(settings)
    }

    fn validate(&self) -> Result<(), FormulaError> {
        if self.session.history_limit == 0 {
            return Err(FormulaError::Config(
                "session.history_limit must be at least 1".to_string(),
            ));
        }
        if self.session.undo_limit == 0 {
            return Err(FormulaError::Config(
                "session.undo_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.session.history_limit, 10);
        assert_eq!(settings.session.undo_limit, 20);
        assert!(settings.catalog.include_builtin);
    }

    #[test]
    fn test_partial_tables_keep_other_defaults() {
        let settings = Settings::from_toml_str("[session]\nundo_limit = 5\n").unwrap();
        assert_eq!(settings.session.undo_limit, 5);
        assert_eq!(settings.session.history_limit, 10);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_zero_limit_is_rejected() {
        let err = Settings::from_toml_str("[session]\nhistory_limit = 0\n").unwrap_err();
        assert!(matches!(err, FormulaError::Config(_)));
    }

    #[test]
    fn test_malformed_toml_is_rejected() {
        assert!(Settings::from_toml_str("[session\n").is_err());
        assert!(Settings::from_toml_str("[session]\nhistory_limit = \"ten\"\n").is_err());
    }

    #[test]
    fn test_from_file_resolves_catalog_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("formula.toml");
        fs::write(
            &path,
            "[logging]\nlevel = \"debug\"\n[catalog]\npath = \"symbols.toml\"\n",
        )
        .unwrap();
        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.catalog.path, Some(dir.path().join("symbols.toml")));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let settings = Settings::default();
        let text = toml::to_string_pretty(&settings).unwrap();
        assert_eq!(Settings::from_toml_str(&text).unwrap(), settings);
    }
}
