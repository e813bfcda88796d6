//! TOML-based configuration for Tally.
//!
//! Example configuration:
//! ```toml
//! [profile]
//! dialect = "snowflake"
//! quoting = "when_required"   # or "always"
//! division = "case_guard"     # optional: nullif | case_guard | native
//! stage_comments = true
//!
//! [compile]
//! validate_output = true
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::compile::CompileOptions;
use crate::sql::DialectProfile;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Rendering profile.
    pub profile: DialectProfile,

    /// Compilation behavior.
    pub compile: CompileSettings,
}

/// Compilation settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CompileSettings {
    /// Re-parse rendered SQL before returning it.
    pub validate_output: bool,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        self.profile
            .validate()
            .map_err(|e| SettingsError::InvalidConfig(e.to_string()))
    }

    /// Options for [`crate::compile::compile_query`].
    pub fn into_options(self) -> CompileOptions {
        CompileOptions::new(self.profile).with_validation(self.compile.validate_output)
    }
}
