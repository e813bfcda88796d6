//! Configuration module for Tally.
//!
//! Loads rendering and compilation settings from a TOML file.

mod settings;

pub use settings::{CompileSettings, Settings, SettingsError};
