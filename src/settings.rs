//! Program settings, read from `settings.toml` in the user's configuration directory.
use crate::get_powerplan_config_dir;
use crate::input::read_toml;
use crate::log::{DEFAULT_LOG_LEVEL, parse_log_level};
use anyhow::{Context, Result};
use documented::DocumentedFields;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};

const SETTINGS_FILE_NAME: &str = "settings.toml";

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Where the settings file is read from
pub fn get_settings_file_path() -> PathBuf {
    get_powerplan_config_dir().join(SETTINGS_FILE_NAME)
}

/// Program settings which apply to every model run
#[derive(Debug, DocumentedFields, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Log level for messages printed to the console (off, error, warn, info, debug or trace).
    /// The POWERPLAN_LOG_LEVEL environment variable takes precedence.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Whether to replace an existing output folder without passing --overwrite
    #[serde(default)]
    pub overwrite: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            overwrite: false,
        }
    }
}

impl Settings {
    /// Load settings from the user's settings file, or use defaults if there is none
    pub fn load() -> Result<Settings> {
        Self::load_from_path(&get_settings_file_path())
    }

    fn load_from_path(file_path: &Path) -> Result<Settings> {
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        let settings: Settings = read_toml(file_path)?;
        parse_log_level(&settings.log_level)
            .with_context(|| format!("Invalid log_level in {}", file_path.display()))?;

        Ok(settings)
    }

    /// A settings file with every setting commented out at its default value
    pub fn default_file_contents() -> Result<String> {
        let defaults = toml::to_string(&Settings::default())
            .context("Could not convert settings to TOML")?;
        let defaults: toml::Table = toml::from_str(&defaults)?;

        let mut out = String::from(
            "# Settings for powerplan\n# Uncomment a line to change a setting from its default\n",
        );
        for (key, value) in &defaults {
            let docs = Settings::get_field_docs(key)
                .ok()
                .with_context(|| format!("No documentation for setting {key}"))?;
            writeln!(out)?;
            for line in docs.lines() {
                writeln!(out, "# {}", line.trim())?;
            }
            writeln!(out, "# {key} = {value}")?;
        }

        Ok(out)
    }
}
