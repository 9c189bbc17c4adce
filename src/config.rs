//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/rsoutcome/rsoutcome.toml`
//! 3. Environment variables: `RSOUTCOME_*` prefix

use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Unified configuration for rsoutcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Component name stamped on exported documents
    pub component: String,
    /// Default provider for manually created outcome sets
    pub provider: Option<String>,
    /// Default region for manually created outcome sets
    pub region: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            component: "rsoutcome".to_string(),
            provider: None,
            region: None,
        }
    }
}

/// Get the XDG config directory for rsoutcome.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "rsoutcome").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("rsoutcome.toml"))
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/rsoutcome/rsoutcome.toml`
    /// 3. Environment variables: `RSOUTCOME_*` prefix
    pub fn load() -> Result<Self, ApplicationError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("component", defaults.component.clone())
            .map_err(config_err)?;

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                builder = builder.add_source(File::from(global_path).required(false));
            }
        }

        builder = builder.add_source(Environment::with_prefix("RSOUTCOME").separator("__"));

        let config = builder.build().map_err(config_err)?;
        config.try_deserialize().map_err(config_err)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# rsoutcome configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/rsoutcome/rsoutcome.toml
#   Env:    RSOUTCOME_* environment variables (explicit overrides)

# Component name stamped on exported documents
# component = "rsoutcome"

# Default provider for manually created outcome sets
# provider = "State Board of Education"

# Default region for manually created outcome sets
# region = "US-CA"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
