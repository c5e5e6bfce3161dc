//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/optset/optset.toml`
//! 3. Local config: file given with `--config`
//! 4. Environment variables: `OPTSET__*` (e.g. `OPTSET__LIMITS__MAX_OPTION_LENGTH`)

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{Limits, MAX_LEVEL_LENGTH, MAX_OPTION_LENGTH};

/// How imported trees are printed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Tree,
    Json,
}

/// Length limits for cleaned cells.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum characters kept from a header cell
    pub max_level_length: usize,
    /// Maximum characters kept from a data cell
    pub max_option_length: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_level_length: MAX_LEVEL_LENGTH,
            max_option_length: MAX_OPTION_LENGTH,
        }
    }
}

impl LimitsConfig {
    pub fn to_limits(&self) -> Limits {
        Limits {
            max_level_length: self.max_level_length,
            max_option_length: self.max_option_length,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// Raw settings for intermediate parsing (fields are Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub limits: RawLimits,
    pub output: RawOutput,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawLimits {
    pub max_level_length: Option<usize>,
    pub max_option_length: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawOutput {
    pub format: Option<OutputFormat>,
}

/// Unified configuration for optset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub limits: LimitsConfig,
    pub output: OutputConfig,
}

/// Get the XDG config directory for optset.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "optset").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("optset.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

/// Read one env override; an absent key is `None`, an unparsable value an error.
fn env_value<T: DeserializeOwned>(config: &Config, key: &str) -> Result<Option<T>, ApplicationError> {
    match config.get::<T>(key) {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(ApplicationError::Config {
            message: format!("OPTSET__{}: {}", key.to_uppercase().replace('.', "__"), e),
        }),
    }
}

impl Settings {
    /// Overlay wins for every field it specifies.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            limits: LimitsConfig {
                max_level_length: overlay
                    .limits
                    .max_level_length
                    .unwrap_or(self.limits.max_level_length),
                max_option_length: overlay
                    .limits
                    .max_option_length
                    .unwrap_or(self.limits.max_option_length),
            },
            output: OutputConfig {
                format: overlay.output.format.unwrap_or(self.output.format),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local` - Optional config file layered over the global one; must exist if given
    pub fn load(local: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config, if present
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Explicit local config
        if let Some(local_path) = local {
            let raw = load_raw_settings(local_path)?;
            current = current.merge_with(&raw);
        }

        // 4. Environment variables (explicit override)
        current = Self::apply_env_overrides(current)?;

        current.validate()?;
        Ok(current)
    }

    /// Apply OPTSET__* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let config = Config::builder()
            .add_source(Environment::with_prefix("OPTSET").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Some(val) = env_value::<usize>(&config, "limits.max_level_length")? {
            settings.limits.max_level_length = val;
        }
        if let Some(val) = env_value::<usize>(&config, "limits.max_option_length")? {
            settings.limits.max_option_length = val;
        }
        if let Some(val) = env_value::<String>(&config, "output.format")? {
            settings.output.format =
                OutputFormat::from_str(&val, true).map_err(|message| ApplicationError::Config {
                    message: format!("OPTSET__OUTPUT__FORMAT: {}", message),
                })?;
        }

        Ok(settings)
    }

    /// Reject limits that would blank every cell.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        if self.limits.max_level_length == 0 || self.limits.max_option_length == 0 {
            return Err(ApplicationError::Config {
                message: "length limits must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Render as TOML (for `config show`).
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: e.to_string(),
        })
    }
}
