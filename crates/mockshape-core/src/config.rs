//! Application configuration management.
//!
//! Handles loading, saving, and validating mockshape configuration:
//! - Descriptor attributes kept when merging schema chunks
//! - Envelope keys unwrapped before flattening
//! - Log level, format and optional log directory
//!
//! Every section is optional in the TOML file and falls back to its defaults.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::envelope::{EnvelopeCollapser, DEFAULT_ENVELOPE_KEYS};
use crate::merge::{PropertyMerger, DEFAULT_DESCRIPTOR_ATTRIBUTES, PATH_ATTRIBUTE};

/// Errors raised while loading, saving or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The configuration file could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    ReadError {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file could not be written.
    #[error("Failed to write {}: {source}", .path.display())]
    WriteError {
        /// File being written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for this configuration.
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("Failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// A field holds an invalid value.
    #[error("Invalid value for '{field}': {message}")]
    ValidationError {
        /// Dotted name of the offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// Several fields are invalid.
    #[error("{} configuration errors", .0.len())]
    MultipleValidationErrors(Vec<ConfigError>),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Schema chunk merging.
    pub merge: MergeConfig,

    /// Envelope collapsing.
    pub envelope: EnvelopeConfig,

    /// Logging output.
    pub logging: LoggingConfig,
}

/// `[merge]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Descriptor attributes kept in property descriptors.
    pub descriptor_attributes: Vec<String>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            descriptor_attributes: DEFAULT_DESCRIPTOR_ATTRIBUTES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// `[envelope]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Keys whose content is merged into the enclosing object.
    pub keys: Vec<String>,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            keys: DEFAULT_ENVELOPE_KEYS.iter().map(ToString::to_string).collect(),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when neither `RUST_LOG` nor `MOCKSHAPE_LOG_LEVEL` is set.
    pub level: String,

    /// Console output format.
    pub format: LogFormat,

    /// Directory for daily rolling JSON log files. Disabled when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::default(),
            directory: None,
        }
    }
}

/// Console log format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, colored.
    #[default]
    Pretty,
    /// Single-line, no colors.
    Compact,
    /// Structured JSON lines.
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
        })
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::ValidationError {
                field: "logging.format".to_string(),
                message: format!("unknown format '{other}' (expected pretty, compact or json)"),
            }),
        }
    }
}

impl Config {
    /// Load and validate configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, not valid TOML,
    /// or fails validation.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load configuration from `path`, or defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be loaded.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be serialized or written.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::WriteError {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::WriteError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Per-user configuration file location (`~/.config/mockshape/config.toml`
    /// on Linux).
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "mockshape")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Check every section, reporting all failures at once.
    ///
    /// # Errors
    ///
    /// Returns a single [`ConfigError::ValidationError`] or
    /// [`ConfigError::MultipleValidationErrors`].
    pub fn validate(&self) -> ConfigResult<()> {
        let mut errors = Vec::new();

        validate_names(
            "merge.descriptor_attributes",
            &self.merge.descriptor_attributes,
            &mut errors,
        );
        if self
            .merge
            .descriptor_attributes
            .iter()
            .any(|attribute| attribute == PATH_ATTRIBUTE)
        {
            errors.push(invalid(
                "merge.descriptor_attributes",
                "'path' is reserved for the node path",
            ));
        }

        validate_names("envelope.keys", &self.envelope.keys, &mut errors);

        if self.logging.level.parse::<tracing::Level>().is_err() {
            errors.push(invalid(
                "logging.level",
                &format!(
                    "unknown level '{}' (expected trace, debug, info, warn or error)",
                    self.logging.level
                ),
            ));
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ConfigError::MultipleValidationErrors(errors)),
        }
    }

    /// Property merger for the `[merge]` section.
    #[must_use]
    pub fn merger(&self) -> PropertyMerger {
        PropertyMerger::from_config(&self.merge)
    }

    /// Envelope collapser for the `[envelope]` section.
    #[must_use]
    pub fn collapser(&self) -> EnvelopeCollapser {
        EnvelopeCollapser::from_config(&self.envelope)
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn validate_names(field: &str, names: &[String], errors: &mut Vec<ConfigError>) {
    if names.is_empty() {
        errors.push(invalid(field, "must not be empty"));
        return;
    }
    if names.iter().any(|name| name.trim().is_empty()) {
        errors.push(invalid(field, "entries must not be blank"));
    }
    let mut seen = std::collections::BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            errors.push(invalid(field, &format!("duplicate entry '{name}'")));
        }
    }
}
