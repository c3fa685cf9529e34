//! Configuration errors

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use verserec_core::AppError;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a valid config file: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// One or more fields are out of range; the message lists them all
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No platform directory for configuration: {0}")]
    NoConfigDirectory(String),

    #[error("Preference store unavailable: {0}")]
    Unavailable(String),
}

impl ConfigError {
    pub(crate) fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        ConfigError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn invalid(errors: &[ValidationError]) -> Self {
        ConfigError::Invalid(describe(errors))
    }
}

/// A field that failed validation, e.g. `network.timeout_secs`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    /// Offending value, when it helps to show it
    pub found: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            found: None,
        }
    }

    pub fn with_found(mut self, value: impl fmt::Display) -> Self {
        self.found = Some(value.to_string());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.found {
            Some(found) => write!(f, "{} {}, found {}", self.field, self.message, found),
            None => write!(f, "{} {}", self.field, self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Joins validation errors into one line
pub(crate) fn describe(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config {
            message: err.to_string(),
        }
    }
}
