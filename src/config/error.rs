//! Error types for configuration loading

use std::path::PathBuf;

use compact_str::CompactString;
use thiserror::Error;

/// Everything that can stop the configuration from loading.
///
/// All of these are fatal at startup; the server never runs on a partial
/// configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read configuration file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML
    #[error("Configuration is not valid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// One or more fields are missing, unknown or malformed
    #[error("Configuration is invalid:\n  {}", .errors.join("\n  "))]
    Validation { errors: Vec<String> },

    /// A token points at an environment variable that isn't set
    #[error("Given environment variable: {0} isn't set.")]
    MissingEnvironmentVariable(CompactString),

    /// The built-in schema itself failed to compile
    #[error("Configuration schema could not be compiled: {0}")]
    Schema(String),
}

impl ConfigError {
    /// Create an I/O error for the given configuration path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Create a validation error with a single message
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { errors: vec![message.into()] }
    }

    /// Create a validation error from a list of messages
    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self::Validation { errors }
    }

    pub fn missing_env(name: impl Into<CompactString>) -> Self {
        Self::MissingEnvironmentVariable(name.into())
    }

    /// Messages of a validation error; empty for other variants
    pub fn validation_messages(&self) -> &[String] {
        match self {
            ConfigError::Validation { errors } => errors,
            _ => &[],
        }
    }
}
