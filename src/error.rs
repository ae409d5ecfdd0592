use std::path::PathBuf;
use thiserror::Error;

/// Main error type for linetrace
///
/// Expected "no match" outcomes never surface here: a line without a
/// counterpart is an empty mapping entry, and a blame walk that runs out of
/// history reports the origin as unknown.
#[derive(Error, Debug)]
pub enum LinetraceError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Git repository access errors
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// Commit requested by the caller is not part of the history
    #[error("Commit not found in history: {id}")]
    CommitNotFound { id: String },

    /// Malformed line selection on the command line
    #[error("Invalid line specification: {0}")]
    InvalidLineSpec(String),
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for linetrace operations
pub type Result<T> = std::result::Result<T, LinetraceError>;
