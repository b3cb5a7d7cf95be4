//! Error types for settings loading, validation and persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading, validating or persisting server settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// File system error reading or writing the settings file.
    #[error("IO error accessing settings at {path}: {source}")]
    Io {
        /// The settings file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The settings file exists but is not valid JSON for the expected shape.
    #[error("malformed settings file at {path}: {source}")]
    Parse {
        /// The settings file path that failed to parse.
        path: PathBuf,
        /// The underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// The settings failed validation and must not be persisted or used.
    #[error("invalid server settings: {}", issues.join(", "))]
    Invalid {
        /// Human-readable validation issues, one per problem found.
        issues: Vec<String>,
    },

    /// No settings directory could be resolved for the current environment.
    #[error("could not determine a configuration directory (set XDG_CONFIG_HOME or HOME)")]
    NoConfigDir,
}
