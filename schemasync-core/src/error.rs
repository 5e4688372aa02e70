//! Error types for schemasync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while assembling a [`crate::SyncConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required option was not supplied by flag, environment or file.
    #[error("missing required configuration '{key}'")]
    ConfigurationMissing { key: &'static str },

    /// `headers` was not a JSON object of string values.
    #[error(
        "'headers' must be a JSON object of the form {{\"header1\": \"value1\", \"header2\": \"value2\"}}, got: {input}"
    )]
    MalformedHeaders { input: String },

    /// An option was present but unusable.
    #[error("invalid configuration '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },

    /// The configuration file could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for [`crate::config::ConfigInput`].
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
