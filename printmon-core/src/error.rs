//! Error types for printmon-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while locating or reading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, unreadable file, etc.).
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An explicitly requested settings file does not exist.
    #[error("settings file not found at {path}")]
    NotFound { path: PathBuf },

    /// YAML parse error; includes file path and line context from serde_yaml.
    #[error("failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
