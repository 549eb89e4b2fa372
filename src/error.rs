//! Error types for the cluster gather scanner

use thiserror::Error;

/// Result type for the scanner
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the scanner
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error: pattern file or output root missing/unreadable.
    /// Fatal to the whole run.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Kubernetes API error. Fatal to collection only.
    #[error("Kubernetes API error: {0}")]
    Kube(String),

    /// A single artifact could not be read. Recorded and skipped.
    #[error("Failed to read artifact {path}: {message}")]
    ArtifactRead { path: String, message: String },

    /// A single encoded fragment failed a decode stage. Recorded and skipped.
    #[error("Failed to decode fragment for '{target}': {message}")]
    Decode { target: String, message: String },

    /// Filesystem error while persisting outputs
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
