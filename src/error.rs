//! Error types for a3s-pii

use thiserror::Error;

/// Errors raised while building rule tables or running a batch.
///
/// Classification itself never fails; only table construction and the
/// surrounding I/O can.
#[derive(Debug, Error)]
pub enum PiiError {
    /// A field rule carries a pattern that does not compile
    #[error("Invalid regex pattern for field '{field}': {reason}")]
    InvalidPattern { field: String, reason: String },

    /// Rule table or scan configuration is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Embedded payload is not a JSON object, or output is not valid text
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Input dataset does not exist
    #[error("file not found '{}'", .0.display())]
    InputNotFound(std::path::PathBuf),

    /// Input header is missing a required column
    #[error("Missing column '{0}' in input header")]
    MissingColumn(String),

    /// Filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for a3s-pii operations
pub type Result<T> = std::result::Result<T, PiiError>;
