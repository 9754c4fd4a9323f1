//! Error types for the chunked array store and its storage backends.

use thiserror::Error;

/// Errors that can occur opening or operating a [`crate::store::ChunkedStore`].
#[derive(Error, Debug)]
pub enum GridProcessorError {
    /// Failed to open the storage backend (e.g. connecting to S3).
    #[error("failed to open grid: {0}")]
    OpenFailed(String),

    /// Zarr group/array operation failed.
    #[error("storage error: {0}")]
    StorageError(String),

    /// Invalid backend configuration (e.g. a malformed S3 credential).
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl GridProcessorError {
    /// Create an `OpenFailed` error.
    pub fn open_failed(msg: impl Into<String>) -> Self {
        Self::OpenFailed(msg.into())
    }
}

impl From<std::io::Error> for GridProcessorError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for GridProcessorError {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigError(err.to_string())
    }
}

/// Result type for chunked store operations.
pub type Result<T> = std::result::Result<T, GridProcessorError>;
