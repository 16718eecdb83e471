//! Error types for the Live Photo sorter
//!
//! This module defines the error types used throughout the application.
//! Batch-level metadata failures have their own type ([`crate::exif::BatchError`])
//! because they are handled as values inside the run loop, not propagated.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the Live Photo sorter
#[derive(Error, Debug)]
pub enum SortError {
    /// General I/O error with context
    #[error("IO error: {0}")]
    IoError(String),

    /// Destination directory could not be created
    #[error("Failed to create destination directory {path:?}: {message}")]
    DestinationError { path: PathBuf, message: String },

    /// Manifest serialization or write failed
    #[error("Manifest error: {0}")]
    ManifestError(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SortError>;

impl From<std::io::Error> for SortError {
    fn from(err: std::io::Error) -> Self {
        SortError::IoError(err.to_string())
    }
}
