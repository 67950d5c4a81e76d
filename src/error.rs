//! Error types for folder loading, decoding and the results file.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while opening a folder or touching its results file.
#[derive(Error, Debug)]
pub enum OverviewError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Folder does not exist
    #[error("Folder not found: {path:?}")]
    FolderNotFound {
        /// Path that was requested
        path: PathBuf,
    },

    /// Path exists but is a file
    #[error("Not a directory: {path:?}")]
    NotADirectory {
        /// Path that was requested
        path: PathBuf,
    },

    /// Results file could not be serialized
    #[error("Results error: {0}")]
    Results(#[from] serde_json::Error),
}

/// Errors produced by an image codec for a single file.
///
/// Always non-fatal: the affected item keeps its placeholder.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// File could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File could not be decoded
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Decoder produced an image with no pixels
    #[error("Decoded image is empty")]
    Empty,
}
