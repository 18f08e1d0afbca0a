//! Error types for the dermaclass library.
//!
//! Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for dermaclass operations
#[derive(Error, Debug)]
pub enum DermaError {
    /// Error loading or decoding an image
    #[error("Failed to load image at '{0}': {1}")]
    ImageLoad(PathBuf, String),

    /// Error with dataset operations
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Error with model operations
    #[error("Model error: {0}")]
    Model(String),

    /// Error during training
    #[error("Training error: {0}")]
    Training(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model record save/load error
    #[error("Record error: {0}")]
    Record(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for dermaclass operations
pub type Result<T> = std::result::Result<T, DermaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DermaError::Dataset("no samples".to_string());
        assert_eq!(format!("{}", err), "Dataset error: no samples");
    }

    #[test]
    fn test_image_load_error_carries_path() {
        let path = PathBuf::from("/data/melanoma/img01.jpg");
        let err = DermaError::ImageLoad(path, "truncated file".to_string());
        assert!(format!("{}", err).contains("img01.jpg"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: DermaError = io.into();
        assert!(matches!(err, DermaError::Io(_)));
    }
}
