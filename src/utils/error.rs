//! Error types for the lungscan pipeline.

use thiserror::Error;

/// Main error type for the training pipeline.
///
/// Every failure mode is fatal for the run: errors are surfaced to the
/// caller and terminate the process with a non-zero exit code.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or processing error
    #[error("Image error: {0}")]
    Image(String),

    /// Configuration error (unreadable, malformed, or degenerate config)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Dataset error (missing directories, empty splits, class mismatches)
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Model construction or weight loading error
    #[error("Model error: {0}")]
    Model(String),

    /// Training error
    #[error("Training error: {0}")]
    Training(String),

    /// Checkpoint persistence error
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}

/// Specialized Result type for lungscan operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Config("missing key 'epochs'".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing key 'epochs'");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
