use std::path::PathBuf;

use thiserror::Error;

/// Main error type for Bloodline
#[derive(Error, Debug)]
pub enum BloodlineError {
    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Knowledge source transport or API errors (after retries)
    #[error("Knowledge source error: {0}")]
    Source(String),

    /// Malformed response payloads
    #[error("Parse error: {0}")]
    Parse(String),

    /// Edge or lookup referencing an id absent from the store.
    /// Programmer error: entities must be added before their edges.
    #[error("Entity not in store: {0}")]
    EntityMissing(String),

    /// Edge with identical endpoints
    #[error("Entity cannot relate to itself: {0}")]
    SelfEdge(String),

    /// Checkpoint file does not exist at load time
    #[error("Checkpoint not found: {0}")]
    CheckpointMissing(PathBuf),

    /// Checkpoint file exists but cannot be deserialized
    #[error("Checkpoint corrupt: {0}")]
    CheckpointCorrupt(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenient Result type using BloodlineError
pub type Result<T> = std::result::Result<T, BloodlineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BloodlineError::Config("Test error".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("Test error"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BloodlineError = io_err.into();
        assert!(matches!(err, BloodlineError::Io(_)));
    }

    #[test]
    fn test_checkpoint_errors_are_distinct() {
        let missing = BloodlineError::CheckpointMissing(PathBuf::from("graph_files/x.json"));
        let corrupt = BloodlineError::CheckpointCorrupt("unexpected EOF".to_string());
        assert!(missing.to_string().contains("not found"));
        assert!(corrupt.to_string().contains("corrupt"));
    }
}
