//! Error types for geomdb operations

use thiserror::Error;

/// Main error type for geomdb operations
#[derive(Debug, Error)]
pub enum GeomError {
    /// A handle addressed a version that is no longer current
    #[error("stale reference: version {0} is no longer current")]
    StaleReference(u64),

    /// Entity, group, material, or binding not present
    #[error("not found: {0}")]
    NotFound(String),

    /// Structural misuse or degenerate geometric input
    #[error("invalid precondition: {0}")]
    InvalidPrecondition(String),

    /// Persisted document artifacts are missing or mutually inconsistent
    #[error("corrupt document: {0}")]
    CorruptDocument(String),

    /// Geometric kernel computation failed
    #[error("kernel computation failed: {0}")]
    Computation(String),

    /// Internal invariant violated (programming error, not retried)
    #[error("internal invariant violated: {0}")]
    Internal(String),

    /// IO error during document save/load
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error in the structural description
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GeomError {
    /// Shorthand for a `NotFound` error
    pub fn not_found(what: impl Into<String>) -> Self {
        GeomError::NotFound(what.into())
    }

    /// Shorthand for an `InvalidPrecondition` error
    pub fn precondition(what: impl Into<String>) -> Self {
        GeomError::InvalidPrecondition(what.into())
    }

    /// Shorthand for a `CorruptDocument` error
    pub fn corrupt(what: impl Into<String>) -> Self {
        GeomError::CorruptDocument(what.into())
    }
}

/// Result type alias for geomdb operations
pub type Result<T> = std::result::Result<T, GeomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GeomError::StaleReference(42);
        assert_eq!(
            err.to_string(),
            "stale reference: version 42 is no longer current"
        );
    }

    #[test]
    fn test_not_found_helper() {
        let err = GeomError::not_found("item 7");
        assert!(matches!(err, GeomError::NotFound(_)));
        assert_eq!(err.to_string(), "not found: item 7");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GeomError = io_err.into();
        assert!(matches!(err, GeomError::Io(_)));
    }
}
