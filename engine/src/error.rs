//! Error types for the Taskline engine.

use thiserror::Error;

/// All possible errors from the Taskline engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The item is missing, tombstoned, or owned by another container.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid content: {0}")]
    InvalidContent(String),

    /// Malformed bulk-reorder input.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Positions are no longer dense after a mutation. Never expected in
    /// correct operation.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Failure reported by an `OrderStore` backend.
    #[error("store error: {0}")]
    Store(String),
}

impl Error {
    /// Whether the error was caused by caller input rather than engine or
    /// backend state.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::InvalidContent(_) | Error::InvalidRequest(_)
        )
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::NotFound("item item-7".into());
        assert_eq!(err.to_string(), "not found: item item-7");

        let err = Error::InvalidRequest("must include all items".into());
        assert_eq!(err.to_string(), "invalid request: must include all items");

        let err = Error::InvariantViolation("duplicate position 2".into());
        assert_eq!(err.to_string(), "invariant violation: duplicate position 2");
    }

    #[test]
    fn client_errors() {
        assert!(Error::NotFound("x".into()).is_client_error());
        assert!(Error::InvalidContent("x".into()).is_client_error());
        assert!(Error::InvalidRequest("x".into()).is_client_error());
        assert!(!Error::InvariantViolation("x".into()).is_client_error());
        assert!(!Error::Store("x".into()).is_client_error());
    }
}
