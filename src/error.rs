//! Error types for sqlkit.
//!
//! This module defines all error types using `thiserror`. Driver errors are
//! deliberately transparent: whatever `sqlx` reports for a failing statement
//! reaches the caller unmodified, with no wrapping, retry, or classification.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqlError {
    /// Closing (or inspecting) a connection name that was never created.
    /// Recoverable: the registry is unchanged when this is returned.
    #[error("connection not found: {name}")]
    ConnectionNotFound { name: String },

    /// A named placeholder in the template has no entry in the parameter
    /// map. Detected eagerly during binding so the message can name the
    /// offending placeholder instead of surfacing a cryptic driver error.
    #[error("missing bound parameter: :{name}")]
    MissingParameter { name: String },

    /// Any failure reported by the underlying driver: malformed SQL,
    /// constraint violations, connectivity, bad credentials. Propagated
    /// verbatim.
    #[error(transparent)]
    Driver(#[from] sqlx::Error),
}

impl SqlError {
    /// Create a connection-not-found error.
    pub fn connection_not_found(name: impl Into<String>) -> Self {
        Self::ConnectionNotFound { name: name.into() }
    }

    /// Create a missing-parameter error.
    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }
}

/// Result type alias for sqlkit operations.
pub type SqlResult<T> = Result<T, SqlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_not_found_display() {
        let err = SqlError::connection_not_found("reporting");
        assert_eq!(err.to_string(), "connection not found: reporting");
    }

    #[test]
    fn test_missing_parameter_display() {
        let err = SqlError::missing_parameter("user_id");
        assert_eq!(err.to_string(), "missing bound parameter: :user_id");
    }

    #[test]
    fn test_driver_error_is_transparent() {
        let err = SqlError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.to_string(), sqlx::Error::RowNotFound.to_string());
    }
}
