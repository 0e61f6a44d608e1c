//! Error types for db-charter.
//!
//! One variant per failure kind in the error taxonomy. Every variant
//! carries the original message text so SQL authors (human or LLM) can
//! self-correct; the kind string is stable for programmatic branching.

use thiserror::Error;

/// Main error type for db-charter operations.
#[derive(Error, Debug)]
pub enum CharterError {
    /// Malformed or missing connection configuration. Not retryable
    /// until the caller fixes the input.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credentials rejected by the server.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Network or host failure while establishing a connection.
    #[error("Unreachable: {0}")]
    Unreachable(String),

    /// Embedded database file unwritable, missing, or corrupt.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Named table absent from the catalog at call time.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend rejected the statement at parse time.
    #[error("SQL syntax error: {0}")]
    Syntax(String),

    /// The statement parsed but failed at runtime (missing table or
    /// column, type mismatch, constraint violation).
    #[error("Execution error: {0}")]
    Execution(String),

    /// The connection handle became invalid mid-execution. The caller
    /// must reconnect before further use.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// The result contains a value type that cannot cross the
    /// normalization boundary (binary/blob data).
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// A chart request named a column absent from the query result.
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Chart request invalid for reasons other than a missing column.
    #[error("Chart error: {0}")]
    Chart(String),
}

impl CharterError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an authentication error with the given message.
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Creates an unreachable error with the given message.
    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::Unreachable(msg.into())
    }

    /// Creates a storage error with the given message.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Creates a not-found error with the given message.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Creates a syntax error with the given message.
    pub fn syntax(msg: impl Into<String>) -> Self {
        Self::Syntax(msg.into())
    }

    /// Creates an execution error with the given message.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Creates a connection-lost error with the given message.
    pub fn connection_lost(msg: impl Into<String>) -> Self {
        Self::ConnectionLost(msg.into())
    }

    /// Creates an unsupported-type error with the given message.
    pub fn unsupported_type(msg: impl Into<String>) -> Self {
        Self::UnsupportedType(msg.into())
    }

    /// Creates a column-not-found error with the given message.
    pub fn column_not_found(msg: impl Into<String>) -> Self {
        Self::ColumnNotFound(msg.into())
    }

    /// Creates a chart error with the given message.
    pub fn chart(msg: impl Into<String>) -> Self {
        Self::Chart(msg.into())
    }

    /// Returns the stable kind string used in error envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "ConfigError",
            Self::Auth(_) => "AuthError",
            Self::Unreachable(_) => "UnreachableError",
            Self::Storage(_) => "StorageError",
            Self::NotFound(_) => "NotFoundError",
            Self::Syntax(_) => "SyntaxError",
            Self::Execution(_) => "ExecutionError",
            Self::ConnectionLost(_) => "ConnectionLostError",
            Self::UnsupportedType(_) => "UnsupportedTypeError",
            Self::ColumnNotFound(_) => "ColumnNotFoundError",
            Self::Chart(_) => "ChartError",
        }
    }

    /// Returns the message text without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Config(m)
            | Self::Auth(m)
            | Self::Unreachable(m)
            | Self::Storage(m)
            | Self::NotFound(m)
            | Self::Syntax(m)
            | Self::Execution(m)
            | Self::ConnectionLost(m)
            | Self::UnsupportedType(m)
            | Self::ColumnNotFound(m)
            | Self::Chart(m) => m,
        }
    }
}

/// Result type alias using CharterError.
pub type Result<T> = std::result::Result<T, CharterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config() {
        let err = CharterError::config("missing field 'path' for sqlite backend");
        assert_eq!(
            err.to_string(),
            "Configuration error: missing field 'path' for sqlite backend"
        );
        assert_eq!(err.kind(), "ConfigError");
    }

    #[test]
    fn test_error_display_execution() {
        let err = CharterError::execution("Unknown column 'emal' in 'field list'");
        assert_eq!(
            err.to_string(),
            "Execution error: Unknown column 'emal' in 'field list'"
        );
        assert_eq!(err.kind(), "ExecutionError");
    }

    #[test]
    fn test_kind_strings_are_stable() {
        let cases = [
            (CharterError::config(""), "ConfigError"),
            (CharterError::auth(""), "AuthError"),
            (CharterError::unreachable(""), "UnreachableError"),
            (CharterError::storage(""), "StorageError"),
            (CharterError::not_found(""), "NotFoundError"),
            (CharterError::syntax(""), "SyntaxError"),
            (CharterError::execution(""), "ExecutionError"),
            (CharterError::connection_lost(""), "ConnectionLostError"),
            (CharterError::unsupported_type(""), "UnsupportedTypeError"),
            (CharterError::column_not_found(""), "ColumnNotFoundError"),
            (CharterError::chart(""), "ChartError"),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind);
        }
    }

    #[test]
    fn test_message_preserves_backend_text() {
        let err = CharterError::syntax("You have an error in your SQL syntax near 'SELEC'");
        assert_eq!(
            err.message(),
            "You have an error in your SQL syntax near 'SELEC'"
        );
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CharterError>();
    }
}
