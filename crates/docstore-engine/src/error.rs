//! Engine error types.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Classification of an engine failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineErrorKind {
    /// Could not reach or authenticate with the engine.
    Connection,
    /// The session has been closed.
    Closed,
    /// A value does not fit the column or operand type.
    TypeMismatch,
    /// Malformed statement, unknown column or unsupported operator.
    Query,
    /// The table or column being created already exists.
    AlreadyExists,
    /// Anything else.
    Other,
}

impl fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineErrorKind::Connection => "connection error",
            EngineErrorKind::Closed => "session closed",
            EngineErrorKind::TypeMismatch => "type mismatch",
            EngineErrorKind::Query => "query error",
            EngineErrorKind::AlreadyExists => "already exists",
            EngineErrorKind::Other => "engine error",
        };
        f.write_str(name)
    }
}

/// An error reported by an engine backend.
///
/// The engine's own message is kept verbatim and the underlying driver
/// error stays reachable through [`std::error::Error::source`].
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct EngineError {
    kind: EngineErrorKind,
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl EngineError {
    /// Creates an error without an underlying cause.
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping a driver error.
    pub fn with_source(
        kind: EngineErrorKind,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Replaces the message, keeping kind and source.
    pub(crate) fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    /// Returns the classification.
    pub fn kind(&self) -> EngineErrorKind {
        self.kind
    }

    /// Returns the engine's message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if the failure was an "already exists" condition.
    pub fn is_already_exists(&self) -> bool {
        self.kind == EngineErrorKind::AlreadyExists
    }

    /// Error for operations on a closed session.
    pub fn closed() -> Self {
        Self::new(EngineErrorKind::Closed, "the engine session is closed")
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_keeps_message() {
        let err = EngineError::new(EngineErrorKind::Query, "syntax error at or near \"WHERE\"");
        assert_eq!(err.to_string(), "query error: syntax error at or near \"WHERE\"");
        assert_eq!(err.kind(), EngineErrorKind::Query);
        assert!(err.source().is_none());
    }

    #[test]
    fn test_with_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = EngineError::with_source(EngineErrorKind::Connection, io);
        assert_eq!(err.message(), "refused");
        assert!(err.source().is_some());
        assert!(!err.is_already_exists());
    }
}
