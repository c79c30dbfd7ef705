//! Error types for the client library.

use docstore_common::{IdentifierError, StorageType, ValueError, ValueKind};
use docstore_engine::{EngineError, EngineErrorKind};
use thiserror::Error;

/// Client error type.
///
/// Engine failures are wrapped, never rewritten: the engine's message and
/// the driver error stay reachable through the source chain.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Could not reach or authenticate with the engine.
    #[error("{0}")]
    ConnectionFailed(#[source] EngineError),

    /// The connection has been closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// Schema evolution could not accommodate a record.
    #[error("schema conflict: {0}")]
    SchemaConflict(#[from] SchemaConflict),

    /// The engine rejected a value for an existing column.
    #[error("{0}")]
    TypeMismatch(#[source] EngineError),

    /// The engine rejected a query.
    #[error("{0}")]
    QueryFailed(#[source] EngineError),

    /// A filter expression cannot be compiled.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// A table or field name is not a safe identifier.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdentifierError),

    /// A value cannot be represented.
    #[error("invalid value: {0}")]
    InvalidValue(#[from] ValueError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Any other engine failure.
    #[error(transparent)]
    Engine(EngineError),
}

/// Why a record could not be reconciled with its collection's columns.
#[derive(Debug, Error)]
pub enum SchemaConflict {
    /// The value's kind has no storage type, so no column can be created for it.
    #[error("field `{field}` holds a {kind} value, which has no storage type")]
    UnmappedValue {
        /// Field name.
        field: String,
        /// Kind of the offending value.
        kind: ValueKind,
    },

    /// A concurrent writer created the column with a different type.
    #[error("column `{column}` exists as {found}, expected {expected}")]
    IncompatibleColumn {
        /// Column name.
        column: String,
        /// Type inferred from the record.
        expected: StorageType,
        /// Type found in the catalog.
        found: StorageType,
    },

    /// The column was added but the catalog does not list it.
    #[error("column `{column}` is missing after being added")]
    Vanished {
        /// Column name.
        column: String,
    },

    /// The engine rejected the schema change.
    #[error("adding column `{column}` failed: {source}")]
    Evolution {
        /// Column name.
        column: String,
        /// Engine error.
        source: EngineError,
    },
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

impl From<EngineError> for ClientError {
    fn from(err: EngineError) -> Self {
        match err.kind() {
            EngineErrorKind::Connection => ClientError::ConnectionFailed(err),
            EngineErrorKind::Closed => ClientError::ConnectionClosed,
            EngineErrorKind::TypeMismatch => ClientError::TypeMismatch(err),
            EngineErrorKind::Query => ClientError::QueryFailed(err),
            EngineErrorKind::AlreadyExists | EngineErrorKind::Other => ClientError::Engine(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_engine_errors_keep_category() {
        let err: ClientError = EngineError::new(EngineErrorKind::TypeMismatch, "bad int").into();
        assert!(matches!(err, ClientError::TypeMismatch(_)));
        assert_eq!(err.to_string(), "type mismatch: bad int");
        assert!(err.source().is_some());

        let err: ClientError = EngineError::new(EngineErrorKind::Query, "syntax").into();
        assert!(matches!(err, ClientError::QueryFailed(_)));

        let err: ClientError = EngineError::new(EngineErrorKind::Connection, "refused").into();
        assert!(matches!(err, ClientError::ConnectionFailed(_)));

        let err: ClientError = EngineError::closed().into();
        assert!(matches!(err, ClientError::ConnectionClosed));
    }

    #[test]
    fn test_schema_conflict_display() {
        let err = ClientError::from(SchemaConflict::UnmappedValue {
            field: "flag".to_string(),
            kind: ValueKind::Boolean,
        });
        assert_eq!(
            err.to_string(),
            "schema conflict: field `flag` holds a boolean value, which has no storage type"
        );

        let err = SchemaConflict::IncompatibleColumn {
            column: "n".to_string(),
            expected: StorageType::Integer,
            found: StorageType::Text,
        };
        assert_eq!(err.to_string(), "column `n` exists as varchar, expected bigint");
    }
}
