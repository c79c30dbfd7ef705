//! # docstore-client
//!
//! Schemaless document collections stored in a relational engine.
//!
//! Records are flat maps of field names to values. Inserting a record
//! with a field the collection has never seen adds a column for it, typed
//! from the value:
//!
//! | value kind          | column type |
//! |---------------------|-------------|
//! | text                | `varchar`   |
//! | integer             | `bigint`    |
//! | decimal             | `numeric`   |
//! | sequence or map     | `json`      |
//!
//! Columns are never dropped or retyped. Null and boolean values have no
//! column type and are rejected when they would need a new column.
//!
//! ## Quick Start
//!
//! ```
//! use docstore_client::{Connection, ConnectionConfig, Field, Record, Value};
//!
//! let mut conn = Connection::open(ConnectionConfig::sqlite_memory())?;
//! let test = conn.table("test")?;
//!
//! test.insert(
//!     &Record::new()
//!         .with("integer", 1)
//!         .with("floating_point", Value::from_f64(1.3)?)
//!         .with("string", "stuff"),
//! )?;
//! test.insert(&Record::new().with("floating_point", Value::from_f64(2.5)?))?;
//!
//! let small = test.query(Field::new("floating_point").less_than(2))?;
//! assert_eq!(small.len(), 1);
//!
//! let both = test.query([
//!     Field::new("integer").equals(1),
//!     Field::new("string").equals("stuff"),
//! ])?;
//! assert_eq!(both, test.query("string = 'stuff'")?);
//!
//! conn.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## PostgreSQL
//!
//! ```rust,ignore
//! use docstore_client::{open, Credentials};
//!
//! let mut conn = open(Credentials::new("user", "password", "docs", "localhost"))?;
//! ```
//!
//! This crate does not install a `tracing` subscriber. Applications decide
//! whether and where its log events go.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Error types.
pub mod error;

/// Connection configuration.
pub mod config;

/// Connections and the collection registry.
pub mod connection;

/// Collection handles.
pub mod collection;

/// Filters, predicates and generated statements.
pub mod query;

/// Catalog inspection and schema reconciliation.
pub mod schema;

// Re-exports
pub use collection::Collection;
pub use config::{Backend, ConnectionConfig, Credentials};
pub use connection::{Connection, ConnectionStats};
pub use docstore_common::{ColumnMap, Identifier, Record, StorageType, Value, ValueKind};
pub use docstore_engine::{Dialect, Engine, EngineError, EngineErrorKind};
pub use error::{ClientError, ClientResult, SchemaConflict};
pub use query::{Comparison, Field, Filter, Predicate, Statement};

/// Opens a PostgreSQL connection with the given credentials.
pub fn open(credentials: Credentials) -> ClientResult<Connection> {
    Connection::open(credentials.into())
}
