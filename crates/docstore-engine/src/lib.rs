//! # docstore-engine
//!
//! The narrow interface DocStore consumes from a relational engine, and
//! the backends that implement it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     docstore-client                          │
//! │   (catalog inspector, schema reconciler, predicate builder)  │
//! └─────────────────────────────────────────────────────────────┘
//!                               │  dyn Engine
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Engine trait                          │
//! │  catalog: table_exists, columns                              │
//! │  DDL:     create_table, add_column (idempotent)              │
//! │  DML:     execute, query, truncate                           │
//! │  txn:     begin, commit, rollback                            │
//! └─────────────────────────────────────────────────────────────┘
//!                 │                               │
//!                 ▼                               ▼
//!        ┌────────────────┐              ┌────────────────┐
//!        │    PgEngine    │              │  SqliteEngine  │
//!        │   (postgres)   │              │   (rusqlite)   │
//!        └────────────────┘              └────────────────┘
//! ```
//!
//! Statement text is produced by the caller using [`Dialect`]; values are
//! always passed separately and bound by the backend.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod dialect;
mod engine;
mod error;
pub mod postgres;
pub mod sqlite;

pub use dialect::Dialect;
pub use engine::Engine;
pub use error::{EngineError, EngineErrorKind, EngineResult};
pub use postgres::{PgConnectOptions, PgEngine};
pub use sqlite::SqliteEngine;
