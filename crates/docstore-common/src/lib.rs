//! # docstore-common
//!
//! Common types shared by every DocStore crate.
//!
//! This crate provides the vocabulary that the engine backends and the
//! client agree on:
//!
//! - **Values**: the caller-facing value model (`Value`, `ValueKind`)
//! - **Records**: ordered field → value mappings (`Record`)
//! - **Storage types**: the closed set of column kinds DocStore creates
//!   (`StorageType`) and the live column mapping of a table (`ColumnMap`)
//! - **Identifiers**: validated table and column names (`Identifier`)
//!
//! ## Example
//!
//! ```rust
//! use docstore_common::{Identifier, Record, StorageType, Value};
//!
//! let record = Record::new().with("integer", 1).with("string", "stuff");
//! let field = Identifier::parse("integer").unwrap();
//! let kind = record.get(field.as_str()).unwrap().kind();
//! assert_eq!(StorageType::infer(kind).unwrap(), StorageType::Integer);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod error;
pub mod types;

pub use error::{IdentifierError, ValueError};
pub use types::{ColumnMap, Identifier, Record, StorageType, Value, ValueKind};
