//! Catalog inspection and schema reconciliation.
//!
//! A collection starts as an empty table and grows one column per new
//! field name. Columns are only ever added: nothing here drops, renames
//! or retypes an existing column.

mod catalog;
mod reconcile;

pub use catalog::CatalogInspector;
pub use reconcile::{plan, reconcile, ColumnChange};
