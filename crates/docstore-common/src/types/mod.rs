//! Type definitions shared across DocStore.

mod identifier;
mod record;
mod storage;
mod value;

pub use identifier::Identifier;
pub use record::Record;
pub use storage::{ColumnMap, StorageType};
pub use value::{Value, ValueKind};
