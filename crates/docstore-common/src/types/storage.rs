//! Storage types and column maps.

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

use rust_decimal::Decimal;

use super::value::{Value, ValueKind};

/// Column kind of a collection's backing table.
///
/// DocStore only ever creates the first four variants. Columns created by
/// other tools are reported as [`StorageType::Unrecognized`] and left alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StorageType {
    /// Variable-length text (`varchar`).
    Text,
    /// 64-bit integer (`bigint`).
    Integer,
    /// Arbitrary-precision numeric (`numeric`).
    Decimal,
    /// JSON document (`json`).
    Json,
    /// A catalog type DocStore never creates.
    Unrecognized(String),
}

impl StorageType {
    /// Infers the storage type for a new column from a value's kind.
    ///
    /// Total over [`ValueKind`]: nulls and booleans have no mapping and
    /// return the kind back as the error.
    pub fn infer(kind: ValueKind) -> Result<Self, ValueKind> {
        match kind {
            ValueKind::Text => Ok(StorageType::Text),
            ValueKind::Integer => Ok(StorageType::Integer),
            ValueKind::Decimal => Ok(StorageType::Decimal),
            ValueKind::Sequence | ValueKind::Map => Ok(StorageType::Json),
            ValueKind::Null | ValueKind::Boolean => Err(kind),
        }
    }

    /// Returns the SQL type name used in `ADD COLUMN`.
    pub fn sql_name(&self) -> &str {
        match self {
            StorageType::Text => "varchar",
            StorageType::Integer => "bigint",
            StorageType::Decimal => "numeric",
            StorageType::Json => "json",
            StorageType::Unrecognized(name) => name,
        }
    }

    /// Parses a type name as reported by an engine catalog.
    ///
    /// Accepts both PostgreSQL `information_schema` names and SQLite
    /// declared types, case-insensitively.
    pub fn from_catalog(name: &str) -> Self {
        let lower = name.trim().to_ascii_lowercase();
        match lower.as_str() {
            "character varying" | "varchar" | "text" | "character" | "char" => StorageType::Text,
            "bigint" | "integer" | "smallint" | "int8" | "int4" | "int" => StorageType::Integer,
            "numeric" | "decimal" | "double precision" | "real" | "float8" => StorageType::Decimal,
            "json" | "jsonb" => StorageType::Json,
            _ if lower.starts_with("varchar") || lower.starts_with("character varying") => {
                StorageType::Text
            }
            _ if lower.starts_with("numeric") || lower.starts_with("decimal") => {
                StorageType::Decimal
            }
            _ => StorageType::Unrecognized(name.to_string()),
        }
    }

    /// Returns true if a column of this type stores `value` without coercion.
    ///
    /// Nulls fit every column. Integral decimals fit integer columns and
    /// integers fit decimal columns; every other pairing must match the
    /// inferred type exactly. Unrecognized columns are left to the engine.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (StorageType::Unrecognized(_), _) => true,
            (StorageType::Text, Value::Text(_)) => true,
            (StorageType::Integer, Value::Integer(_)) => true,
            (StorageType::Integer, Value::Decimal(d)) => d.fract().is_zero(),
            (StorageType::Decimal, Value::Integer(_) | Value::Decimal(_)) => true,
            (StorageType::Json, Value::List(_) | Value::Map(_)) => true,
            _ => false,
        }
    }

    /// Returns true if DocStore could have created this type.
    pub fn is_managed(&self) -> bool {
        !matches!(self, StorageType::Unrecognized(_))
    }

    /// Brings a decoded engine value into the canonical shape for this type.
    ///
    /// Engines without native JSON or decimal columns hand back text and
    /// integers; this undoes that so every backend yields the same rows.
    /// Values that do not fit are returned unchanged.
    pub fn normalize(&self, value: Value) -> Value {
        match (self, value) {
            (StorageType::Json, Value::Text(text)) => match Value::parse_json(&text) {
                Some(parsed @ (Value::List(_) | Value::Map(_))) => parsed,
                _ => Value::Text(text),
            },
            (StorageType::Decimal, Value::Integer(i)) => Value::Decimal(Decimal::from(i)),
            (StorageType::Decimal, Value::Text(text)) => match text.parse::<Decimal>() {
                Ok(d) => Value::Decimal(d),
                Err(_) => Value::Text(text),
            },
            (_, value) => value,
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// Live mapping of a table's column names to storage types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    columns: BTreeMap<String, StorageType>,
}

impl ColumnMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a column.
    pub fn insert(&mut self, name: impl Into<String>, ty: StorageType) {
        self.columns.insert(name.into(), ty);
    }

    /// Gets a column's storage type.
    pub fn get(&self, name: &str) -> Option<&StorageType> {
        self.columns.get(name)
    }

    /// Returns true if the column exists.
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterates columns in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, StorageType> {
        self.columns.iter()
    }

    /// Iterates column names in name order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Returns true if every column of `self` exists in `other` with the same type.
    pub fn is_subset_of(&self, other: &ColumnMap) -> bool {
        self.columns
            .iter()
            .all(|(name, ty)| other.get(name) == Some(ty))
    }
}

impl<K: Into<String>> FromIterator<(K, StorageType)> for ColumnMap {
    fn from_iter<I: IntoIterator<Item = (K, StorageType)>>(iter: I) -> Self {
        let mut map = ColumnMap::new();
        for (name, ty) in iter {
            map.insert(name, ty);
        }
        map
    }
}

impl<'a> IntoIterator for &'a ColumnMap {
    type Item = (&'a String, &'a StorageType);
    type IntoIter = btree_map::Iter<'a, String, StorageType>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

impl fmt::Display for ColumnMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, ty)) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {ty}")?;
        }
        write!(f, "}}")
    }
}
