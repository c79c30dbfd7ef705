//! SQL text generation that differs between engines.

use docstore_common::constants::PLACEHOLDER_COLUMN;
use docstore_common::{Identifier, StorageType};

/// SQL dialect of an engine backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// PostgreSQL.
    Postgres,
    /// SQLite.
    Sqlite,
}

impl Dialect {
    /// Returns the placeholder for the 1-based parameter `index`.
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Sqlite => format!("?{index}"),
        }
    }

    /// Statement creating an empty collection table.
    ///
    /// SQLite cannot create a table without columns, so it gets the
    /// internal placeholder column.
    pub fn create_table(self, table: &Identifier) -> String {
        match self {
            Dialect::Postgres => format!("CREATE TABLE IF NOT EXISTS {} ()", table.quoted()),
            Dialect::Sqlite => format!(
                "CREATE TABLE IF NOT EXISTS {} (\"{PLACEHOLDER_COLUMN}\" INTEGER)",
                table.quoted()
            ),
        }
    }

    /// Statement adding a column.
    ///
    /// PostgreSQL skips existing columns itself; SQLite reports a
    /// duplicate column, which backends classify as `AlreadyExists`.
    /// SQLite columns carry a CHECK restricting the stored type.
    pub fn add_column(self, table: &Identifier, column: &Identifier, ty: &StorageType) -> String {
        match self {
            Dialect::Postgres => format!(
                "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} {}",
                table.quoted(),
                column.quoted(),
                ty.sql_name()
            ),
            Dialect::Sqlite => {
                let mut sql = format!(
                    "ALTER TABLE {} ADD COLUMN {} {}",
                    table.quoted(),
                    column.quoted(),
                    ty.sql_name()
                );
                if let Some(check) = sqlite_type_check(column, ty) {
                    sql.push_str(" CHECK (");
                    sql.push_str(&check);
                    sql.push(')');
                }
                sql
            }
        }
    }

    /// Statement removing every row.
    pub fn truncate(self, table: &Identifier) -> String {
        match self {
            Dialect::Postgres => format!("TRUNCATE TABLE {}", table.quoted()),
            Dialect::Sqlite => format!("DELETE FROM {}", table.quoted()),
        }
    }

    /// Expression that is never true, for predicates on absent columns.
    pub fn never(self) -> &'static str {
        match self {
            Dialect::Postgres => "FALSE",
            Dialect::Sqlite => "0",
        }
    }
}

/// Constraint restricting a SQLite column to the storage classes of `ty`.
fn sqlite_type_check(column: &Identifier, ty: &StorageType) -> Option<String> {
    let col = column.quoted();
    let check = match ty {
        StorageType::Text => format!("typeof({col}) IN ('text', 'null')"),
        StorageType::Integer => format!("typeof({col}) IN ('integer', 'null')"),
        StorageType::Decimal => format!("typeof({col}) IN ('integer', 'real', 'null')"),
        StorageType::Json => {
            format!("{col} IS NULL OR (typeof({col}) = 'text' AND json_valid({col}))")
        }
        StorageType::Unrecognized(_) => return None,
    };
    Some(check)
}
