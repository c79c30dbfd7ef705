//! SQLite backend.
//!
//! Backs embedded collections and the test-suite. Values are bound
//! through [`SqliteParam`]. Every column DocStore adds carries a CHECK on
//! its storage class, so a value of the wrong kind fails as a type
//! mismatch instead of being stored as whatever SQLite makes of it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use docstore_common::constants::{PLACEHOLDER_COLUMN, SQLITE_MEMORY_PATH};
use docstore_common::{ColumnMap, Identifier, Record, StorageType, Value};
use rusqlite::types::{ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, ErrorCode, ToSql};
use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, info};

use crate::dialect::Dialect;
use crate::engine::Engine;
use crate::error::{EngineError, EngineErrorKind, EngineResult};

const TABLE_EXISTS_SQL: &str =
    "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)";

const COLUMNS_SQL: &str = "SELECT name, type FROM pragma_table_info(?1) ORDER BY cid";

/// How long a statement waits on a lock held by another connection.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A session with a SQLite database.
///
/// SQLite has no arbitrary-precision numeric storage: `numeric` columns
/// hold decimals as 64-bit floats, so digits past `f64` precision are lost.
/// Use the PostgreSQL backend when exact decimals matter.
pub struct SqliteEngine {
    conn: Connection,
    path: PathBuf,
}

impl SqliteEngine {
    /// Opens (or creates) a database file; `":memory:"` opens a private in-memory database.
    pub fn open(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let conn = if path == Path::new(SQLITE_MEMORY_PATH) {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(|e| EngineError::with_source(EngineErrorKind::Connection, e))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        info!(path = %path.display(), "opened sqlite database");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> EngineResult<Self> {
        Self::open(SQLITE_MEMORY_PATH)
    }

    /// Returns the database path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for SqliteEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteEngine")
            .field("path", &self.path)
            .finish()
    }
}

impl Engine for SqliteEngine {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn batch(&mut self, sql: &str) -> EngineResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> EngineResult<u64> {
        debug!(%sql, params = params.len(), "execute");
        let affected = self
            .conn
            .execute(sql, params_from_iter(params.iter().map(SqliteParam)))?;
        Ok(affected as u64)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> EngineResult<Vec<Record>> {
        debug!(%sql, params = params.len(), "query");
        let mut stmt = self.conn.prepare(sql)?;
        let names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut rows = stmt.query(params_from_iter(params.iter().map(SqliteParam)))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Record::with_capacity(names.len());
            for (idx, name) in names.iter().enumerate() {
                if name == PLACEHOLDER_COLUMN {
                    continue;
                }
                record.insert(name.clone(), decode(row.get_ref(idx)?)?);
            }
            records.push(record);
        }
        Ok(records)
    }

    fn table_exists(&mut self, table: &Identifier) -> EngineResult<bool> {
        let exists = self
            .conn
            .query_row(TABLE_EXISTS_SQL, [table.as_str()], |row| row.get::<_, bool>(0))?;
        Ok(exists)
    }

    fn columns(&mut self, table: &Identifier) -> EngineResult<ColumnMap> {
        let mut stmt = self.conn.prepare(COLUMNS_SQL)?;
        let rows = stmt.query_map([table.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut columns = ColumnMap::new();
        for row in rows {
            let (name, declared) = row?;
            if name == PLACEHOLDER_COLUMN {
                continue;
            }
            columns.insert(name, StorageType::from_catalog(&declared));
        }
        Ok(columns)
    }

    fn close(self: Box<Self>) -> EngineResult<()> {
        let path = self.path;
        self.conn.close().map_err(|(_, e)| EngineError::from(e))?;
        info!(path = %path.display(), "sqlite database closed");
        Ok(())
    }
}

/// Binds a [`Value`] using SQLite's storage classes.
struct SqliteParam<'a>(&'a Value);

impl ToSql for SqliteParam<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let output = match self.0 {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Boolean(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            Value::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Decimal(d) => match d.to_f64() {
                Some(f) => ToSqlOutput::Owned(SqlValue::Real(f)),
                None => ToSqlOutput::Owned(SqlValue::Text(d.to_string())),
            },
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::List(_) | Value::Map(_) => {
                ToSqlOutput::Owned(SqlValue::Text(self.0.to_json_text()))
            }
        };
        Ok(output)
    }
}

fn decode(value: ValueRef<'_>) -> EngineResult<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::from_f64(f)
            .map_err(|e| EngineError::with_source(EngineErrorKind::Other, e))?,
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    })
}

/// Classifies a SQLite result code and message.
pub fn classify_failure(code: ErrorCode, message: &str) -> EngineErrorKind {
    match code {
        ErrorCode::TypeMismatch => EngineErrorKind::TypeMismatch,
        // Column type checks are the only CHECK constraints DocStore creates.
        ErrorCode::ConstraintViolation if message.contains("CHECK constraint failed") => {
            EngineErrorKind::TypeMismatch
        }
        ErrorCode::CannotOpen | ErrorCode::NotADatabase | ErrorCode::PermissionDenied => {
            EngineErrorKind::Connection
        }
        // SQLITE_ERROR covers syntax errors, unknown tables and columns.
        ErrorCode::Unknown => {
            if message.contains("duplicate column name") || message.contains("already exists") {
                EngineErrorKind::AlreadyExists
            } else {
                EngineErrorKind::Query
            }
        }
        _ => EngineErrorKind::Other,
    }
}

fn classify(err: &rusqlite::Error) -> EngineErrorKind {
    // Failures while preparing a statement carry the code in the input error.
    if let rusqlite::Error::SqlInputError { error, msg, .. } = err {
        return classify_failure(error.code, msg);
    }
    if let Some(code) = err.sqlite_error_code() {
        return classify_failure(code, &err.to_string());
    }
    match err {
        rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::IntegralValueOutOfRange(..)
        | rusqlite::Error::ToSqlConversionFailure(..) => EngineErrorKind::TypeMismatch,
        rusqlite::Error::InvalidParameterCount(..)
        | rusqlite::Error::InvalidParameterName(..)
        | rusqlite::Error::InvalidColumnName(..)
        | rusqlite::Error::InvalidColumnIndex(..)
        | rusqlite::Error::MultipleStatement => EngineErrorKind::Query,
        _ => EngineErrorKind::Other,
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        EngineError::with_source(classify(&err), err)
    }
}
