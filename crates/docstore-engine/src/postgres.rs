//! PostgreSQL backend.
//!
//! Uses the blocking `postgres` client. Values are bound through
//! [`PgParam`], which adapts each [`Value`] to the parameter type the
//! server inferred for its placeholder, so a record never needs to know
//! the column types in advance.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use bytes::BytesMut;
use docstore_common::constants::{DEFAULT_APPLICATION_NAME, DEFAULT_HOST, DEFAULT_PORT};
use docstore_common::{ColumnMap, Identifier, Record, StorageType, Value, ValueKind};
use postgres::types::{IsNull, ToSql, Type};
use postgres::{Client, NoTls, Row};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info};

use crate::dialect::Dialect;
use crate::engine::Engine;
use crate::error::{EngineError, EngineErrorKind, EngineResult};

const TABLE_EXISTS_SQL: &str = "SELECT EXISTS(\
     SELECT 1 FROM information_schema.tables \
     WHERE table_schema = current_schema() AND table_name::text = $1)";

const COLUMNS_SQL: &str = "SELECT column_name::text, data_type::text \
     FROM information_schema.columns \
     WHERE table_schema = current_schema() AND table_name::text = $1 \
     ORDER BY ordinal_position";

/// Connection settings for [`PgEngine`].
#[derive(Clone)]
pub struct PgConnectOptions {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Username.
    pub user: Option<String>,
    /// Password.
    pub password: Option<String>,
    /// Database name.
    pub dbname: Option<String>,
    /// Application name reported to the server.
    pub application_name: Option<String>,
    /// Connection timeout.
    pub connect_timeout: Option<Duration>,
}

impl Default for PgConnectOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            user: None,
            password: None,
            dbname: None,
            application_name: Some(DEFAULT_APPLICATION_NAME.to_string()),
            connect_timeout: None,
        }
    }
}

impl fmt::Debug for PgConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConnectOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("dbname", &self.dbname)
            .field("application_name", &self.application_name)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// A session with a PostgreSQL server.
pub struct PgEngine {
    client: Client,
}

impl PgEngine {
    /// Connects and authenticates.
    pub fn connect(options: &PgConnectOptions) -> EngineResult<Self> {
        let mut config = postgres::Config::new();
        config.host(options.host.as_str()).port(options.port);
        if let Some(user) = &options.user {
            config.user(user.as_str());
        }
        if let Some(password) = &options.password {
            config.password(password.as_str());
        }
        if let Some(dbname) = &options.dbname {
            config.dbname(dbname.as_str());
        }
        if let Some(name) = &options.application_name {
            config.application_name(name.as_str());
        }
        if let Some(timeout) = options.connect_timeout {
            config.connect_timeout(timeout);
        }

        let client = config
            .connect(NoTls)
            .map_err(|e| EngineError::with_source(EngineErrorKind::Connection, e))?;
        info!(host = %options.host, port = options.port, "connected to postgres");
        Ok(Self { client })
    }
}

impl fmt::Debug for PgEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgEngine")
            .field("closed", &self.client.is_closed())
            .finish()
    }
}

impl Engine for PgEngine {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn batch(&mut self, sql: &str) -> EngineResult<()> {
        self.client.batch_execute(sql)?;
        Ok(())
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> EngineResult<u64> {
        let params: Vec<PgParam<'_>> = params.iter().map(PgParam).collect();
        let refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        debug!(%sql, params = refs.len(), "execute");
        Ok(self.client.execute(sql, &refs)?)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> EngineResult<Vec<Record>> {
        let params: Vec<PgParam<'_>> = params.iter().map(PgParam).collect();
        let refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        debug!(%sql, params = refs.len(), "query");
        let rows = self.client.query(sql, &refs)?;
        rows.iter().map(decode_row).collect()
    }

    fn table_exists(&mut self, table: &Identifier) -> EngineResult<bool> {
        let row = self.client.query_one(TABLE_EXISTS_SQL, &[&table.as_str()])?;
        Ok(row.try_get(0)?)
    }

    fn columns(&mut self, table: &Identifier) -> EngineResult<ColumnMap> {
        let rows = self.client.query(COLUMNS_SQL, &[&table.as_str()])?;
        rows.iter()
            .map(|row| -> EngineResult<(String, StorageType)> {
                let name: String = row.try_get(0)?;
                let data_type: String = row.try_get(1)?;
                Ok((name, StorageType::from_catalog(&data_type)))
            })
            .collect()
    }

    fn close(self: Box<Self>) -> EngineResult<()> {
        self.client.close()?;
        info!("postgres session closed");
        Ok(())
    }
}

// =============================================================================
// Parameter binding
// =============================================================================

/// A value could not be encoded as the parameter type the server expects.
#[derive(Debug, Error)]
#[error("cannot bind a {kind} value to a parameter of type {ty}")]
pub struct ParamMismatch {
    kind: ValueKind,
    ty: String,
}

fn mismatch(value: &Value, ty: &Type) -> Box<dyn StdError + Sync + Send> {
    Box::new(ParamMismatch {
        kind: value.kind(),
        ty: ty.name().to_string(),
    })
}

/// Binds a [`Value`] against whatever type the server inferred.
#[derive(Debug)]
struct PgParam<'a>(&'a Value);

impl ToSql for PgParam<'_> {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        let value = self.0;
        match value {
            Value::Null => Ok(IsNull::Yes),
            Value::Boolean(b) => match *ty {
                Type::BOOL => b.to_sql(ty, out),
                _ => Err(mismatch(value, ty)),
            },
            Value::Integer(i) => match *ty {
                Type::INT8 => i.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::NUMERIC => Decimal::from(*i).to_sql(ty, out),
                Type::FLOAT8 => (*i as f64).to_sql(ty, out),
                _ => Err(mismatch(value, ty)),
            },
            Value::Decimal(d) => match *ty {
                Type::NUMERIC => d.to_sql(ty, out),
                Type::FLOAT8 => d.to_f64().ok_or_else(|| mismatch(value, ty))?.to_sql(ty, out),
                Type::INT8 if d.fract().is_zero() => {
                    d.to_i64().ok_or_else(|| mismatch(value, ty))?.to_sql(ty, out)
                }
                _ => Err(mismatch(value, ty)),
            },
            Value::Text(s) => match *ty {
                Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
                    s.as_str().to_sql(ty, out)
                }
                _ => Err(mismatch(value, ty)),
            },
            Value::List(_) | Value::Map(_) => match *ty {
                Type::JSON | Type::JSONB => value.to_json().to_sql(ty, out),
                _ => Err(mismatch(value, ty)),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    fn to_sql_checked(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.to_sql(ty, out)
    }
}

// =============================================================================
// Row decoding
// =============================================================================

fn decode_row(row: &Row) -> EngineResult<Record> {
    let mut record = Record::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        record.insert(column.name(), decode_column(row, idx, column.type_())?);
    }
    Ok(record)
}

fn decode_column(row: &Row, idx: usize, ty: &Type) -> EngineResult<Value> {
    let value = match *ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx)?.map(Value::Boolean),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(idx)?
            .map(|i| Value::Integer(i64::from(i))),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(idx)?
            .map(|i| Value::Integer(i64::from(i))),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx)?.map(Value::Integer),
        Type::NUMERIC => row.try_get::<_, Option<Decimal>>(idx)?.map(Value::Decimal),
        Type::FLOAT4 => match row.try_get::<_, Option<f32>>(idx)? {
            Some(f) => Some(float_value(f64::from(f))?),
            None => None,
        },
        Type::FLOAT8 => match row.try_get::<_, Option<f64>>(idx)? {
            Some(f) => Some(float_value(f)?),
            None => None,
        },
        Type::JSON | Type::JSONB => match row.try_get::<_, Option<serde_json::Value>>(idx)? {
            Some(json) => Some(
                Value::from_json(json)
                    .map_err(|e| EngineError::with_source(EngineErrorKind::Other, e))?,
            ),
            None => None,
        },
        _ => row.try_get::<_, Option<String>>(idx)?.map(Value::Text),
    };
    Ok(value.unwrap_or(Value::Null))
}

fn float_value(f: f64) -> EngineResult<Value> {
    Value::from_f64(f).map_err(|e| EngineError::with_source(EngineErrorKind::Other, e))
}

// =============================================================================
// Error classification
// =============================================================================

/// Classifies a PostgreSQL SQLSTATE code.
pub fn classify_sqlstate(code: &str) -> EngineErrorKind {
    match code {
        // duplicate_table, duplicate_column, duplicate_object
        "42P07" | "42701" | "42710" => EngineErrorKind::AlreadyExists,
        // datatype_mismatch, cannot_coerce
        "42804" | "42846" => EngineErrorKind::TypeMismatch,
        // invalid_catalog_name: the database does not exist
        "3D000" => EngineErrorKind::Connection,
        c if c.starts_with("22") => EngineErrorKind::TypeMismatch,
        c if c.starts_with("08") || c.starts_with("28") || c.starts_with("57P") => {
            EngineErrorKind::Connection
        }
        c if c.starts_with("42") => EngineErrorKind::Query,
        _ => EngineErrorKind::Other,
    }
}

fn classify(err: &postgres::Error) -> EngineErrorKind {
    if err.is_closed() {
        return EngineErrorKind::Closed;
    }
    if let Some(state) = err.code() {
        return classify_sqlstate(state.code());
    }
    let bind_failure = err
        .source()
        .map(|src| src.is::<ParamMismatch>() || src.is::<std::num::TryFromIntError>())
        .unwrap_or(false);
    if bind_failure {
        EngineErrorKind::TypeMismatch
    } else {
        EngineErrorKind::Other
    }
}

impl From<postgres::Error> for EngineError {
    fn from(err: postgres::Error) -> Self {
        let kind = classify(&err);
        match err.as_db_error() {
            Some(db) => {
                let mut message = db.message().to_string();
                if let Some(detail) = db.detail() {
                    message.push_str(": ");
                    message.push_str(detail);
                }
                let mut engine_err = EngineError::with_source(kind, err);
                engine_err.set_message(message);
                engine_err
            }
            None => EngineError::with_source(kind, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_sqlstate() {
        assert_eq!(classify_sqlstate("42P07"), EngineErrorKind::AlreadyExists);
        assert_eq!(classify_sqlstate("42701"), EngineErrorKind::AlreadyExists);
        assert_eq!(classify_sqlstate("42804"), EngineErrorKind::TypeMismatch);
        assert_eq!(classify_sqlstate("22P02"), EngineErrorKind::TypeMismatch);
        assert_eq!(classify_sqlstate("42601"), EngineErrorKind::Query);
        assert_eq!(classify_sqlstate("42703"), EngineErrorKind::Query);
        assert_eq!(classify_sqlstate("28P01"), EngineErrorKind::Connection);
        assert_eq!(classify_sqlstate("08006"), EngineErrorKind::Connection);
        assert_eq!(classify_sqlstate("3D000"), EngineErrorKind::Connection);
        assert_eq!(classify_sqlstate("40001"), EngineErrorKind::Other);
    }

    #[test]
    fn test_options_debug_redacts_password() {
        let options = PgConnectOptions {
            user: Some("postgres".to_string()),
            password: Some("hunter2".to_string()),
            ..Default::default()
        };
        let debug = format!("{options:?}");
        assert!(debug.contains("postgres"));
        assert!(!debug.contains("hunter2"));
        assert_eq!(options.port, 5432);
    }

    #[test]
    fn test_param_widens_integer_to_numeric() {
        let mut buf = BytesMut::new();
        let value = Value::Integer(5);
        let result = PgParam(&value).to_sql(&Type::NUMERIC, &mut buf).unwrap();
        assert!(matches!(result, IsNull::No));
        assert!(!buf.is_empty());
    }

    #[test]
    fn test_param_rejects_text_for_integer_column() {
        let mut buf = BytesMut::new();
        let value = Value::from("stuff");
        let err = match PgParam(&value).to_sql(&Type::INT8, &mut buf) {
            Ok(_) => panic!("text bound to an int8 parameter"),
            Err(err) => err,
        };
        assert!(err.is::<ParamMismatch>());
        assert_eq!(
            err.to_string(),
            "cannot bind a text value to a parameter of type int8"
        );
    }

    #[test]
    fn test_param_binds_structured_as_json() {
        let mut buf = BytesMut::new();
        let value = Value::from(vec!["one", "two"]);
        PgParam(&value).to_sql(&Type::JSON, &mut buf).unwrap();
        assert_eq!(&buf[..], br#"["one","two"]"#);
    }

    #[test]
    fn test_param_rejects_structured_for_text_column() {
        let mut buf = BytesMut::new();
        let value = Value::from(vec!["one", "two"]);
        let result = PgParam(&value).to_sql(&Type::VARCHAR, &mut buf);
        assert!(matches!(result, Err(err) if err.is::<ParamMismatch>()));
    }

    #[test]
    fn test_param_null_for_any_type() {
        let mut buf = BytesMut::new();
        let result = PgParam(&Value::Null).to_sql(&Type::JSONB, &mut buf).unwrap();
        assert!(matches!(result, IsNull::Yes));
    }
}
