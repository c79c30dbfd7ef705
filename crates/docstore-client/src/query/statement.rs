//! SQL text plus bound parameters.

use docstore_common::{ColumnMap, Identifier, Record, Value};
use docstore_engine::Dialect;

use super::filter::{Comparison, Filter};
use super::Predicate;
use crate::error::{ClientError, ClientResult};

/// A statement ready for an engine: SQL with placeholders and their values.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL text.
    pub sql: String,
    /// Parameters in placeholder order.
    pub params: Vec<Value>,
}

impl Statement {
    /// Builds `SELECT * FROM table [WHERE ...]`.
    ///
    /// `columns` is the table's current column map. A filter on a field
    /// with no column can never match, so it compiles to a false condition
    /// instead of an engine error.
    pub fn select(
        dialect: Dialect,
        table: &Identifier,
        predicate: &Predicate,
        columns: &ColumnMap,
    ) -> ClientResult<Self> {
        let mut builder = SqlBuilder::new().sql("SELECT * FROM ").sql(table.quoted());

        match predicate {
            Predicate::All => {}
            Predicate::Filters(filters) => {
                for (i, filter) in filters.iter().enumerate() {
                    builder = builder.sql(if i == 0 { " WHERE " } else { " AND " });
                    builder = condition(builder, dialect, filter, columns)?;
                }
            }
            Predicate::Raw(clause) => {
                if clause.trim().is_empty() {
                    return Err(ClientError::InvalidFilter("raw clause is empty".into()));
                }
                builder = builder.sql(" WHERE ").sql(clause);
            }
        }

        Ok(builder.build(dialect))
    }

    /// Builds `INSERT INTO table (...) VALUES (...)` in record field order.
    ///
    /// An empty record inserts a row of defaults.
    pub fn insert(dialect: Dialect, table: &Identifier, record: &Record) -> ClientResult<Self> {
        let mut builder = SqlBuilder::new().sql("INSERT INTO ").sql(table.quoted());
        if record.is_empty() {
            return Ok(builder.sql(" DEFAULT VALUES").build(dialect));
        }

        let columns = record
            .keys()
            .map(|field| Identifier::parse(field).map(|column| column.quoted()))
            .collect::<Result<Vec<_>, _>>()?;
        builder = builder.sql(" (").sql(columns.join(", ")).sql(") VALUES (");
        for (i, value) in record.values().enumerate() {
            if i > 0 {
                builder = builder.sql(", ");
            }
            builder = builder.bind(value.clone());
        }
        Ok(builder.sql(")").build(dialect))
    }
}

fn condition(
    builder: SqlBuilder,
    dialect: Dialect,
    filter: &Filter,
    columns: &ColumnMap,
) -> ClientResult<SqlBuilder> {
    let column = Identifier::parse(filter.field())?;
    if !columns.contains(column.as_str()) {
        return Ok(builder.sql(dialect.never()));
    }
    let quoted = column.quoted();

    match (filter.comparison().operator(), filter.operand()) {
        (None, _) => {
            debug_assert_eq!(filter.comparison(), Comparison::Exists);
            Ok(builder.sql(format!(
                "({quoted} IS NOT NULL AND CAST({quoted} AS TEXT) <> '')"
            )))
        }
        (Some(_), Some(Value::Null)) => Err(ClientError::InvalidFilter(format!(
            "cannot compare `{}` with null",
            filter.field()
        ))),
        (Some(operator), Some(operand)) => Ok(builder
            .sql(quoted)
            .sql(" ")
            .sql(operator)
            .sql(" ")
            .bind(operand.clone())),
        (Some(_), None) => Err(ClientError::InvalidFilter(format!(
            "`{filter}` has no operand"
        ))),
    }
}

#[derive(Debug)]
enum Part {
    Sql(String),
    Param(Value),
}

/// Accumulates SQL fragments and parameters, numbering placeholders last.
#[derive(Debug, Default)]
struct SqlBuilder {
    parts: Vec<Part>,
}

impl SqlBuilder {
    fn new() -> Self {
        Self::default()
    }

    fn sql(mut self, sql: impl AsRef<str>) -> Self {
        self.parts.push(Part::Sql(sql.as_ref().to_string()));
        self
    }

    fn bind(mut self, value: Value) -> Self {
        self.parts.push(Part::Param(value));
        self
    }

    fn build(self, dialect: Dialect) -> Statement {
        let mut sql = String::new();
        let mut params = Vec::new();
        for part in self.parts {
            match part {
                Part::Sql(s) => sql.push_str(&s),
                Part::Param(value) => {
                    params.push(value);
                    sql.push_str(&dialect.placeholder(params.len()));
                }
            }
        }
        Statement { sql, params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Field;
    use docstore_common::StorageType;

    fn table() -> Identifier {
        Identifier::parse("test").unwrap()
    }

    fn columns() -> ColumnMap {
        [
            ("integer", StorageType::Integer),
            ("floating_point", StorageType::Decimal),
            ("string", StorageType::Text),
            ("list", StorageType::Json),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_select_all() {
        let stmt = Statement::select(Dialect::Postgres, &table(), &Predicate::All, &columns()).unwrap();
        assert_eq!(stmt.sql, r#"SELECT * FROM "test""#);
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_select_conjunction() {
        let predicate = Predicate::from(vec![
            Field::new("integer").equals(1),
            Field::new("string").equals("stuff"),
        ]);
        let stmt = Statement::select(Dialect::Postgres, &table(), &predicate, &columns()).unwrap();
        assert_eq!(
            stmt.sql,
            r#"SELECT * FROM "test" WHERE "integer" = $1 AND "string" = $2"#
        );
        assert_eq!(stmt.params, vec![Value::Integer(1), Value::from("stuff")]);

        let stmt = Statement::select(Dialect::Sqlite, &table(), &predicate, &columns()).unwrap();
        assert_eq!(
            stmt.sql,
            r#"SELECT * FROM "test" WHERE "integer" = ?1 AND "string" = ?2"#
        );
    }

    #[test]
    fn test_select_exists_has_no_parameter() {
        let predicate = Predicate::from(Field::new("list").exists());
        let stmt = Statement::select(Dialect::Postgres, &table(), &predicate, &columns()).unwrap();
        assert_eq!(
            stmt.sql,
            r#"SELECT * FROM "test" WHERE ("list" IS NOT NULL AND CAST("list" AS TEXT) <> '')"#
        );
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_select_unknown_column_never_matches() {
        let predicate = Predicate::from(vec![
            Field::new("missing").exists(),
            Field::new("integer").less_than(2),
        ]);
        let stmt = Statement::select(Dialect::Postgres, &table(), &predicate, &columns()).unwrap();
        assert_eq!(
            stmt.sql,
            r#"SELECT * FROM "test" WHERE FALSE AND "integer" < $1"#
        );
        assert_eq!(stmt.params, vec![Value::Integer(2)]);

        let stmt = Statement::select(Dialect::Sqlite, &table(), &predicate, &columns()).unwrap();
        assert!(stmt.sql.contains("WHERE 0 AND"));
    }

    #[test]
    fn test_operand_is_never_inlined() {
        let hostile = "x' OR '1'='1";
        let predicate = Predicate::from(Field::new("string").equals(hostile));
        let stmt = Statement::select(Dialect::Postgres, &table(), &predicate, &columns()).unwrap();
        assert!(!stmt.sql.contains(hostile));
        assert_eq!(stmt.params, vec![Value::from(hostile)]);
    }

    #[test]
    fn test_unsafe_field_rejected() {
        let predicate = Predicate::from(Field::new("string\" OR 1=1 --").equals(1));
        let err = Statement::select(Dialect::Postgres, &table(), &predicate, &columns()).unwrap_err();
        assert!(matches!(err, ClientError::InvalidIdentifier(_)));
    }

    #[test]
    fn test_null_operand_rejected() {
        let predicate = Predicate::from(Field::new("string").equals(Value::Null));
        let err = Statement::select(Dialect::Postgres, &table(), &predicate, &columns()).unwrap_err();
        assert!(matches!(err, ClientError::InvalidFilter(_)));
    }

    #[test]
    fn test_raw_clause() {
        let predicate = Predicate::raw("string = 'stuff'");
        let stmt = Statement::select(Dialect::Postgres, &table(), &predicate, &columns()).unwrap();
        assert_eq!(stmt.sql, r#"SELECT * FROM "test" WHERE string = 'stuff'"#);

        let err = Statement::select(Dialect::Postgres, &table(), &Predicate::raw("  "), &columns())
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidFilter(_)));
    }

    #[test]
    fn test_insert() {
        let record = Record::new()
            .with("integer", 1)
            .with("string", "stuff")
            .with("list", vec![1, 2]);
        let stmt = Statement::insert(Dialect::Postgres, &table(), &record).unwrap();
        assert_eq!(
            stmt.sql,
            r#"INSERT INTO "test" ("integer", "string", "list") VALUES ($1, $2, $3)"#
        );
        assert_eq!(stmt.params.len(), 3);
        assert_eq!(stmt.params[2], Value::from(vec![1, 2]));

        let stmt = Statement::insert(Dialect::Sqlite, &table(), &Record::new()).unwrap();
        assert_eq!(stmt.sql, r#"INSERT INTO "test" DEFAULT VALUES"#);
    }
}
