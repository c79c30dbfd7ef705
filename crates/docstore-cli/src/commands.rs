//! Subcommand implementations.

use anyhow::{anyhow, bail, Context, Result};
use docstore_client::{Collection, Connection, Field, Filter, Predicate, Record, Value};
use tracing::info;

use crate::formatter::{format_columns, format_records, OutputFormat};

/// Parses a `--where` expression into a filter.
///
/// Accepted forms are `field=value`, `field>value`, `field<value`,
/// `field>=value`, `field<=value` and `field?` (field exists). Values are
/// read as JSON when they parse as JSON and as text otherwise, so
/// `n=1` compares with an integer and `s=stuff` with a string.
pub fn parse_filter(expr: &str) -> Result<Filter> {
    let expr = expr.trim();
    if let Some(name) = expr.strip_suffix('?') {
        return Ok(Field::new(name.trim()).exists());
    }

    let pos = expr
        .find(&['=', '<', '>'][..])
        .ok_or_else(|| anyhow!("expected `field<op>value` or `field?`, got `{expr}`"))?;
    let (name, rest) = expr.split_at(pos);
    let field = Field::new(name.trim());
    if field.name().is_empty() {
        bail!("missing field name in `{expr}`");
    }

    let filter = if let Some(value) = rest.strip_prefix(">=") {
        field.greater_or_equal(parse_value(value))
    } else if let Some(value) = rest.strip_prefix("<=") {
        field.less_or_equal(parse_value(value))
    } else if let Some(value) = rest.strip_prefix('>') {
        field.greater_than(parse_value(value))
    } else if let Some(value) = rest.strip_prefix('<') {
        field.less_than(parse_value(value))
    } else if let Some(value) = rest.strip_prefix('=') {
        field.equals(parse_value(value))
    } else {
        bail!("unsupported operator in `{expr}`");
    };
    Ok(filter)
}

fn parse_value(text: &str) -> Value {
    let text = text.trim();
    Value::parse_json(text).unwrap_or_else(|| Value::from(text))
}

/// Parses a JSON object into a record.
pub fn parse_record(json: &str) -> Result<Record> {
    let value: serde_json::Value =
        serde_json::from_str(json).context("record is not valid JSON")?;
    Record::from_json(value)?.ok_or_else(|| anyhow!("record must be a JSON object"))
}

/// Builds the predicate for `query` from its flags.
pub fn build_predicate(filters: &[String], raw: Option<&str>) -> Result<Predicate> {
    match raw {
        Some(_) if !filters.is_empty() => bail!("--raw cannot be combined with --where"),
        Some(clause) => Ok(Predicate::raw(clause)),
        None => Ok(filters
            .iter()
            .map(|f| parse_filter(f))
            .collect::<Result<Vec<_>>>()?
            .into()),
    }
}

/// Inserts one record.
pub fn insert(conn: &mut Connection, collection: &str, json: &str) -> Result<String> {
    let record = parse_record(json)?;
    let table = conn.table(collection)?;
    table.insert(&record)?;
    info!(collection, fields = record.len(), "inserted record");
    Ok(format!("INSERT 1 ({} fields)", record.len()))
}

/// Runs a query and formats the matching records.
pub fn query(
    conn: &mut Connection,
    collection: &str,
    predicate: Predicate,
    format: OutputFormat,
) -> Result<String> {
    let table = conn.table(collection)?;
    let rows = table.query(predicate)?;
    Ok(format_records(&rows, format))
}

/// Removes every record from a collection.
pub fn truncate(conn: &mut Connection, collection: &str) -> Result<String> {
    conn.table(collection)?.truncate()?;
    Ok("TRUNCATE".to_string())
}

/// Lists a collection's columns.
pub fn columns(conn: &mut Connection, collection: &str, format: OutputFormat) -> Result<String> {
    let columns = conn.table(collection)?.columns()?;
    Ok(format_columns(&columns, format))
}

/// Walks through the basic operations on a scratch collection.
///
/// The collection is truncated first, so the demo can be replayed.
pub fn demo(conn: &mut Connection, collection: &str, format: OutputFormat) -> Result<String> {
    let table = conn.table(collection)?;
    table.truncate()?;

    let mut output = String::new();
    let mut show = |title: &str, table: &Collection, predicate: Predicate| -> Result<()> {
        let rows = table.query(predicate)?;
        output.push_str(&format!("-- {title}\n"));
        output.push_str(&format_records(&rows, format));
        if !output.ends_with('\n') {
            output.push('\n');
        }
        Ok(())
    };

    table.insert(
        &Record::new()
            .with("integer", 1)
            .with("floating_point", Value::from_f64(1.3)?)
            .with("string", "stuff"),
    )?;
    show("all records", &table, Predicate::All)?;
    show(
        "floating_point exists",
        &table,
        Field::new("floating_point").exists().into(),
    )?;
    show(
        "floating_point < 2",
        &table,
        Field::new("floating_point").less_than(2).into(),
    )?;
    show(
        "integer = 1 and string = 'stuff'",
        &table,
        Predicate::from([
            Field::new("integer").equals(1),
            Field::new("string").equals("stuff"),
        ]),
    )?;

    table.insert(&Record::new().with("list", vec!["one, two"]))?;
    show("list exists", &table, Field::new("list").exists().into())?;
    show("raw: string = 'stuff'", &table, Predicate::raw("string = 'stuff'"))?;

    Ok(output)
}
