//! Output formatting for records and column maps.
//!
//! Supports table, JSON, CSV, and raw output formats.

use comfy_table::{Cell, ContentArrangement, Table};
use docstore_client::{ColumnMap, Record, Value};
use serde_json::Value as JsonValue;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Formatted table output.
    Table,
    /// JSON output.
    Json,
    /// CSV output.
    Csv,
    /// Raw output (values separated by tabs).
    Raw,
}

impl OutputFormat {
    /// Parses a format name as used in the configuration file.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "csv" => Some(OutputFormat::Csv),
            "raw" => Some(OutputFormat::Raw),
            _ => None,
        }
    }
}

/// Rows laid out under a shared header.
///
/// Records in one collection may have different fields set, so the header
/// is the union of their fields in first-seen order and absent fields are
/// left blank.
struct Grid {
    columns: Vec<String>,
    rows: Vec<Vec<Option<Value>>>,
}

impl Grid {
    fn from_records(records: &[Record]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            for field in record.keys() {
                if !columns.iter().any(|c| c == field) {
                    columns.push(field.to_string());
                }
            }
        }
        let rows = records
            .iter()
            .map(|record| columns.iter().map(|c| record.get(c).cloned()).collect())
            .collect();
        Self { columns, rows }
    }

    fn from_columns(columns: &ColumnMap) -> Self {
        Self {
            columns: vec!["column".to_string(), "type".to_string()],
            rows: columns
                .iter()
                .map(|(name, ty)| {
                    vec![
                        Some(Value::from(name.as_str())),
                        Some(Value::from(ty.sql_name())),
                    ]
                })
                .collect(),
        }
    }
}

/// Formats records according to the specified format.
pub fn format_records(records: &[Record], format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        let rows: Vec<JsonValue> = records.iter().map(Record::to_json).collect();
        return to_pretty_json(&JsonValue::Array(rows));
    }
    format_grid(&Grid::from_records(records), format)
}

/// Formats a column map according to the specified format.
pub fn format_columns(columns: &ColumnMap, format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        let map = columns
            .iter()
            .map(|(name, ty)| (name.clone(), JsonValue::from(ty.sql_name())))
            .collect();
        return to_pretty_json(&JsonValue::Object(map));
    }
    format_grid(&Grid::from_columns(columns), format)
}

fn format_grid(grid: &Grid, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table | OutputFormat::Json => format_table(grid),
        OutputFormat::Csv => format_csv(grid),
        OutputFormat::Raw => format_raw(grid),
    }
}

fn to_pretty_json(value: &JsonValue) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "[]".to_string())
}

fn cell_text(value: &Option<Value>) -> String {
    match value {
        Some(Value::Null) | None => String::new(),
        Some(value) => value.to_string(),
    }
}

/// Formats the grid as a table.
fn format_table(grid: &Grid) -> String {
    let mut table = Table::new();

    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);

    if !grid.columns.is_empty() {
        table.set_header(grid.columns.iter().map(Cell::new));
    }

    for row in &grid.rows {
        table.add_row(row.iter().map(|v| Cell::new(cell_text(v))));
    }

    table.to_string()
}

/// Formats the grid as CSV.
fn format_csv(grid: &Grid) -> String {
    let mut output = String::new();

    if !grid.columns.is_empty() {
        let header: Vec<String> = grid.columns.iter().map(|c| escape_csv(c)).collect();
        output.push_str(&header.join(","));
        output.push('\n');
    }

    for row in &grid.rows {
        let values: Vec<String> = row.iter().map(|v| escape_csv(&cell_text(v))).collect();
        output.push_str(&values.join(","));
        output.push('\n');
    }

    output
}

/// Escapes a value for CSV output.
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Formats the grid as raw tab-separated values.
fn format_raw(grid: &Grid) -> String {
    let mut output = String::new();

    if !grid.columns.is_empty() {
        output.push_str(&grid.columns.join("\t"));
        output.push('\n');
    }

    for row in &grid.rows {
        let values: Vec<String> = row.iter().map(cell_text).collect();
        output.push_str(&values.join("\t"));
        output.push('\n');
    }

    output
}
