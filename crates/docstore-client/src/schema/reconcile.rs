//! Grows a table's columns to fit a record.

use docstore_common::{ColumnMap, Identifier, Record, StorageType, Value};
use docstore_engine::{Engine, EngineError, EngineErrorKind};
use tracing::info;

use super::catalog::CatalogInspector;
use crate::error::{ClientError, ClientResult, SchemaConflict};

/// A column the reconciler adds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnChange {
    /// Column name.
    pub column: Identifier,
    /// Storage type inferred from the record's value.
    pub ty: StorageType,
}

/// Lists the columns `record` needs that `columns` lacks, in record order.
///
/// Fails on the first field whose name is unsafe, whose value does not fit
/// its existing column, or whose value kind has no storage type.
pub fn plan(columns: &ColumnMap, record: &Record) -> ClientResult<Vec<ColumnChange>> {
    let mut changes = Vec::new();
    for (field, value) in record {
        let column = Identifier::parse(field)?;
        if let Some(existing) = columns.get(column.as_str()) {
            if !existing.accepts(value) {
                return Err(type_mismatch(&column, existing, value));
            }
            continue;
        }
        let ty = StorageType::infer(value.kind()).map_err(|kind| SchemaConflict::UnmappedValue {
            field: field.clone(),
            kind,
        })?;
        changes.push(ColumnChange { column, ty });
    }
    Ok(changes)
}

/// Adds every column `record` needs to `table`, then checks the catalog.
///
/// Runs inside the caller's transaction. A column created concurrently with
/// the same type is accepted; one created with a different type is a
/// [`SchemaConflict::IncompatibleColumn`]. Returns the planned changes.
pub fn reconcile(
    engine: &mut dyn Engine,
    catalog: &mut CatalogInspector,
    table: &Identifier,
    record: &Record,
) -> ClientResult<Vec<ColumnChange>> {
    let current = catalog.columns(engine, table)?;
    let changes = plan(&current, record)?;
    if changes.is_empty() {
        return Ok(changes);
    }

    for change in &changes {
        engine
            .add_column(table, &change.column, &change.ty)
            .map_err(|source| evolution_failure(&change.column, source))?;
        info!(table = %table, column = %change.column, ty = %change.ty, "added column");
    }

    let live = catalog.refresh(engine, table)?;
    for change in &changes {
        match live.get(change.column.as_str()) {
            Some(found) if *found == change.ty => {}
            Some(found) => {
                return Err(SchemaConflict::IncompatibleColumn {
                    column: change.column.to_string(),
                    expected: change.ty.clone(),
                    found: found.clone(),
                }
                .into())
            }
            None => {
                return Err(SchemaConflict::Vanished {
                    column: change.column.to_string(),
                }
                .into())
            }
        }
    }
    Ok(changes)
}

fn type_mismatch(column: &Identifier, ty: &StorageType, value: &Value) -> ClientError {
    ClientError::TypeMismatch(EngineError::new(
        EngineErrorKind::TypeMismatch,
        format!(
            "column {} is {ty} and cannot store a {} value",
            column.quoted(),
            value.kind()
        ),
    ))
}

fn evolution_failure(column: &Identifier, source: EngineError) -> ClientError {
    match source.kind() {
        EngineErrorKind::Connection | EngineErrorKind::Closed => source.into(),
        _ => SchemaConflict::Evolution {
            column: column.to_string(),
            source,
        }
        .into(),
    }
}
