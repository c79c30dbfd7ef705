//! The engine interface.

use docstore_common::{ColumnMap, Identifier, Record, StorageType, Value};
use tracing::debug;

use crate::dialect::Dialect;
use crate::error::EngineResult;

/// A single session with a relational engine.
///
/// All calls block until the engine acknowledges them. Implementations
/// run statements in autocommit mode unless [`Engine::begin`] has opened
/// an explicit transaction.
pub trait Engine: Send {
    /// Returns the SQL dialect statements must be written in.
    fn dialect(&self) -> Dialect;

    /// Executes one or more statements without parameters.
    fn batch(&mut self, sql: &str) -> EngineResult<()>;

    /// Executes a statement with bound parameters, returning affected rows.
    fn execute(&mut self, sql: &str, params: &[Value]) -> EngineResult<u64>;

    /// Runs a query with bound parameters, returning rows in engine order.
    ///
    /// Each row maps column names to values in select-list order.
    fn query(&mut self, sql: &str, params: &[Value]) -> EngineResult<Vec<Record>>;

    /// Checks the catalog for a table in the active schema.
    fn table_exists(&mut self, table: &Identifier) -> EngineResult<bool>;

    /// Reads a table's live column names and storage types.
    fn columns(&mut self, table: &Identifier) -> EngineResult<ColumnMap>;

    /// Creates an empty table; an existing table counts as success.
    fn create_table(&mut self, table: &Identifier) -> EngineResult<()> {
        let sql = self.dialect().create_table(table);
        debug!(%sql, "create table");
        absorb_already_exists(self.batch(&sql))
    }

    /// Adds a column; an existing column counts as success.
    fn add_column(
        &mut self,
        table: &Identifier,
        column: &Identifier,
        ty: &StorageType,
    ) -> EngineResult<()> {
        let sql = self.dialect().add_column(table, column, ty);
        debug!(%sql, "add column");
        absorb_already_exists(self.batch(&sql))
    }

    /// Removes every row from a table.
    fn truncate(&mut self, table: &Identifier) -> EngineResult<()> {
        let sql = self.dialect().truncate(table);
        debug!(%sql, "truncate");
        self.batch(&sql)
    }

    /// Opens an explicit transaction.
    fn begin(&mut self) -> EngineResult<()> {
        self.batch("BEGIN")
    }

    /// Commits the open transaction.
    fn commit(&mut self) -> EngineResult<()> {
        self.batch("COMMIT")
    }

    /// Rolls back the open transaction.
    fn rollback(&mut self) -> EngineResult<()> {
        self.batch("ROLLBACK")
    }

    /// Ends the session, releasing the underlying connection.
    fn close(self: Box<Self>) -> EngineResult<()>;
}

fn absorb_already_exists(result: EngineResult<()>) -> EngineResult<()> {
    match result {
        Err(err) if err.is_already_exists() => {
            debug!(error = %err, "object already exists");
            Ok(())
        }
        other => other,
    }
}
