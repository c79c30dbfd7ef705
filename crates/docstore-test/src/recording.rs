//! An [`Engine`] that forwards to another engine and records each call.

use std::sync::Arc;

use docstore_client::{ColumnMap, Identifier, Record, StorageType, Value};
use docstore_engine::{Dialect, Engine, EngineResult};
use parking_lot::Mutex;

/// One recorded engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Engine method name, e.g. `create_table`.
    pub op: &'static str,
    /// Table, column or SQL text the call was about.
    pub target: String,
}

/// Shared view of the calls made through a [`RecordingEngine`].
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
    fn push(&self, op: &'static str, target: impl Into<String>) {
        self.calls.lock().push(Call {
            op,
            target: target.into(),
        });
    }

    /// Returns a copy of every call so far.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Counts calls of one method.
    pub fn count(&self, op: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.op == op).count()
    }

    /// Returns the targets of calls of one method, in call order.
    pub fn targets(&self, op: &str) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.op == op)
            .map(|c| c.target.clone())
            .collect()
    }

    /// Forgets every recorded call.
    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

/// Forwards every call to an inner engine after recording it.
pub struct RecordingEngine {
    inner: Box<dyn Engine>,
    log: CallLog,
}

impl RecordingEngine {
    /// Wraps an engine, returning the wrapper and its call log.
    pub fn new(inner: Box<dyn Engine>) -> (Self, CallLog) {
        let log = CallLog::default();
        (
            Self {
                inner,
                log: log.clone(),
            },
            log,
        )
    }
}

impl Engine for RecordingEngine {
    fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }

    fn batch(&mut self, sql: &str) -> EngineResult<()> {
        self.log.push("batch", sql);
        self.inner.batch(sql)
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> EngineResult<u64> {
        self.log.push("execute", sql);
        self.inner.execute(sql, params)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> EngineResult<Vec<Record>> {
        self.log.push("query", sql);
        self.inner.query(sql, params)
    }

    fn table_exists(&mut self, table: &Identifier) -> EngineResult<bool> {
        self.log.push("table_exists", table.as_str());
        self.inner.table_exists(table)
    }

    fn columns(&mut self, table: &Identifier) -> EngineResult<ColumnMap> {
        self.log.push("columns", table.as_str());
        self.inner.columns(table)
    }

    fn create_table(&mut self, table: &Identifier) -> EngineResult<()> {
        self.log.push("create_table", table.as_str());
        self.inner.create_table(table)
    }

    fn add_column(
        &mut self,
        table: &Identifier,
        column: &Identifier,
        ty: &StorageType,
    ) -> EngineResult<()> {
        self.log.push("add_column", column.as_str());
        self.inner.add_column(table, column, ty)
    }

    fn truncate(&mut self, table: &Identifier) -> EngineResult<()> {
        self.log.push("truncate", table.as_str());
        self.inner.truncate(table)
    }

    fn begin(&mut self) -> EngineResult<()> {
        self.log.push("begin", "");
        self.inner.begin()
    }

    fn commit(&mut self) -> EngineResult<()> {
        self.log.push("commit", "");
        self.inner.commit()
    }

    fn rollback(&mut self) -> EngineResult<()> {
        self.log.push("rollback", "");
        self.inner.rollback()
    }

    fn close(self: Box<Self>) -> EngineResult<()> {
        self.log.push("close", "");
        self.inner.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstore_engine::SqliteEngine;

    #[test]
    fn test_records_and_forwards() {
        let inner = SqliteEngine::open_in_memory().unwrap();
        let (mut engine, log) = RecordingEngine::new(Box::new(inner));
        let table = Identifier::parse("t").unwrap();

        engine.create_table(&table).unwrap();
        assert!(engine.table_exists(&table).unwrap());
        assert_eq!(log.count("create_table"), 1);
        assert_eq!(log.targets("table_exists"), vec!["t"]);

        log.clear();
        assert!(log.calls().is_empty());
    }
}
