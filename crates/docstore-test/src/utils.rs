//! Connection fixtures and sample data.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use docstore_client::{Connection, ConnectionConfig, Record, Value};
use docstore_engine::SqliteEngine;
use rust_decimal::Decimal;
use tempfile::TempDir;

use crate::recording::{CallLog, RecordingEngine};

/// Installs a test-friendly `tracing` subscriber once per process.
///
/// Respects `RUST_LOG`; silent by default.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Opens a connection to a private in-memory database.
pub fn memory_connection() -> Connection {
    init_test_logging();
    Connection::open(ConnectionConfig::sqlite_memory()).expect("open in-memory database")
}

/// Opens an in-memory connection whose engine calls are recorded.
pub fn recorded_connection() -> (Connection, CallLog) {
    init_test_logging();
    let inner = SqliteEngine::open_in_memory().expect("open in-memory database");
    let (engine, log) = RecordingEngine::new(Box::new(inner));
    let conn = Connection::with_engine(Box::new(engine), ConnectionConfig::sqlite_memory());
    (conn, log)
}

/// The record used throughout the suites:
/// `{"integer": 1, "floating_point": 1.3, "string": "stuff"}`.
pub fn sample_record() -> Record {
    Record::new()
        .with("integer", 1)
        .with("floating_point", decimal("1.3"))
        .with("string", "stuff")
}

/// Builds a decimal value from its literal text.
pub fn decimal(text: &str) -> Value {
    Value::Decimal(Decimal::from_str(text).expect("decimal literal"))
}

/// A database file in a temporary directory, removed on drop.
pub struct TempDatabase {
    _dir: TempDir,
    path: PathBuf,
}

impl TempDatabase {
    /// Creates an empty temporary directory for the database file.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("docstore.db");
        Self { _dir: dir, path }
    }

    /// Returns the database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a configuration for the database file.
    pub fn config(&self) -> ConnectionConfig {
        ConnectionConfig::sqlite(&self.path)
    }

    /// Opens a new connection to the database file.
    pub fn connect(&self) -> Connection {
        init_test_logging();
        Connection::open(self.config()).expect("open database file")
    }

    /// Opens a new connection whose engine calls are recorded.
    pub fn connect_recorded(&self) -> (Connection, CallLog) {
        init_test_logging();
        let inner = SqliteEngine::open(&self.path).expect("open database file");
        let (engine, log) = RecordingEngine::new(Box::new(inner));
        (Connection::with_engine(Box::new(engine), self.config()), log)
    }
}

impl Default for TempDatabase {
    fn default() -> Self {
        Self::new()
    }
}
