//! Connections and the collection registry.
//!
//! A [`Connection`] owns one engine session. Collection handles it hands
//! out share that session through a weak reference, so closing or dropping
//! the connection invalidates every handle at once.

use std::collections::HashMap;
use std::sync::Arc;

use docstore_common::Identifier;
use docstore_engine::{Engine, PgEngine, SqliteEngine};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::collection::Collection;
use crate::config::{Backend, ConnectionConfig};
use crate::error::{ClientError, ClientResult};
use crate::schema::CatalogInspector;

/// Connection statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Tables created by [`Connection::table`].
    pub tables_created: u64,
    /// Columns added by schema evolution.
    pub columns_added: u64,
    /// Committed inserts.
    pub inserts: u64,
    /// Successful queries.
    pub queries: u64,
    /// Committed truncations.
    pub truncates: u64,
    /// Transactions rolled back after a failure.
    pub rollbacks: u64,
}

/// State shared between a connection and its collection handles.
pub(crate) struct Session {
    engine: Option<Box<dyn Engine>>,
    catalog: CatalogInspector,
    stats: ConnectionStats,
}

impl Session {
    /// Splits the session into its engine, catalog and statistics.
    pub(crate) fn parts(
        &mut self,
    ) -> ClientResult<(&mut dyn Engine, &mut CatalogInspector, &mut ConnectionStats)> {
        let engine: &mut dyn Engine = self
            .engine
            .as_deref_mut()
            .ok_or(ClientError::ConnectionClosed)?;
        Ok((engine, &mut self.catalog, &mut self.stats))
    }
}

pub(crate) type SharedSession = Arc<Mutex<Session>>;

/// Runs `f` between BEGIN and COMMIT, rolling back if it fails.
pub(crate) fn transaction<T>(
    engine: &mut dyn Engine,
    f: impl FnOnce(&mut dyn Engine) -> ClientResult<T>,
) -> ClientResult<T> {
    engine.begin()?;
    match f(engine) {
        Ok(value) => {
            if let Err(err) = engine.commit() {
                rollback(engine);
                return Err(err.into());
            }
            Ok(value)
        }
        Err(err) => {
            rollback(engine);
            Err(err)
        }
    }
}

fn rollback(engine: &mut dyn Engine) {
    if let Err(err) = engine.rollback() {
        warn!(error = %err, "rollback failed");
    }
}

/// An open session plus the registry of collections created through it.
///
/// ```no_run
/// use docstore_client::{Connection, ConnectionConfig, Field, Record};
///
/// let mut conn = Connection::open(ConnectionConfig::sqlite("docs.db"))?;
/// let people = conn.table("people")?;
/// people.insert(&Record::new().with("name", "Ada").with("age", 36))?;
/// let adults = people.query(Field::new("age").greater_or_equal(18))?;
/// assert_eq!(adults.len(), 1);
/// conn.close()?;
/// # Ok::<(), docstore_client::ClientError>(())
/// ```
pub struct Connection {
    session: SharedSession,
    registry: HashMap<Identifier, Collection>,
    config: ConnectionConfig,
}

impl Connection {
    /// Opens a session with the configured engine.
    pub fn open(config: ConnectionConfig) -> ClientResult<Self> {
        config.validate()?;
        info!(location = %config.location(), "opening connection");

        let engine: Box<dyn Engine> = match &config.backend {
            Backend::Postgres => Box::new(PgEngine::connect(&config.pg_options())?),
            Backend::Sqlite { path } => Box::new(SqliteEngine::open(path)?),
        };
        Ok(Self::with_engine(engine, config))
    }

    /// Wraps an already open engine session.
    pub fn with_engine(engine: Box<dyn Engine>, config: ConnectionConfig) -> Self {
        let session = Session {
            engine: Some(engine),
            catalog: CatalogInspector::new(config.cache_columns),
            stats: ConnectionStats::default(),
        };
        Self {
            session: Arc::new(Mutex::new(session)),
            registry: HashMap::new(),
            config,
        }
    }

    /// Returns the handle for a collection, creating its table if needed.
    ///
    /// Repeated calls with the same name return the same handle without
    /// touching the engine again.
    pub fn table(&mut self, name: &str) -> ClientResult<Collection> {
        let name = Identifier::parse(name)?;
        if let Some(collection) = self.registry.get(&name) {
            debug!(table = %name, "collection already registered");
            return Ok(collection.clone());
        }

        let collection = Collection::open(name.clone(), &self.session)?;
        self.registry.insert(name, collection.clone());
        Ok(collection)
    }

    /// Returns the names of registered collections.
    pub fn collections(&self) -> impl Iterator<Item = &str> {
        self.registry.keys().map(Identifier::as_str)
    }

    /// Returns a snapshot of the connection statistics.
    pub fn stats(&self) -> ConnectionStats {
        self.session.lock().stats.clone()
    }

    /// Returns the configuration this connection was opened with.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Ends the session.
    ///
    /// Every collection handle obtained from this connection fails with
    /// [`ClientError::ConnectionClosed`] afterwards.
    pub fn close(mut self) -> ClientResult<()> {
        self.registry.clear();
        let engine = {
            let mut session = self.session.lock();
            session.catalog.clear();
            session.engine.take()
        };
        if let Some(engine) = engine {
            engine.close()?;
            info!(location = %self.config.location(), "connection closed");
        }
        Ok(())
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("location", &self.config.location())
            .field("collections", &self.registry.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Record;

    fn memory() -> Connection {
        Connection::open(ConnectionConfig::sqlite_memory()).unwrap()
    }

    #[test]
    fn test_table_is_cached() {
        let mut conn = memory();
        let a = conn.table("test").unwrap();
        let b = conn.table("test").unwrap();
        assert!(Collection::ptr_eq(&a, &b));
        assert_eq!(conn.stats().tables_created, 1);
        assert_eq!(conn.collections().collect::<Vec<_>>(), vec!["test"]);
    }

    #[test]
    fn test_table_rejects_unsafe_name() {
        let mut conn = memory();
        assert!(matches!(
            conn.table("test; DROP TABLE x"),
            Err(ClientError::InvalidIdentifier(_))
        ));
        assert!(matches!(conn.table("select"), Err(ClientError::InvalidIdentifier(_))));
        assert_eq!(conn.collections().count(), 0);
    }

    #[test]
    fn test_close_invalidates_handles() {
        let mut conn = memory();
        let test = conn.table("test").unwrap();
        test.insert(&Record::new().with("n", 1)).unwrap();
        conn.close().unwrap();

        assert!(matches!(
            test.insert(&Record::new().with("n", 2)),
            Err(ClientError::ConnectionClosed)
        ));
        assert!(matches!(test.all(), Err(ClientError::ConnectionClosed)));
        assert!(matches!(test.truncate(), Err(ClientError::ConnectionClosed)));
    }

    #[test]
    fn test_transaction_rolls_back() {
        let mut engine = SqliteEngine::open_in_memory().unwrap();
        let table = Identifier::parse("t").unwrap();

        let result: ClientResult<()> = transaction(&mut engine, |engine| {
            engine.create_table(&table)?;
            Err(ClientError::InvalidFilter("abort".into()))
        });
        assert!(result.is_err());
        assert!(!engine.table_exists(&table).unwrap());

        transaction(&mut engine, |engine| Ok(engine.create_table(&table)?)).unwrap();
        assert!(engine.table_exists(&table).unwrap());
    }

    #[test]
    fn test_invalid_config() {
        let err = Connection::open(ConnectionConfig::new().port(0)).unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
    }
}
