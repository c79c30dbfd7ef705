//! Collection handles.

use std::sync::{Arc, Weak};

use docstore_common::{ColumnMap, Identifier, Record};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::connection::{transaction, Session, SharedSession};
use crate::error::{ClientError, ClientResult};
use crate::query::{Predicate, Statement};
use crate::schema::reconcile;

/// A handle on one collection.
///
/// Handles are cheap to clone; clones refer to the same collection. A
/// handle does not keep its connection alive: once the connection is
/// closed or dropped every operation fails with
/// [`ClientError::ConnectionClosed`].
#[derive(Clone)]
pub struct Collection {
    inner: Arc<CollectionInner>,
}

struct CollectionInner {
    name: Identifier,
    session: Weak<Mutex<Session>>,
}

impl Collection {
    /// Makes sure the table exists and returns a handle on it.
    pub(crate) fn open(name: Identifier, session: &SharedSession) -> ClientResult<Self> {
        {
            let mut guard = session.lock();
            let (engine, catalog, stats) = guard.parts()?;

            if catalog.exists(engine, &name)? {
                debug!(table = %name, "table already exists");
            } else {
                transaction(engine, |engine| Ok(engine.create_table(&name)?))?;
                catalog.invalidate(&name);
                stats.tables_created += 1;
                info!(table = %name, "created table");
            }

            let columns = catalog.refresh(engine, &name)?;
            info!(table = %name, columns = %columns, "collection ready");
        }

        Ok(Self {
            inner: Arc::new(CollectionInner {
                name,
                session: Arc::downgrade(session),
            }),
        })
    }

    /// Returns the collection name.
    pub fn name(&self) -> &str {
        self.inner.name.as_str()
    }

    /// Returns true if both handles refer to the same registered collection.
    pub fn ptr_eq(a: &Collection, b: &Collection) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Inserts a record as one row, adding columns for new fields first.
    ///
    /// Column additions and the row are committed together. On failure the
    /// transaction is rolled back and nothing is persisted.
    pub fn insert(&self, record: &Record) -> ClientResult<()> {
        let table = &self.inner.name;
        self.with_session(|session| {
            let (engine, catalog, stats) = session.parts()?;
            let result = transaction(engine, |engine| {
                let added = reconcile(engine, catalog, table, record)?;
                let statement = Statement::insert(engine.dialect(), table, record)?;
                engine.execute(&statement.sql, &statement.params)?;
                Ok(added.len() as u64)
            });

            match result {
                Ok(added) => {
                    stats.inserts += 1;
                    stats.columns_added += added;
                    Ok(())
                }
                Err(err) => {
                    catalog.invalidate(table);
                    stats.rollbacks += 1;
                    warn!(table = %table, error = %err, "insert rolled back");
                    Err(err)
                }
            }
        })
    }

    /// Returns the rows matching `predicate`, in engine order.
    ///
    /// Accepts a [`crate::Filter`], a list of filters (all must hold), a raw
    /// clause as `&str`, or [`Predicate::All`].
    pub fn query(&self, predicate: impl Into<Predicate>) -> ClientResult<Vec<Record>> {
        let predicate = predicate.into();
        let table = &self.inner.name;
        self.with_session(|session| {
            let (engine, catalog, stats) = session.parts()?;

            let mut columns = catalog.columns(engine, table)?;
            if predicate
                .filters()
                .iter()
                .any(|filter| !columns.contains(filter.field()))
            {
                columns = catalog.refresh(engine, table)?;
            }

            let statement = Statement::select(engine.dialect(), table, &predicate, &columns)?;
            let rows = engine.query(&statement.sql, &statement.params)?;

            if rows
                .first()
                .is_some_and(|row| row.keys().any(|field| !columns.contains(field)))
            {
                columns = catalog.refresh(engine, table)?;
            }
            stats.queries += 1;
            Ok(rows.into_iter().map(|row| normalize(row, &columns)).collect())
        })
    }

    /// Returns every row.
    pub fn all(&self) -> ClientResult<Vec<Record>> {
        self.query(Predicate::All)
    }

    /// Removes every row. Columns are kept.
    pub fn truncate(&self) -> ClientResult<()> {
        let table = &self.inner.name;
        self.with_session(|session| {
            let (engine, _, stats) = session.parts()?;
            let result = transaction(engine, |engine| Ok(engine.truncate(table)?));
            match result {
                Ok(()) => {
                    stats.truncates += 1;
                    info!(table = %table, "truncated");
                    Ok(())
                }
                Err(err) => {
                    stats.rollbacks += 1;
                    Err(err)
                }
            }
        })
    }

    /// Reads the collection's live columns from the catalog.
    pub fn columns(&self) -> ClientResult<ColumnMap> {
        let table = &self.inner.name;
        self.with_session(|session| {
            let (engine, catalog, _) = session.parts()?;
            catalog.refresh(engine, table)
        })
    }

    fn with_session<T>(&self, f: impl FnOnce(&mut Session) -> ClientResult<T>) -> ClientResult<T> {
        let session = self
            .inner
            .session
            .upgrade()
            .ok_or(ClientError::ConnectionClosed)?;
        let mut guard = session.lock();
        f(&mut guard)
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.inner.name)
            .field("open", &(self.inner.session.strong_count() > 0))
            .finish()
    }
}

fn normalize(row: Record, columns: &ColumnMap) -> Record {
    row.into_iter()
        .map(|(field, value)| {
            let value = match columns.get(&field) {
                Some(ty) => ty.normalize(value),
                None => value,
            };
            (field, value)
        })
        .collect()
}
