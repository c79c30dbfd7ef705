//! Catalog reads with an optional per-table column cache.

use std::collections::HashMap;

use docstore_common::{ColumnMap, Identifier};
use docstore_engine::Engine;
use tracing::trace;

use crate::error::ClientResult;

/// Answers existence and column questions about tables.
///
/// Reads never change the engine. With caching enabled the last column map
/// seen for each table is kept until [`CatalogInspector::invalidate`] or
/// [`CatalogInspector::refresh`] replaces it.
#[derive(Debug, Default)]
pub struct CatalogInspector {
    cache: Option<HashMap<Identifier, ColumnMap>>,
}

impl CatalogInspector {
    /// Creates an inspector, caching column maps when `cache` is set.
    pub fn new(cache: bool) -> Self {
        Self {
            cache: cache.then(HashMap::new),
        }
    }

    /// Returns whether column maps are cached.
    pub fn is_caching(&self) -> bool {
        self.cache.is_some()
    }

    /// Checks whether a table exists in the active schema.
    pub fn exists(&self, engine: &mut dyn Engine, table: &Identifier) -> ClientResult<bool> {
        Ok(engine.table_exists(table)?)
    }

    /// Returns the table's columns, from the cache when possible.
    ///
    /// A missing table yields an empty map.
    pub fn columns(&mut self, engine: &mut dyn Engine, table: &Identifier) -> ClientResult<ColumnMap> {
        if let Some(columns) = self.cache.as_ref().and_then(|cache| cache.get(table)) {
            trace!(table = %table, "column cache hit");
            return Ok(columns.clone());
        }
        self.refresh(engine, table)
    }

    /// Reads the table's columns from the engine and updates the cache.
    pub fn refresh(&mut self, engine: &mut dyn Engine, table: &Identifier) -> ClientResult<ColumnMap> {
        let columns = engine.columns(table)?;
        trace!(table = %table, columns = %columns, "read columns from catalog");
        if let Some(cache) = self.cache.as_mut() {
            cache.insert(table.clone(), columns.clone());
        }
        Ok(columns)
    }

    /// Drops the cached column map for a table.
    pub fn invalidate(&mut self, table: &Identifier) {
        if let Some(cache) = self.cache.as_mut() {
            cache.remove(table);
        }
    }

    /// Drops every cached column map.
    pub fn clear(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstore_common::StorageType;
    use docstore_engine::SqliteEngine;

    fn ident(name: &str) -> Identifier {
        Identifier::parse(name).unwrap()
    }

    #[test]
    fn test_missing_table() {
        let mut engine = SqliteEngine::open_in_memory().unwrap();
        let mut catalog = CatalogInspector::new(true);
        let table = ident("nothing");

        assert!(!catalog.exists(&mut engine, &table).unwrap());
        assert!(catalog.columns(&mut engine, &table).unwrap().is_empty());
    }

    #[test]
    fn test_cache_serves_stale_until_refresh() {
        let mut engine = SqliteEngine::open_in_memory().unwrap();
        let mut catalog = CatalogInspector::new(true);
        let table = ident("docs");
        engine.create_table(&table).unwrap();

        assert!(catalog.columns(&mut engine, &table).unwrap().is_empty());
        engine
            .add_column(&table, &ident("n"), &StorageType::Integer)
            .unwrap();

        assert!(catalog.columns(&mut engine, &table).unwrap().is_empty());
        let live = catalog.refresh(&mut engine, &table).unwrap();
        assert_eq!(live.get("n"), Some(&StorageType::Integer));
        assert!(catalog.columns(&mut engine, &table).unwrap().contains("n"));

        engine
            .add_column(&table, &ident("s"), &StorageType::Text)
            .unwrap();
        catalog.invalidate(&table);
        assert_eq!(catalog.columns(&mut engine, &table).unwrap().len(), 2);
    }

    #[test]
    fn test_uncached_reads_are_live() {
        let mut engine = SqliteEngine::open_in_memory().unwrap();
        let mut catalog = CatalogInspector::new(false);
        let table = ident("docs");
        engine.create_table(&table).unwrap();

        assert!(!catalog.is_caching());
        assert!(catalog.columns(&mut engine, &table).unwrap().is_empty());
        engine
            .add_column(&table, &ident("n"), &StorageType::Integer)
            .unwrap();
        assert!(catalog.columns(&mut engine, &table).unwrap().contains("n"));
    }
}
