//! In-memory storage backend.

use crate::backend::StorageBackend;
use crate::error::{validate_table_name, StorageResult};
use litekv_codec::{DataStyle, TableData};
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory storage backend.
///
/// Tables live in a map owned by the backend. Persistence is a clone in
/// and a clone out, so nothing survives the process. Suitable for:
/// - Unit tests
/// - Ephemeral caches that don't need persistence
///
/// # Example
///
/// ```rust
/// use litekv_codec::{DataStyle, TableData};
/// use litekv_storage::{InMemoryBackend, StorageBackend};
///
/// let mut backend = InMemoryBackend::new();
/// assert!(backend.ensure_table("main", DataStyle::Mapping).unwrap());
/// let table = backend.load_table("main").unwrap().unwrap();
/// assert!(table.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    tables: RwLock<HashMap<String, TableData>>,
}

impl InMemoryBackend {
    /// Creates a new backend with no tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend with pre-existing tables.
    ///
    /// Useful for testing representation migration.
    #[must_use]
    pub fn with_tables(tables: HashMap<String, TableData>) -> Self {
        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Returns the names of all stored tables.
    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl StorageBackend for InMemoryBackend {
    fn ensure_table(&mut self, table: &str, style: DataStyle) -> StorageResult<bool> {
        validate_table_name(table)?;
        let mut tables = self.tables.write();
        if tables.contains_key(table) {
            return Ok(false);
        }
        tables.insert(table.to_string(), TableData::empty(style));
        Ok(true)
    }

    fn load_table(&self, table: &str) -> StorageResult<Option<TableData>> {
        Ok(self.tables.read().get(table).cloned())
    }

    fn save_table(&mut self, table: &str, data: &TableData) -> StorageResult<()> {
        validate_table_name(table)?;
        self.tables.write().insert(table.to_string(), data.clone());
        Ok(())
    }

    fn table_exists(&self, table: &str) -> StorageResult<bool> {
        Ok(self.tables.read().contains_key(table))
    }

    fn is_persistent(&self) -> bool {
        false
    }
}
