//! Storage backend trait definition.

use crate::error::StorageResult;
use litekv_codec::{DataStyle, TableData};

/// Persistence strategy for litekv tables.
///
/// A backend stores whole tables. The store engine reads a table, changes
/// it in memory and writes the whole table back; backends never see
/// individual records.
///
/// # Invariants
///
/// - `load_table` returns an independent copy; mutating it never changes
///   stored state until `save_table` is called
/// - `save_table` replaces the table wholesale
/// - `ensure_table` never overwrites existing storage
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - Tables live in process memory
/// - [`super::FileBackend`] - One JSON document per table
pub trait StorageBackend: Send + Sync {
    /// Creates empty storage of the given shape if the table has none.
    ///
    /// Returns `true` if storage was created.
    ///
    /// # Errors
    ///
    /// Returns an error if the table name is invalid or an I/O error occurs.
    fn ensure_table(&mut self, table: &str, style: DataStyle) -> StorageResult<bool>;

    /// Loads a table.
    ///
    /// Returns `None` when the table has no storage or its document is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or decoded.
    fn load_table(&self, table: &str) -> StorageResult<Option<TableData>>;

    /// Replaces the stored contents of a table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be written.
    fn save_table(&mut self, table: &str, data: &TableData) -> StorageResult<()>;

    /// Returns true if storage exists for the table.
    ///
    /// # Errors
    ///
    /// Returns an error if existence cannot be determined.
    fn table_exists(&self, table: &str) -> StorageResult<bool>;

    /// Returns true when tables survive the process.
    ///
    /// The store engine only keeps a read-through cache in front of
    /// persistent backends.
    fn is_persistent(&self) -> bool;
}
