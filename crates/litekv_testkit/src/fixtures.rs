//! Test fixtures and store helpers.
//!
//! Provides convenience functions for opening test stores over memory or a
//! temporary directory, and for reading tables as they are stored.

use litekv_codec::TableData;
use litekv_core::{EncryptionConfig, EncryptionMode, Store, StoreConfig, IV_SIZE};
use litekv_storage::{FileBackend, StorageBackend};
use std::path::Path;
use tempfile::TempDir;

/// A 32-character secret for encrypted test stores.
pub const TEST_SECRET: &str = "a03uxnOdyls8rga9quebx9apejfyz9wl";

/// A fixed IV for encrypted test stores.
pub const TEST_IV: [u8; IV_SIZE] = [0x5a; IV_SIZE];

/// Returns a default configuration with encryption enabled in `mode`.
pub fn encrypted_config(mode: EncryptionMode) -> StoreConfig {
    StoreConfig::new().encryption(EncryptionConfig::new(TEST_SECRET, TEST_IV, mode))
}

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: Store,
    temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Opens an in-memory store.
    pub fn memory(config: StoreConfig) -> Self {
        Self {
            store: Store::open_in_memory(config).expect("Failed to open in-memory store"),
            temp_dir: None,
        }
    }

    /// Opens a file-backed store in a fresh temporary directory.
    ///
    /// `config.path` is replaced by the temporary directory.
    pub fn file(config: StoreConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store =
            Store::open(config.path(temp_dir.path())).expect("Failed to open file store");
        Self {
            store,
            temp_dir: Some(temp_dir),
        }
    }

    /// Opens one store of each kind with the same configuration.
    pub fn both(config: StoreConfig) -> [Self; 2] {
        [Self::memory(config.clone()), Self::file(config)]
    }

    /// Returns a label for assertion messages.
    pub fn kind(&self) -> &'static str {
        if self.temp_dir.is_some() {
            "file"
        } else {
            "memory"
        }
    }

    /// Returns the store directory if file-based, None if in-memory.
    pub fn path(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(TempDir::path)
    }

    /// Opens a second handle on the same directory. Returns `None` for
    /// in-memory stores.
    pub fn reopen(&self, config: StoreConfig) -> Option<Store> {
        let path = self.path()?;
        Some(Store::open(config.path(path)).expect("Failed to reopen file store"))
    }

    /// Reads a table exactly as stored, without decryption. Returns `None`
    /// for in-memory stores or a missing table.
    pub fn raw_table(&self, table: &str) -> Option<TableData> {
        let backend = FileBackend::new(self.path()?);
        backend.load_table(table).expect("Failed to read raw table")
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

impl std::ops::DerefMut for TestStore {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.store
    }
}

/// Writes a table document directly under `dir`, bypassing any store.
pub fn write_raw_table(dir: &Path, table: &str, data: &TableData) {
    FileBackend::new(dir)
        .save_table(table, data)
        .expect("Failed to write raw table");
}

/// Runs a test with a store of each kind.
pub fn with_each_store<F>(config: StoreConfig, mut f: F)
where
    F: FnMut(&mut TestStore),
{
    for mut store in TestStore::both(config) {
        f(&mut store);
    }
}
