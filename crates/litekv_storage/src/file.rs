//! File-based storage backend for persistent tables.

use crate::backend::StorageBackend;
use crate::error::{validate_table_name, StorageResult};
use litekv_codec::{decode_table, encode_table, DataStyle, TableData};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix of every table document.
const TABLE_FILE_SUFFIX: &str = "-store.json";
/// Suffix of the temporary file used for table writes.
const TEMP_SUFFIX: &str = ".tmp";

/// A file-based storage backend.
///
/// Each table is one JSON document:
///
/// ```text
/// <base>/
/// ├─ main/
/// │  └─ main-store.json
/// └─ sessions/
///    └─ sessions-store.json
/// ```
///
/// # Durability
///
/// `save_table` writes the full document to a temporary file next to the
/// table and renames it over the live file. There is no journal; a table
/// is exactly as durable as its last completed write.
///
/// # Example
///
/// ```no_run
/// use litekv_codec::DataStyle;
/// use litekv_storage::{FileBackend, StorageBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::new(Path::new("./database"));
/// backend.ensure_table("main", DataStyle::Mapping).unwrap();
/// let table = backend.load_table("main").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct FileBackend {
    base: PathBuf,
}

impl FileBackend {
    /// Creates a backend rooted at `base`. Nothing is touched on disk until
    /// a table is ensured or saved.
    #[must_use]
    pub fn new(base: &Path) -> Self {
        Self {
            base: base.to_path_buf(),
        }
    }

    /// Returns the base directory.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Returns the directory holding a table's document.
    #[must_use]
    pub fn table_dir(&self, table: &str) -> PathBuf {
        self.base.join(table)
    }

    /// Returns the path of a table's document.
    #[must_use]
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.table_dir(table)
            .join(format!("{table}{TABLE_FILE_SUFFIX}"))
    }

    fn temp_path(&self, table: &str) -> PathBuf {
        self.table_dir(table)
            .join(format!("{table}{TABLE_FILE_SUFFIX}{TEMP_SUFFIX}"))
    }
}

impl StorageBackend for FileBackend {
    fn ensure_table(&mut self, table: &str, style: DataStyle) -> StorageResult<bool> {
        validate_table_name(table)?;
        if self.table_path(table).exists() {
            return Ok(false);
        }

        fs::create_dir_all(self.table_dir(table))?;
        self.save_table(table, &TableData::empty(style))?;
        debug!(table, %style, "created table storage");
        Ok(true)
    }

    fn load_table(&self, table: &str) -> StorageResult<Option<TableData>> {
        validate_table_name(table)?;
        let bytes = match fs::read(self.table_path(table)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(decode_table(&bytes)?)
    }

    fn save_table(&mut self, table: &str, data: &TableData) -> StorageResult<()> {
        validate_table_name(table)?;
        let bytes = encode_table(data)?;

        fs::create_dir_all(self.table_dir(table))?;
        let temp = self.temp_path(table);
        fs::write(&temp, &bytes)?;
        fs::rename(&temp, self.table_path(table))?;
        Ok(())
    }

    fn table_exists(&self, table: &str) -> StorageResult<bool> {
        validate_table_name(table)?;
        Ok(self.table_path(table).exists())
    }

    fn is_persistent(&self) -> bool {
        true
    }
}
