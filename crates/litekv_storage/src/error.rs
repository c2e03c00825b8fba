//! Error types for storage operations.

use litekv_codec::CodecError;
use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A table document could not be encoded or decoded.
    #[error("table document error: {0}")]
    Codec(#[from] CodecError),

    /// The table name cannot be mapped to storage.
    #[error("invalid table name: {name:?}")]
    InvalidTableName {
        /// The rejected name.
        name: String,
    },
}

/// Checks that a table name is usable as a directory and file stem.
///
/// # Errors
///
/// Returns [`StorageError::InvalidTableName`] for empty names, names that
/// contain a path separator, and `.`/`..`.
pub fn validate_table_name(name: &str) -> StorageResult<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(StorageError::InvalidTableName {
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names() {
        assert!(validate_table_name("main").is_ok());
        assert!(validate_table_name("user-sessions_2").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("..").is_err());
        assert!(validate_table_name("a/b").is_err());
        assert!(validate_table_name("a\\b").is_err());
    }
}
