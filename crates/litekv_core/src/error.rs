//! Error types for litekv core.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
///
/// Every variant carries a descriptive message. Storage and codec failures
/// keep their original cause as the error source.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A required argument is missing or malformed.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong with the argument.
        message: String,
    },

    /// The table is not part of the store's configuration.
    #[error("table not found: {name:?} is not a configured table")]
    UnknownTable {
        /// Name of the table.
        name: String,
    },

    /// The store already holds `limit` records.
    #[error("store at limit: cannot add more records (limit {limit})")]
    CapacityExceeded {
        /// The configured record limit.
        limit: usize,
    },

    /// The configuration is unusable.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// A field could not be encrypted or decrypted.
    #[error("crypto error: {message}")]
    Crypto {
        /// Description of the failure.
        message: String,
    },

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] litekv_storage::StorageError),

    /// Table document error.
    #[error("codec error: {0}")]
    Codec(#[from] litekv_codec::CodecError),
}

impl StoreError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an unknown table error.
    pub fn unknown_table(name: impl Into<String>) -> Self {
        Self::UnknownTable { name: name.into() }
    }

    /// Creates a capacity exceeded error.
    pub fn capacity_exceeded(limit: usize) -> Self {
        Self::CapacityExceeded { limit }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates a crypto error.
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }
}
