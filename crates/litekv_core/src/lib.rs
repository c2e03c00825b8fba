//! # litekv Core
//!
//! Store engine for litekv.
//!
//! This crate provides:
//! - [`Store`] with table-scoped get/set/delete, batches, scans, clear and
//!   clean
//! - A record builder for composed keys, type tags and the sparse-field rule
//! - Optional AES-256-CTR field encryption
//! - A read-through cache for disk-backed stores
//! - Store events and operation counters
//!
//! ## Example
//!
//! ```rust
//! use litekv_core::{KeyArgs, SetArgs, Store, StoreConfig, StoreError};
//!
//! let mut store = Store::open_in_memory(StoreConfig::new().limit(2)).unwrap();
//! store.set("main", SetArgs::new("a").value("x")).unwrap();
//! store.set("main", SetArgs::new("b").value("y")).unwrap();
//!
//! let err = store.set("main", SetArgs::new("c").value("z")).unwrap_err();
//! assert!(matches!(err, StoreError::CapacityExceeded { .. }));
//!
//! assert!(store.delete("main", KeyArgs::new("a")).unwrap());
//! store.set("main", SetArgs::new("c").value("z")).unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod clock;
mod config;
mod crypto;
mod element;
mod error;
mod events;
mod stats;
mod store;

pub use cache::{
    record_key, snapshot_key, CachePayload, ReadCache, CLEANED_PREFIX, CLEARED_PREFIX,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    EncryptionConfig, EncryptionMode, KeyOptions, StoreConfig, DEFAULT_TABLE, IV_SIZE,
    SECRET_SIZE,
};
pub use crypto::{FieldCipher, FieldCodec};
pub use element::{build_record, compose_key, generate_id, BuiltRecord, RecordInput};
pub use error::{StoreError, StoreResult};
pub use events::{EventBus, StoreEvent};
pub use stats::{StatsSnapshot, StoreStats};
pub use store::{KeyArgs, SetArgs, Store};

pub use litekv_codec::{DataStyle, Record, RecordType, TableData, Value};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
