//! # litekv Storage
//!
//! Table persistence backends for litekv.
//!
//! This crate is the lowest layer that touches storage. A backend loads and
//! saves whole tables; it knows nothing about keys, encryption or events.
//!
//! ## Design Principles
//!
//! - Whole-table reads and writes (read, mutate, write back)
//! - Loaded tables are independent copies
//! - Must be `Send + Sync`
//! - The store engine is written once against [`StorageBackend`]
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - Tables in process memory, nothing persisted
//! - [`FileBackend`] - One JSON document per table under a base directory
//!
//! ## Example
//!
//! ```rust
//! use litekv_codec::{DataStyle, Record};
//! use litekv_storage::{InMemoryBackend, StorageBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! backend.ensure_table("main", DataStyle::Mapping).unwrap();
//!
//! let mut table = backend.load_table("main").unwrap().unwrap();
//! table.upsert("a", Record { key: Some("a".into()), ..Record::default() });
//! backend.save_table("main", &table).unwrap();
//! assert_eq!(backend.load_table("main").unwrap().unwrap().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{validate_table_name, StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
