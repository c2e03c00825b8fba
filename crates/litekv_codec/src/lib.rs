//! # litekv Codec
//!
//! Record model and table documents for litekv.
//!
//! A table is stored as one JSON document, either a mapping keyed by
//! composed key or a sequence in insertion order:
//!
//! ```text
//! mapping:  {"user_1": {"type":"string","key":"user_1","value":"ada"}}
//! sequence: [{"type":"string","key":"user_1","value":"ada"}]
//! ```
//!
//! ## Usage
//!
//! ```
//! use litekv_codec::{decode_table, encode_table, DataStyle, Record, TableData};
//!
//! let mut table = TableData::empty(DataStyle::Sequence);
//! table.upsert("a", Record { key: Some("a".into()), ..Record::default() });
//!
//! let bytes = encode_table(&table).unwrap();
//! let mapping = decode_table(&bytes).unwrap().unwrap().into_style(DataStyle::Mapping);
//! assert!(mapping.get("a").is_some());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod convert;
mod error;
mod json;
mod record;
mod table;

pub use convert::{mapping_to_sequence, sequence_to_mapping};
pub use error::{CodecError, CodecResult};
pub use json::{decode_table, encode_table};
pub use record::{is_falsy, Record, RecordType};
pub use table::{DataStyle, RecordMap, TableData};

/// Re-exported so downstream crates share one JSON value type.
pub use serde_json::Value;
