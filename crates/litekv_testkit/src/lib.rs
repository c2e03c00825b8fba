//! # litekv Testkit
//!
//! Test utilities for litekv.
//!
//! This crate provides:
//! - Store fixtures over memory and temporary directories
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use litekv_testkit::prelude::*;
//! use litekv_core::{KeyArgs, SetArgs, StoreConfig};
//!
//! for mut store in TestStore::both(StoreConfig::default()) {
//!     store.set("main", SetArgs::new("a").value("x")).unwrap();
//!     assert!(store.has("main", KeyArgs::new("a")).unwrap());
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
