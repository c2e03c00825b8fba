//! CLI command implementations.

pub mod inspect;
pub mod keygen;
pub mod migrate;
pub mod records;
