//! Record builder.
//!
//! Turns caller input into the canonical stored record and its composed
//! key. The builder never reads the clock itself; callers pass the current
//! time in so the output is deterministic.

use crate::config::KeyOptions;
use crate::error::{StoreError, StoreResult};
use litekv_codec::{is_falsy, Record, RecordType, Value};
use std::time::Duration;

/// Raw input for one record.
#[derive(Debug, Clone, Default)]
pub struct RecordInput<'a> {
    /// Base key. Must be non-empty.
    pub key: &'a str,
    /// Explicit id appended to the key.
    pub id: Option<&'a str>,
    /// Value to store.
    pub value: Option<Value>,
    /// Lifetime relative to now.
    pub ttl: Option<Duration>,
}

/// A built record with the key it is addressed by.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltRecord {
    /// Plaintext composed key.
    pub composed_key: String,
    /// The sparse record.
    pub record: Record,
}

/// Generates the pseudo-id appended when random ids are enabled.
///
/// The id is the sum of the key's UTF-16 code units followed by the last
/// four digits of the millisecond clock. It is a weak uniqueness scheme:
/// two keys with the same code unit sum written in the same millisecond
/// window collide. It is not a UUID.
#[must_use]
pub fn generate_id(key: &str, now_millis: u64) -> String {
    let sum: u64 = key.encode_utf16().map(u64::from).sum();
    format!("{sum}{}", now_millis % 10_000)
}

/// Composes the key a record is stored and looked up under.
///
/// An explicit non-empty `id` wins. Otherwise a generated id is appended
/// when `append_random_id` is set. Because the generated id depends on
/// the clock, a lookup without an explicit id almost never finds a record
/// written with a generated one.
#[must_use]
pub fn compose_key(key: &str, id: Option<&str>, append_random_id: bool, now_millis: u64) -> String {
    match id.filter(|id| !id.is_empty()) {
        Some(id) => format!("{key}_{id}"),
        None if append_random_id => format!("{key}_{}", generate_id(key, now_millis)),
        None => key.to_string(),
    }
}

/// Checks that a key was supplied.
pub(crate) fn require_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::invalid_argument("key must be a non-empty string"));
    }
    Ok(())
}

/// Builds the stored record for `input`.
///
/// Falsy fields are dropped: `value` when it is `null`, `false`, `0` or
/// `""`, and `ttl` when zero. The `type` tag is inferred from the value
/// before that happens, so `set("z", 0)` stores a `number` record with no
/// value.
///
/// # Errors
///
/// Returns [`StoreError::InvalidArgument`] when the key is empty.
pub fn build_record(
    input: RecordInput<'_>,
    options: KeyOptions,
    now_millis: u64,
) -> StoreResult<BuiltRecord> {
    require_key(input.key)?;

    let composed_key = compose_key(input.key, input.id, options.append_random_id, now_millis);
    let kind = input
        .value
        .as_ref()
        .and_then(RecordType::infer)
        .filter(|_| options.include_type_field)
        .map(|t| t.as_str().to_string());
    let ttl = input
        .ttl
        .filter(|ttl| !ttl.is_zero())
        .map(|ttl| u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX))
        .map(|ms| now_millis.saturating_add(ms));
    let value = input.value.filter(|v| !is_falsy(v));
    let key = Some(composed_key.clone()).filter(|_| options.include_key_field);

    Ok(BuiltRecord {
        composed_key,
        record: Record {
            kind,
            key,
            value,
            ttl,
        },
    })
}
