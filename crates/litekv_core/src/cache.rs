//! Read-through cache for disk-backed stores.
//!
//! Entries expire a fixed time after insertion. Expiry is checked lazily
//! when an entry is read, and [`ReadCache::sweep`] drops every expired
//! entry at once. There are no timers.
//!
//! The cache is not coordinated with writers outside the owning store. A
//! record changed on disk by another handle keeps being served from the
//! cache until its entry expires.

use litekv_codec::Record;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Prefix of snapshot keys written by `clear`.
pub const CLEARED_PREFIX: &str = "CLEARED_DATA";
/// Prefix of snapshot keys written by `clean`.
pub const CLEANED_PREFIX: &str = "CLEANED_DATA";

/// Builds the cache key a record of `table` is mirrored under.
///
/// The NUL separator cannot occur in a table name, so record keys never
/// collide across tables or with snapshot keys.
#[must_use]
pub fn record_key(table: &str, composed: &str) -> String {
    format!("{table}\u{0}{composed}")
}

/// Builds the synthetic key a clear or clean snapshot is stored under.
#[must_use]
pub fn snapshot_key(prefix: &str, table: &str, now_millis: u64) -> String {
    format!("{prefix}_{table}_{now_millis}")
}

/// A cached value.
#[derive(Debug, Clone, PartialEq)]
pub enum CachePayload {
    /// A plaintext record mirrored under its composed key.
    Record(Record),
    /// Records displaced by a clear or clean, as they were stored.
    Snapshot(Vec<Record>),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: CachePayload,
    inserted_at: Instant,
}

/// An expiring key to payload map.
#[derive(Debug)]
pub struct ReadCache {
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl ReadCache {
    /// Creates an empty cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Returns the entry lifetime.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of entries, including expired ones not yet swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.inserted_at) >= self.ttl
    }

    /// Inserts or refreshes an entry.
    pub fn insert(&mut self, key: impl Into<String>, payload: CachePayload) {
        self.insert_at(key, payload, Instant::now());
    }

    /// Inserts or refreshes an entry as of `now`.
    pub fn insert_at(&mut self, key: impl Into<String>, payload: CachePayload, now: Instant) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                payload,
                inserted_at: now,
            },
        );
    }

    /// Returns a live entry, dropping it first if it has expired.
    pub fn get(&mut self, key: &str) -> Option<&CachePayload> {
        self.get_at(key, Instant::now())
    }

    /// Returns an entry that is live as of `now`.
    pub fn get_at(&mut self, key: &str, now: Instant) -> Option<&CachePayload> {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| self.is_expired(entry, now));
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| &entry.payload)
    }

    /// Returns a live cached record. Snapshot entries are ignored.
    pub fn get_record(&mut self, key: &str) -> Option<&Record> {
        self.get_record_at(key, Instant::now())
    }

    /// Returns a cached record that is live as of `now`.
    pub fn get_record_at(&mut self, key: &str, now: Instant) -> Option<&Record> {
        match self.get_at(key, now)? {
            CachePayload::Record(record) => Some(record),
            CachePayload::Snapshot(_) => None,
        }
    }

    /// Removes an entry.
    pub fn remove(&mut self, key: &str) -> Option<CachePayload> {
        self.entries.remove(key).map(|entry| entry.payload)
    }

    /// Drops every expired entry. Returns how many were dropped.
    pub fn sweep(&mut self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// Drops every entry expired as of `now`.
    pub fn sweep_at(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.inserted_at) < ttl);
        before - self.entries.len()
    }
}
