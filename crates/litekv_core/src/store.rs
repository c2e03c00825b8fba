//! The store engine.

use crate::cache::{
    record_key, snapshot_key, CachePayload, ReadCache, CLEANED_PREFIX, CLEARED_PREFIX,
};
use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;
use crate::crypto::FieldCodec;
use crate::element::{build_record, compose_key, require_key, RecordInput};
use crate::error::{StoreError, StoreResult};
use crate::events::{EventBus, StoreEvent};
use crate::stats::StoreStats;
use litekv_codec::{Record, TableData, Value};
use litekv_storage::{FileBackend, InMemoryBackend, StorageBackend};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Addresses one record: a base key and an optional id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyArgs {
    /// Base key.
    pub key: String,
    /// Explicit id appended to the key.
    pub id: Option<String>,
}

impl KeyArgs {
    /// Creates arguments for `key` with no id.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            id: None,
        }
    }

    /// Sets the id.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl From<&str> for KeyArgs {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Arguments for writing one record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetArgs {
    /// Base key.
    pub key: String,
    /// Value to store. Falsy values are not stored.
    pub value: Option<Value>,
    /// Explicit id appended to the key.
    pub id: Option<String>,
    /// Lifetime relative to now, stored as an absolute expiry.
    pub ttl: Option<Duration>,
}

impl SetArgs {
    /// Creates arguments for `key` with no value.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Sets the value.
    #[must_use]
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Sets the id.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the time to live.
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// An embedded key-value store.
///
/// A store owns a fixed, ordered set of tables. Each operation reads the
/// whole table from the backend, changes it and writes it back. Operations
/// take `&mut self`, so one handle never interleaves two writes. Two
/// handles over the same directory are not coordinated: the last table
/// write wins.
///
/// # Example
///
/// ```rust
/// use litekv_core::{KeyArgs, SetArgs, Store, StoreConfig};
///
/// let mut store = Store::open_in_memory(StoreConfig::default()).unwrap();
///
/// store.set("main", SetArgs::new("user").value("ada").id("1")).unwrap();
///
/// let record = store.get("main", KeyArgs::new("user").id("1")).unwrap().unwrap();
/// assert_eq!(record.value, Some("ada".into()));
/// assert!(!store.has("main", KeyArgs::new("user")).unwrap());
/// ```
pub struct Store {
    config: StoreConfig,
    backend: Box<dyn StorageBackend>,
    codec: Option<FieldCodec>,
    cache: Option<ReadCache>,
    clock: Arc<dyn Clock>,
    events: EventBus,
    stats: StoreStats,
    connected: bool,
}

impl Store {
    /// Opens a file-backed store rooted at `config.path`.
    ///
    /// Nothing is read or written until the first operation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if the configuration is
    /// unusable.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let backend = FileBackend::new(&config.path);
        Self::with_backend(config, Box::new(backend))
    }

    /// Opens a store whose tables live only in process memory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if the configuration is
    /// unusable.
    pub fn open_in_memory(config: StoreConfig) -> StoreResult<Self> {
        Self::with_backend(config, Box::new(InMemoryBackend::new()))
    }

    /// Opens a store over any backend.
    ///
    /// The read-through cache is enabled only for persistent backends.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if the configuration is
    /// unusable.
    pub fn with_backend(mut config: StoreConfig, backend: Box<dyn StorageBackend>) -> StoreResult<Self> {
        config.normalize();
        config.validate()?;

        let codec = FieldCodec::from_config(&config.encryption)?;
        if let Some(codec) = &codec {
            warn!(
                mode = codec.mode().as_str(),
                "field encryption reuses one IV for every value; equal plaintexts produce equal ciphertexts"
            );
        }
        let cache = backend
            .is_persistent()
            .then(|| ReadCache::new(config.cache_ttl));

        Ok(Self {
            config,
            backend,
            codec,
            cache,
            clock: Arc::new(SystemClock),
            events: EventBus::new(),
            stats: StoreStats::new(),
            connected: false,
        })
    }

    /// Replaces the clock used for key generation, ttl and snapshot keys.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Prepares every configured table.
    ///
    /// Missing tables are created empty in the configured style. A table
    /// stored in the other style is converted and written back. Emits
    /// [`StoreEvent::Ready`]. Safe to call repeatedly; every other
    /// operation connects on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if a table cannot be read or written.
    pub fn connect(&mut self) -> StoreResult<()> {
        let result = self.connect_tables();
        self.observe(result)
    }

    fn connect_tables(&mut self) -> StoreResult<()> {
        let style = self.config.data_style;
        for table in &self.config.tables {
            let created = self.backend.ensure_table(table, style)?;
            match self.backend.load_table(table)? {
                None => self.backend.save_table(table, &TableData::empty(style))?,
                Some(data) if data.style() != style => {
                    info!(table = %table, from = %data.style(), to = %style, "converting table");
                    self.backend.save_table(table, &data.into_style(style))?;
                }
                Some(_) => {}
            }
            if created {
                debug!(table = %table, "created table");
            }
        }

        self.connected = true;
        info!(tables = ?self.config.tables, "store ready");
        self.events.emit(StoreEvent::Ready {
            tables: self.config.tables.clone(),
        });
        Ok(())
    }

    fn ensure_connected(&mut self) -> StoreResult<()> {
        if self.connected {
            return Ok(());
        }
        self.connect_tables()
    }

    /// Returns the configuration in effect.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the configured tables, in order.
    #[must_use]
    pub fn tables(&self) -> &[String] {
        &self.config.tables
    }

    /// Returns the record limit shared by all tables.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.config.limit
    }

    /// Returns operation counters.
    #[must_use]
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    /// Subscribes to store events.
    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Returns the total number of records across all tables.
    ///
    /// # Errors
    ///
    /// Returns an error if a table cannot be read.
    pub fn size(&mut self) -> StoreResult<usize> {
        let result = self.ensure_connected().and_then(|()| self.total_size());
        self.observe(result)
    }

    /// Looks up a record. Returns `None` when it does not exist.
    ///
    /// For disk-backed stores a cached copy is returned when one is live.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidArgument`] for an empty key,
    /// [`StoreError::UnknownTable`] for an unconfigured table, and
    /// [`StoreError::Crypto`] if the stored record cannot be decrypted.
    pub fn get(&mut self, table: &str, args: impl Into<KeyArgs>) -> StoreResult<Option<Record>> {
        let args = args.into();
        let result = self.get_record(table, &args);
        self.observe(result)
    }

    fn get_record(&mut self, table: &str, args: &KeyArgs) -> StoreResult<Option<Record>> {
        self.prepare(table, &args.key)?;
        self.stats.record_read();
        let composed = self.compose(args);

        if let Some(cache) = self.cache.as_mut() {
            if let Some(record) = cache.get_record(&record_key(table, &composed)) {
                let record = record.clone();
                self.stats.record_cache_hit();
                debug!(table, key = %composed, "cache hit");
                return Ok(Some(record));
            }
            self.stats.record_cache_miss();
        }

        let storage_key = self.storage_key(&composed)?;
        let data = self.load(table)?;
        let Some(stored) = data.get(&storage_key) else {
            debug!(table, key = %composed, "record not found");
            return Ok(None);
        };

        let record = self.decrypt(stored)?;
        self.mirror(table, &composed, &record);
        Ok(Some(record))
    }

    /// Writes a record, replacing any record with the same composed key.
    ///
    /// Emits [`StoreEvent::New`] or [`StoreEvent::Update`] and returns the
    /// plaintext record as built. Falsy values are not stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidArgument`] for an empty key,
    /// [`StoreError::UnknownTable`] for an unconfigured table, and
    /// [`StoreError::CapacityExceeded`] when the write would add a record
    /// to a store already at its limit.
    pub fn set(&mut self, table: &str, args: SetArgs) -> StoreResult<Record> {
        let result = self.set_record(table, args);
        self.observe(result)
    }

    fn set_record(&mut self, table: &str, args: SetArgs) -> StoreResult<Record> {
        self.prepare(table, &args.key)?;
        let now = self.clock.now_millis();
        let built = build_record(
            RecordInput {
                key: &args.key,
                id: args.id.as_deref(),
                value: args.value,
                ttl: args.ttl,
            },
            self.config.effective_keys(),
            now,
        )?;

        let storage_key = self.storage_key(&built.composed_key)?;
        let mut data = self.load(table)?;
        let old = match data.get(&storage_key) {
            Some(stored) => Some(self.decrypt(stored)?),
            None => None,
        };
        if old.is_none() && self.total_size()? >= self.config.limit {
            return Err(StoreError::capacity_exceeded(self.config.limit));
        }

        data.upsert(&storage_key, self.encrypt(&built.record)?);
        self.backend.save_table(table, &data)?;
        self.stats.record_write();
        self.mirror(table, &built.composed_key, &built.record);

        debug!(table, key = %built.composed_key, replaced = old.is_some(), "set record");
        let event = match old {
            Some(old) => StoreEvent::Update {
                table: table.to_string(),
                old,
                new: built.record.clone(),
            },
            None => StoreEvent::New {
                table: table.to_string(),
                record: built.record.clone(),
            },
        };
        self.events.emit(event);
        Ok(built.record)
    }

    /// Deletes a record. Returns `false` when it does not exist.
    ///
    /// # Errors
    ///
    /// Same argument errors as [`get`](Self::get).
    pub fn delete(&mut self, table: &str, args: impl Into<KeyArgs>) -> StoreResult<bool> {
        let args = args.into();
        let result = self.delete_record(table, &args);
        self.observe(result)
    }

    fn delete_record(&mut self, table: &str, args: &KeyArgs) -> StoreResult<bool> {
        self.prepare(table, &args.key)?;
        let composed = self.compose(args);
        let storage_key = self.storage_key(&composed)?;

        let mut data = self.load(table)?;
        let Some(stored) = data.remove(&storage_key) else {
            debug!(table, key = %composed, "nothing to delete");
            return Ok(false);
        };
        let record = self.decrypt(&stored)?;
        self.backend.save_table(table, &data)?;
        self.stats.record_delete();
        if let Some(cache) = self.cache.as_mut() {
            cache.remove(&record_key(table, &composed));
        }

        debug!(table, key = %composed, "deleted record");
        self.events.emit(StoreEvent::Remove {
            table: table.to_string(),
            record,
        });
        Ok(true)
    }

    /// Returns true when the record exists.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub fn has(&mut self, table: &str, args: impl Into<KeyArgs>) -> StoreResult<bool> {
        Ok(self.get(table, args)?.is_some())
    }

    /// Returns every record in a table, decrypted, in the configured style.
    ///
    /// Mapping tables are keyed by plaintext composed key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownTable`] for an unconfigured table and
    /// [`StoreError::Crypto`] if a record cannot be decrypted.
    pub fn all(&mut self, table: &str) -> StoreResult<TableData> {
        let result = self.all_records(table);
        self.observe(result)
    }

    fn all_records(&mut self, table: &str) -> StoreResult<TableData> {
        self.ensure_connected()?;
        self.check_table(table)?;
        self.stats.record_scan();

        let data = self.load(table)?;
        let mut out = TableData::empty(self.config.data_style);
        for (stored_key, stored) in data.entries() {
            let record = self.decrypt(stored)?;
            let composed = stored_key.map(|k| self.plain_key(k)).transpose()?;
            if let Some(composed) = &composed {
                self.mirror(table, composed, &record);
            }
            match (&mut out, composed) {
                (TableData::Mapping(map), Some(composed)) => {
                    map.insert(composed, record);
                }
                (TableData::Mapping(_), None) => {
                    warn!(table, "skipping record without a key");
                }
                (TableData::Sequence(seq), _) => seq.push(record),
            }
        }
        Ok(out)
    }

    /// Returns the first decrypted record, in representation order, that
    /// matches `predicate`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownTable`] for an unconfigured table and
    /// [`StoreError::Crypto`] if a record cannot be decrypted.
    pub fn find<F>(&mut self, table: &str, mut predicate: F) -> StoreResult<Option<Record>>
    where
        F: FnMut(&Record) -> bool,
    {
        let result = self.ensure_connected().and_then(|()| {
            self.check_table(table)?;
            self.stats.record_scan();
            let data = self.load(table)?;
            for (_, stored) in data.entries() {
                let record = self.decrypt(stored)?;
                if predicate(&record) {
                    return Ok(Some(record));
                }
            }
            Ok(None)
        });
        self.observe(result)
    }

    /// Empties a table. Returns how many records were removed.
    ///
    /// Emits [`StoreEvent::Clear`]. Disk-backed stores keep the removed
    /// records in the cache under `CLEARED_DATA_<table>_<millis>`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownTable`] for an unconfigured table or a
    /// storage error.
    pub fn clear(&mut self, table: &str) -> StoreResult<usize> {
        let result = self.clear_table(table);
        self.observe(result)
    }

    fn clear_table(&mut self, table: &str) -> StoreResult<usize> {
        self.ensure_connected()?;
        self.check_table(table)?;

        let data = self.load(table)?;
        self.backend
            .save_table(table, &TableData::empty(self.config.data_style))?;
        let displaced: Vec<(Option<String>, Record)> = data
            .entries()
            .map(|(k, r)| (k.map(str::to_string), r.clone()))
            .collect();
        let removed = displaced.len();
        self.stash(CLEARED_PREFIX, table, displaced);
        self.stats.record_clear();

        info!(table, removed, "cleared table");
        self.events.emit(StoreEvent::Clear {
            table: table.to_string(),
        });
        Ok(removed)
    }

    /// Clears every configured table. Returns the total removed.
    ///
    /// # Errors
    ///
    /// Stops at the first table that fails.
    pub fn clear_all(&mut self) -> StoreResult<usize> {
        let tables = self.config.tables.clone();
        tables.iter().try_fold(0, |n, t| Ok(n + self.clear(t)?))
    }

    /// Removes every record without a value. Returns how many were removed.
    ///
    /// Emits [`StoreEvent::Clean`]. Disk-backed stores keep the removed
    /// records in the cache under `CLEANED_DATA_<table>_<millis>`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownTable`] for an unconfigured table or a
    /// storage error.
    pub fn clean(&mut self, table: &str) -> StoreResult<usize> {
        let result = self.clean_table(table);
        self.observe(result)
    }

    fn clean_table(&mut self, table: &str) -> StoreResult<usize> {
        self.ensure_connected()?;
        self.check_table(table)?;

        let mut data = self.load(table)?;
        let displaced = data.drain_where(|r| !r.has_value());
        if !displaced.is_empty() {
            self.backend.save_table(table, &data)?;
        }
        let removed = displaced.len();
        self.stash(CLEANED_PREFIX, table, displaced);
        self.stats.record_clean();

        info!(table, removed, "cleaned table");
        self.events.emit(StoreEvent::Clean {
            table: table.to_string(),
        });
        Ok(removed)
    }

    /// Cleans every configured table. Returns the total removed.
    ///
    /// # Errors
    ///
    /// Stops at the first table that fails.
    pub fn clean_all(&mut self) -> StoreResult<usize> {
        let tables = self.config.tables.clone();
        tables.iter().try_fold(0, |n, t| Ok(n + self.clean(t)?))
    }

    /// Applies [`set`](Self::set) to each entry in order.
    ///
    /// Not atomic: on failure, earlier entries stay written and later ones
    /// are not attempted.
    ///
    /// # Errors
    ///
    /// Returns the first failure.
    pub fn set_many<I>(&mut self, table: &str, entries: I) -> StoreResult<Vec<Record>>
    where
        I: IntoIterator<Item = SetArgs>,
    {
        entries.into_iter().map(|args| self.set(table, args)).collect()
    }

    /// Applies [`delete`](Self::delete) to each key in order.
    ///
    /// Not atomic, like [`set_many`](Self::set_many).
    ///
    /// # Errors
    ///
    /// Returns the first failure.
    pub fn delete_many<I>(&mut self, table: &str, keys: I) -> StoreResult<Vec<bool>>
    where
        I: IntoIterator<Item = KeyArgs>,
    {
        keys.into_iter().map(|args| self.delete(table, args)).collect()
    }

    /// Applies [`get`](Self::get) to each key in order.
    ///
    /// # Errors
    ///
    /// Returns the first failure.
    pub fn get_many<I>(&mut self, table: &str, keys: I) -> StoreResult<Vec<Option<Record>>>
    where
        I: IntoIterator<Item = KeyArgs>,
    {
        keys.into_iter().map(|args| self.get(table, args)).collect()
    }

    /// Applies [`has`](Self::has) to each key in order.
    ///
    /// # Errors
    ///
    /// Returns the first failure.
    pub fn has_many<I>(&mut self, table: &str, keys: I) -> StoreResult<Vec<bool>>
    where
        I: IntoIterator<Item = KeyArgs>,
    {
        keys.into_iter().map(|args| self.has(table, args)).collect()
    }

    /// Drops expired cache entries. Returns how many were dropped.
    pub fn sweep_cache(&mut self) -> usize {
        self.cache.as_mut().map_or(0, ReadCache::sweep)
    }

    /// Returns the records stashed by a clear or clean under `key`, as they
    /// were stored.
    pub fn cached_snapshot(&mut self, key: &str) -> Option<Vec<Record>> {
        match self.cache.as_mut()?.get(key)? {
            CachePayload::Snapshot(records) => Some(records.clone()),
            CachePayload::Record(_) => None,
        }
    }

    fn observe<T>(&self, result: StoreResult<T>) -> StoreResult<T> {
        if let Err(e) = &result {
            self.stats.record_error();
            debug!(error = %e, "operation failed");
        }
        result
    }

    fn check_table(&self, table: &str) -> StoreResult<()> {
        if self.config.tables.iter().any(|t| t == table) {
            Ok(())
        } else {
            Err(StoreError::unknown_table(table))
        }
    }

    fn prepare(&mut self, table: &str, key: &str) -> StoreResult<()> {
        self.ensure_connected()?;
        self.check_table(table)?;
        require_key(key)
    }

    fn compose(&self, args: &KeyArgs) -> String {
        compose_key(
            &args.key,
            args.id.as_deref(),
            self.config.keys.append_random_id,
            self.clock.now_millis(),
        )
    }

    fn load(&self, table: &str) -> StoreResult<TableData> {
        let style = self.config.data_style;
        Ok(self
            .backend
            .load_table(table)?
            .map_or_else(|| TableData::empty(style), |data| data.into_style(style)))
    }

    fn total_size(&self) -> StoreResult<usize> {
        self.config
            .tables
            .iter()
            .map(|t| self.load(t).map(|data| data.len()))
            .sum()
    }

    fn encrypt(&self, record: &Record) -> StoreResult<Record> {
        match &self.codec {
            Some(codec) => codec.encrypt_record(record),
            None => Ok(record.clone()),
        }
    }

    fn decrypt(&self, record: &Record) -> StoreResult<Record> {
        match &self.codec {
            Some(codec) => codec.decrypt_record(record),
            None => Ok(record.clone()),
        }
    }

    fn storage_key(&self, composed: &str) -> StoreResult<String> {
        match &self.codec {
            Some(codec) => codec.storage_key(composed),
            None => Ok(composed.to_string()),
        }
    }

    fn plain_key(&self, stored: &str) -> StoreResult<String> {
        match &self.codec {
            Some(codec) => codec.plain_key(stored),
            None => Ok(stored.to_string()),
        }
    }

    fn mirror(&mut self, table: &str, composed: &str, record: &Record) {
        if let Some(cache) = self.cache.as_mut() {
            cache.insert(
                record_key(table, composed),
                CachePayload::Record(record.clone()),
            );
        }
    }

    /// Evicts displaced records from the cache and keeps them, as stored,
    /// under a snapshot key.
    fn stash(&mut self, prefix: &str, table: &str, displaced: Vec<(Option<String>, Record)>) {
        if self.cache.is_none() {
            return;
        }
        let composed: Vec<String> = displaced
            .iter()
            .filter_map(|(k, _)| k.as_deref())
            .filter_map(|k| self.plain_key(k).ok())
            .map(|k| record_key(table, &k))
            .collect();
        let key = snapshot_key(prefix, table, self.clock.now_millis());
        if let Some(cache) = self.cache.as_mut() {
            for k in &composed {
                cache.remove(k);
            }
            let records = displaced.into_iter().map(|(_, r)| r).collect();
            debug!(table, key = %key, "stashed displaced records");
            cache.insert(key, CachePayload::Snapshot(records));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::{EncryptionConfig, EncryptionMode, KeyOptions};
    use litekv_codec::DataStyle;
    use serde_json::json;
    use tempfile::tempdir;

    const SECRET: &str = "a03uxnOdyls8rga9quebx9apejfyz9wl";
    const IV: [u8; 16] = [3u8; 16];

    fn memory(config: StoreConfig) -> Store {
        Store::open_in_memory(config).unwrap()
    }

    fn encrypted(mode: EncryptionMode) -> StoreConfig {
        StoreConfig::new().encryption(EncryptionConfig::new(SECRET, IV, mode))
    }

    fn value_of(record: Option<Record>) -> Option<Value> {
        record.and_then(|r| r.value)
    }

    #[test]
    fn set_then_get() {
        let mut store = memory(StoreConfig::default());
        let written = store.set("main", SetArgs::new("a").value("x")).unwrap();
        assert_eq!(written.kind.as_deref(), Some("string"));

        let read = store.get("main", "a").unwrap().unwrap();
        assert_eq!(read, written);
    }

    #[test]
    fn missing_record_is_none() {
        let mut store = memory(StoreConfig::default());
        assert_eq!(store.get("main", "nope").unwrap(), None);
        assert!(!store.has("main", "nope").unwrap());
        assert!(!store.delete("main", "nope").unwrap());
    }

    #[test]
    fn argument_errors() {
        let mut store = memory(StoreConfig::default());
        assert!(matches!(
            store.get("main", ""),
            Err(StoreError::InvalidArgument { .. })
        ));
        assert!(matches!(
            store.set("nope", SetArgs::new("a").value(1)),
            Err(StoreError::UnknownTable { .. })
        ));
        assert!(matches!(store.all("nope"), Err(StoreError::UnknownTable { .. })));
        assert_eq!(store.stats().errors(), 3);
    }

    #[test]
    fn id_is_part_of_the_key() {
        let mut store = memory(StoreConfig::default());
        store.set("main", SetArgs::new("a").value(1).id("id1")).unwrap();

        assert!(store.has("main", KeyArgs::new("a").id("id1")).unwrap());
        assert!(!store.has("main", "a").unwrap());
    }

    #[test]
    fn zero_value_is_not_stored() {
        let mut store = memory(StoreConfig::default());
        store.set("main", SetArgs::new("z").value(0)).unwrap();

        let record = store.get("main", "z").unwrap().unwrap();
        assert_eq!(record.value, None);
        assert_eq!(record.kind.as_deref(), Some("number"));
    }

    #[test]
    fn capacity_is_shared_across_tables() {
        let mut store = memory(StoreConfig::new().tables(["main", "other"]).limit(2));
        store.set("main", SetArgs::new("a").value("x")).unwrap();
        store.set("other", SetArgs::new("b").value("y")).unwrap();

        let err = store.set("main", SetArgs::new("c").value("z")).unwrap_err();
        assert!(matches!(err, StoreError::CapacityExceeded { limit: 2 }));

        // replacing an existing key is allowed at the limit
        store.set("main", SetArgs::new("a").value("x2")).unwrap();

        assert!(store.delete("other", "b").unwrap());
        store.set("main", SetArgs::new("c").value("z")).unwrap();
        assert_eq!(store.size().unwrap(), 2);
    }

    #[test]
    fn events_classify_writes() {
        let mut store = memory(StoreConfig::default());
        let rx = store.subscribe();

        store.set("main", SetArgs::new("a").value(1)).unwrap();
        store.set("main", SetArgs::new("a").value(2)).unwrap();
        store.delete("main", "a").unwrap();
        store.clear("main").unwrap();
        store.clean("main").unwrap();

        let events: Vec<_> = rx.try_iter().collect();
        let names: Vec<_> = events.iter().map(StoreEvent::name).collect();
        assert_eq!(names, ["ready", "new", "update", "remove", "clear", "clean"]);

        match &events[2] {
            StoreEvent::Update { old, new, .. } => {
                assert_eq!(old.value, Some(json!(1)));
                assert_eq!(new.value, Some(json!(2)));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn explicit_connect_reemits_ready() {
        let mut store = memory(StoreConfig::default());
        let rx = store.subscribe();
        store.connect().unwrap();
        store.connect().unwrap();
        store.size().unwrap();
        assert_eq!(rx.try_iter().count(), 2);
    }

    #[test]
    fn clean_removes_valueless_records() {
        let mut store = memory(StoreConfig::default());
        store.set("main", SetArgs::new("a").value(1)).unwrap();
        store.set("main", SetArgs::new("b")).unwrap();

        assert_eq!(store.clean("main").unwrap(), 1);
        assert!(store.has("main", "a").unwrap());
        assert!(!store.has("main", "b").unwrap());
    }

    #[test]
    fn clear_all_empties_every_table() {
        let mut store = memory(StoreConfig::new().tables(["main", "other"]));
        store.set("main", SetArgs::new("a").value(1)).unwrap();
        store.set("other", SetArgs::new("b").value(1)).unwrap();
        store.set("other", SetArgs::new("c").value(1)).unwrap();

        assert_eq!(store.clear_all().unwrap(), 3);
        assert_eq!(store.size().unwrap(), 0);
    }

    #[test]
    fn clean_all_counts_every_table() {
        let mut store = memory(StoreConfig::new().tables(["main", "other"]));
        store.set("main", SetArgs::new("a")).unwrap();
        store.set("other", SetArgs::new("b").value("")).unwrap();
        store.set("other", SetArgs::new("c").value("kept")).unwrap();

        assert_eq!(store.clean_all().unwrap(), 2);
        assert_eq!(store.size().unwrap(), 1);
    }

    #[test]
    fn all_returns_plain_records_without_encryption() {
        let mut store = memory(StoreConfig::default());
        store.set("main", SetArgs::new("a").value("x")).unwrap();
        store.set("main", SetArgs::new("b").value("y")).unwrap();

        let all = store.all("main").unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(value_of(all.get("b").cloned()), Some(json!("y")));
    }

    #[test]
    fn all_decrypts_in_every_mode() {
        for mode in [EncryptionMode::Value, EncryptionMode::Key, EncryptionMode::Both] {
            let mut store = memory(encrypted(mode));
            store.set("main", SetArgs::new("a").value(json!({"n": 1}))).unwrap();

            let all = store.all("main").unwrap();
            let record = all.get("a").unwrap();
            assert_eq!(record.key.as_deref(), Some("a"));
            assert_eq!(record.value, Some(json!({"n": 1})));
            assert_eq!(record.kind.as_deref(), Some("object"));
        }
    }

    #[test]
    fn sequence_style_replaces_in_place() {
        let mut store = memory(StoreConfig::new().data_style(DataStyle::Sequence));
        store.set("main", SetArgs::new("a").value(1)).unwrap();
        store.set("main", SetArgs::new("b").value(2)).unwrap();
        store.set("main", SetArgs::new("a").value(3)).unwrap();

        let all = store.all("main").unwrap();
        let TableData::Sequence(records) = all else {
            panic!("expected a sequence");
        };
        let values: Vec<_> = records.iter().map(|r| r.value.clone()).collect();
        assert_eq!(values, [Some(json!(3)), Some(json!(2))]);
    }

    #[test]
    fn sequence_style_keeps_key_field() {
        let keys = KeyOptions {
            include_key_field: false,
            ..KeyOptions::default()
        };
        let mut store = memory(StoreConfig::new().data_style(DataStyle::Sequence).keys(keys));
        let record = store.set("main", SetArgs::new("a").value(1)).unwrap();
        assert_eq!(record.key.as_deref(), Some("a"));
        assert!(store.has("main", "a").unwrap());
    }

    #[test]
    fn mapping_style_can_drop_key_field() {
        let keys = KeyOptions {
            include_key_field: false,
            include_type_field: false,
            ..KeyOptions::default()
        };
        let mut store = memory(StoreConfig::new().keys(keys));
        let record = store.set("main", SetArgs::new("a").value(1)).unwrap();
        assert_eq!(record.key, None);
        assert_eq!(record.kind, None);
        assert_eq!(value_of(store.get("main", "a").unwrap()), Some(json!(1)));
        assert!(store.all("main").unwrap().get("a").is_some());
    }

    #[test]
    fn find_returns_first_match() {
        let mut store = memory(encrypted(EncryptionMode::Both));
        store.set("main", SetArgs::new("a").value(1)).unwrap();
        store.set("main", SetArgs::new("b").value(2)).unwrap();
        store.set("main", SetArgs::new("c").value(2)).unwrap();

        let found = store
            .find("main", |r| r.value == Some(json!(2)))
            .unwrap()
            .unwrap();
        assert_eq!(found.key.as_deref(), Some("b"));
        assert!(store.find("main", |_| false).unwrap().is_none());
    }

    #[test]
    fn batches_apply_in_order() {
        let mut store = memory(StoreConfig::default());
        let written = store
            .set_many(
                "main",
                [SetArgs::new("a").value(1), SetArgs::new("b").value(2)],
            )
            .unwrap();
        assert_eq!(written.len(), 2);

        let got = store
            .get_many("main", [KeyArgs::new("b"), KeyArgs::new("x")])
            .unwrap();
        assert_eq!(value_of(got[0].clone()), Some(json!(2)));
        assert_eq!(got[1], None);

        let has = store
            .has_many("main", [KeyArgs::new("a"), KeyArgs::new("x")])
            .unwrap();
        assert_eq!(has, [true, false]);

        let deleted = store
            .delete_many("main", [KeyArgs::new("a"), KeyArgs::new("a")])
            .unwrap();
        assert_eq!(deleted, [true, false]);
    }

    #[test]
    fn batch_failure_keeps_earlier_writes() {
        let mut store = memory(StoreConfig::new().limit(1));
        let err = store
            .set_many(
                "main",
                [
                    SetArgs::new("a").value(1),
                    SetArgs::new("b").value(2),
                    SetArgs::new("c").value(3),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::CapacityExceeded { .. }));
        assert!(store.has("main", "a").unwrap());
        assert!(!store.has("main", "c").unwrap());
    }

    #[test]
    fn ttl_is_stored_as_absolute_time() {
        let clock = Arc::new(ManualClock::new(1_000));
        let mut store = memory(StoreConfig::default()).with_clock(clock.clone());
        store
            .set("main", SetArgs::new("a").value(1).ttl(Duration::from_secs(5)))
            .unwrap();

        clock.advance(60_000);
        let record = store.get("main", "a").unwrap().unwrap();
        assert_eq!(record.ttl, Some(6_000));
    }

    #[test]
    fn random_ids_make_keys_unaddressable_without_id() {
        let clock = Arc::new(ManualClock::new(1_234));
        let keys = KeyOptions {
            append_random_id: true,
            ..KeyOptions::default()
        };
        let mut store = memory(StoreConfig::new().keys(keys)).with_clock(clock.clone());
        let record = store.set("main", SetArgs::new("a").value(1)).unwrap();
        assert_eq!(record.key.as_deref(), Some("a_971234"));

        clock.advance(1);
        assert!(!store.has("main", "a").unwrap());
        assert!(store.has("main", KeyArgs::new("a").id("971234")).unwrap());
    }

    #[test]
    fn mode_change_surfaces_crypto_error() {
        let mut backend = InMemoryBackend::new();
        backend.ensure_table("main", DataStyle::Mapping).unwrap();
        let mut data = backend.load_table("main").unwrap().unwrap();
        data.upsert(
            "a",
            Record {
                key: Some("a".into()),
                value: Some(json!("plain")),
                ..Record::default()
            },
        );
        backend.save_table("main", &data).unwrap();

        let mut store =
            Store::with_backend(encrypted(EncryptionMode::Value), Box::new(backend)).unwrap();
        assert!(matches!(store.get("main", "a"), Err(StoreError::Crypto { .. })));
    }

    #[test]
    fn connect_converts_memory_tables() {
        let mut tables = std::collections::HashMap::new();
        tables.insert(
            "main".to_string(),
            TableData::Sequence(vec![Record {
                key: Some("a".into()),
                value: Some(json!(1)),
                ..Record::default()
            }]),
        );
        let backend = InMemoryBackend::with_tables(tables);
        let mut store = Store::with_backend(StoreConfig::default(), Box::new(backend)).unwrap();

        store.connect().unwrap();
        assert_eq!(value_of(store.get("main", "a").unwrap()), Some(json!(1)));
        assert_eq!(store.size().unwrap(), 1);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = StoreConfig::new().encryption(EncryptionConfig::new("short", IV, EncryptionMode::Both));
        assert!(matches!(
            Store::open_in_memory(config),
            Err(StoreError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn memory_store_has_no_cache() {
        let mut store = memory(StoreConfig::default());
        store.set("main", SetArgs::new("a").value(1)).unwrap();
        store.get("main", "a").unwrap();
        assert_eq!(store.stats().cache_hits(), 0);
        assert_eq!(store.stats().cache_misses(), 0);
        assert_eq!(store.sweep_cache(), 0);
    }

    #[test]
    fn file_store_persists() {
        let dir = tempdir().unwrap();
        {
            let mut store = Store::open(StoreConfig::new().path(dir.path())).unwrap();
            store.set("main", SetArgs::new("a").value("x")).unwrap();
        }
        let mut store = Store::open(StoreConfig::new().path(dir.path())).unwrap();
        assert_eq!(value_of(store.get("main", "a").unwrap()), Some(json!("x")));
        assert!(dir.path().join("main").join("main-store.json").exists());
    }

    #[test]
    fn file_store_serves_reads_from_cache() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(StoreConfig::new().path(dir.path())).unwrap();
        store.set("main", SetArgs::new("a").value("x")).unwrap();

        store.get("main", "a").unwrap();
        store.get("main", "missing").unwrap();
        assert_eq!(store.stats().cache_hits(), 1);
        assert_eq!(store.stats().cache_misses(), 1);
    }

    #[test]
    fn delete_evicts_cached_record() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(StoreConfig::new().path(dir.path())).unwrap();
        store.set("main", SetArgs::new("a").value("x")).unwrap();
        store.get("main", "a").unwrap();

        assert!(store.delete("main", "a").unwrap());
        assert_eq!(store.get("main", "a").unwrap(), None);
    }

    #[test]
    fn cached_records_stay_in_their_table() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new().path(dir.path()).tables(["main", "other"]);
        let mut store = Store::open(config).unwrap();
        store.set("main", SetArgs::new("a").value("x")).unwrap();

        assert_eq!(store.get("other", "a").unwrap(), None);
        assert!(!store.has("other", "a").unwrap());
        assert!(!store.delete("other", "a").unwrap());
        assert_eq!(value_of(store.get("main", "a").unwrap()), Some(json!("x")));

        store.set("other", SetArgs::new("a").value("y")).unwrap();
        assert_eq!(store.clear("other").unwrap(), 1);
        assert_eq!(value_of(store.get("main", "a").unwrap()), Some(json!("x")));
        assert_eq!(store.get("other", "a").unwrap(), None);
    }

    #[test]
    fn clear_stashes_snapshot() {
        let dir = tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(42));
        let mut store = Store::open(StoreConfig::new().path(dir.path()))
            .unwrap()
            .with_clock(clock);
        store.set("main", SetArgs::new("a").value("x")).unwrap();

        assert_eq!(store.clear("main").unwrap(), 1);
        assert_eq!(store.get("main", "a").unwrap(), None);

        let snapshot = store.cached_snapshot("CLEARED_DATA_main_42").unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].value, Some(json!("x")));
    }

    #[test]
    fn clean_stashes_snapshot() {
        let dir = tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(7));
        let mut store = Store::open(StoreConfig::new().path(dir.path()))
            .unwrap()
            .with_clock(clock);
        store.set("main", SetArgs::new("b")).unwrap();

        assert_eq!(store.clean("main").unwrap(), 1);
        let snapshot = store.cached_snapshot("CLEANED_DATA_main_7").unwrap();
        assert_eq!(snapshot[0].key.as_deref(), Some("b"));
        assert!(store.cached_snapshot("CLEARED_DATA_main_7").is_none());
    }

    #[test]
    fn expired_cache_falls_through_to_disk() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new()
            .path(dir.path())
            .cache_ttl(Duration::ZERO);
        let mut store = Store::open(config).unwrap();
        store.set("main", SetArgs::new("a").value("x")).unwrap();

        assert_eq!(value_of(store.get("main", "a").unwrap()), Some(json!("x")));
        assert_eq!(store.stats().cache_hits(), 0);
        assert_eq!(store.sweep_cache(), 1);
    }

    #[test]
    fn connect_converts_stored_style() {
        let dir = tempdir().unwrap();
        {
            let mut store = Store::open(
                StoreConfig::new()
                    .path(dir.path())
                    .data_style(DataStyle::Sequence),
            )
            .unwrap();
            store.set("main", SetArgs::new("a").value(1)).unwrap();
        }

        let mut store = Store::open(StoreConfig::new().path(dir.path())).unwrap();
        store.connect().unwrap();

        let backend = FileBackend::new(dir.path());
        let raw = backend.load_table("main").unwrap().unwrap();
        assert_eq!(raw.style(), DataStyle::Mapping);
        assert!(raw.get("a").is_some());
    }
}
