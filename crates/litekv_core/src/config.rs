//! Store configuration.

use crate::error::{StoreError, StoreResult};
use litekv_codec::DataStyle;
use litekv_storage::validate_table_name;
use rand::distributions::Alphanumeric;
use rand::{Rng, RngCore};
use std::path::PathBuf;
use std::time::Duration;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Name of the table every store carries.
pub const DEFAULT_TABLE: &str = "main";
/// Required secret length in bytes.
pub const SECRET_SIZE: usize = 32;
/// Required initialization vector length in bytes.
pub const IV_SIZE: usize = 16;

/// Which record fields are encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncryptionMode {
    /// `value` and `type`. Keys stay plaintext.
    #[default]
    Value,
    /// `key` and the lookup key derived from it.
    Key,
    /// `key`, `value` and `type`.
    Both,
}

impl EncryptionMode {
    /// Parses a mode name. Anything other than `value` or `key` selects
    /// [`EncryptionMode::Both`].
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "value" => Self::Value,
            "key" => Self::Key,
            _ => Self::Both,
        }
    }

    /// Returns true when the `key` field is encrypted.
    #[must_use]
    pub const fn encrypts_key(self) -> bool {
        matches!(self, Self::Key | Self::Both)
    }

    /// Returns true when the `value` and `type` fields are encrypted.
    #[must_use]
    pub const fn encrypts_value(self) -> bool {
        matches!(self, Self::Value | Self::Both)
    }

    /// Returns the mode name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Key => "key",
            Self::Both => "both",
        }
    }
}

/// Field encryption settings.
///
/// The secret and initialization vector are zeroized on drop.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionConfig {
    /// Whether field encryption is on.
    pub enabled: bool,
    /// 32-byte secret.
    pub secret: Vec<u8>,
    /// 16-byte initialization vector, reused for every encryption.
    pub iv: Vec<u8>,
    /// Which fields to encrypt.
    #[zeroize(skip)]
    pub mode: EncryptionMode,
}

impl EncryptionConfig {
    /// Creates an enabled configuration.
    pub fn new(secret: impl AsRef<[u8]>, iv: impl AsRef<[u8]>, mode: EncryptionMode) -> Self {
        Self {
            enabled: true,
            secret: secret.as_ref().to_vec(),
            iv: iv.as_ref().to_vec(),
            mode,
        }
    }

    /// Generates a random initialization vector.
    #[must_use]
    pub fn generate_iv() -> [u8; IV_SIZE] {
        let mut iv = [0u8; IV_SIZE];
        rand::thread_rng().fill_bytes(&mut iv);
        iv
    }

    /// Generates a random 32-character alphanumeric secret.
    #[must_use]
    pub fn generate_secret() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SECRET_SIZE)
            .map(char::from)
            .collect()
    }

    fn validate(&self) -> StoreResult<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.secret.len() != SECRET_SIZE {
            return Err(StoreError::invalid_config(format!(
                "encryption secret must be {SECRET_SIZE} bytes, got {}",
                self.secret.len()
            )));
        }
        if self.iv.len() != IV_SIZE {
            return Err(StoreError::invalid_config(format!(
                "initialization vector must be {IV_SIZE} bytes, got {}",
                self.iv.len()
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for EncryptionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionConfig")
            .field("enabled", &self.enabled)
            .field("secret", &"[REDACTED]")
            .field("iv", &"[REDACTED]")
            .field("mode", &self.mode)
            .finish()
    }
}

/// Key composition and record field options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyOptions {
    /// Append a generated pseudo-id when no explicit id is given.
    pub append_random_id: bool,
    /// Keep the `key` field in stored records. Always on for sequence tables.
    pub include_key_field: bool,
    /// Keep the `type` field in stored records.
    pub include_type_field: bool,
}

impl Default for KeyOptions {
    fn default() -> Self {
        Self {
            append_random_id: false,
            include_key_field: true,
            include_type_field: true,
        }
    }
}

/// Configuration for opening a store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base directory for file-backed stores.
    pub path: PathBuf,

    /// Table representation.
    pub data_style: DataStyle,

    /// Configured tables, in order. Always contains [`DEFAULT_TABLE`] after
    /// normalization.
    pub tables: Vec<String>,

    /// Maximum number of records across all tables.
    pub limit: usize,

    /// Field encryption.
    pub encryption: EncryptionConfig,

    /// Key composition and field options.
    pub keys: KeyOptions,

    /// How long read-through cache entries live.
    pub cache_ttl: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./database"),
            data_style: DataStyle::Mapping,
            tables: vec![DEFAULT_TABLE.to_string()],
            limit: 100,
            encryption: EncryptionConfig::default(),
            keys: KeyOptions::default(),
            cache_ttl: Duration::from_secs(60 * 60),
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base directory.
    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the table representation.
    #[must_use]
    pub fn data_style(mut self, style: DataStyle) -> Self {
        self.data_style = style;
        self
    }

    /// Sets the configured tables.
    #[must_use]
    pub fn tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables = tables.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the record limit.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sets field encryption.
    #[must_use]
    pub fn encryption(mut self, encryption: EncryptionConfig) -> Self {
        self.encryption = encryption;
        self
    }

    /// Sets key composition options.
    #[must_use]
    pub fn keys(mut self, keys: KeyOptions) -> Self {
        self.keys = keys;
        self
    }

    /// Sets the read-through cache entry lifetime.
    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Fills defaults: an empty table list becomes `["main"]`, `main` is
    /// appended when missing, and duplicate names are dropped.
    pub fn normalize(&mut self) {
        let mut seen = Vec::with_capacity(self.tables.len() + 1);
        for table in self.tables.drain(..) {
            if !seen.contains(&table) {
                seen.push(table);
            }
        }
        if !seen.iter().any(|t| t == DEFAULT_TABLE) {
            seen.push(DEFAULT_TABLE.to_string());
        }
        self.tables = seen;
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] for a zero limit, an empty table
    /// list, an unusable table name, or (with encryption on) a secret that
    /// is not 32 bytes or an IV that is not 16 bytes.
    pub fn validate(&self) -> StoreResult<()> {
        if self.limit == 0 {
            return Err(StoreError::invalid_config("limit must be positive"));
        }
        if self.tables.is_empty() {
            return Err(StoreError::invalid_config("at least one table is required"));
        }
        for table in &self.tables {
            validate_table_name(table).map_err(|e| StoreError::invalid_config(e.to_string()))?;
        }
        self.encryption.validate()
    }

    /// Returns the key options in effect for the configured style.
    ///
    /// Sequence tables are searched by the `key` field, so it is always kept.
    #[must_use]
    pub fn effective_keys(&self) -> KeyOptions {
        KeyOptions {
            include_key_field: self.keys.include_key_field
                || self.data_style == DataStyle::Sequence,
            ..self.keys
        }
    }
}
