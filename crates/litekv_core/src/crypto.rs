//! Field encryption using AES-256-CTR.
//!
//! Encrypted fields are stored as `hex(iv):hex(ciphertext)`, where the
//! ciphertext is the compact JSON encoding of the field value.
//!
//! # Security
//!
//! The initialization vector is supplied once and reused for every
//! encryption a store performs. Under CTR mode this reuses the keystream,
//! so equal plaintexts produce equal ciphertexts and the XOR of two
//! ciphertexts leaks the XOR of their plaintexts. Encrypted keys depend on
//! that determinism to remain usable as lookup keys. Treat this as
//! obfuscation at rest, not confidentiality.

use crate::config::{EncryptionConfig, EncryptionMode, IV_SIZE, SECRET_SIZE};
use crate::error::{StoreError, StoreResult};
use ctr::cipher::{KeyIvInit, StreamCipher};
use litekv_codec::{Record, Value};
use zeroize::{Zeroize, ZeroizeOnDrop};

type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;

/// Separator between the hex IV and the hex ciphertext.
const SEPARATOR: char = ':';

/// Encrypts and decrypts single JSON values.
///
/// Key material is zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct FieldCipher {
    key: [u8; SECRET_SIZE],
    iv: [u8; IV_SIZE],
}

impl FieldCipher {
    /// Creates a cipher from a 32-byte secret and a 16-byte IV.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if either length is wrong.
    pub fn new(secret: &[u8], iv: &[u8]) -> StoreResult<Self> {
        let key: [u8; SECRET_SIZE] = secret.try_into().map_err(|_| {
            StoreError::invalid_config(format!(
                "encryption secret must be {SECRET_SIZE} bytes, got {}",
                secret.len()
            ))
        })?;
        let iv: [u8; IV_SIZE] = iv.try_into().map_err(|_| {
            StoreError::invalid_config(format!(
                "initialization vector must be {IV_SIZE} bytes, got {}",
                iv.len()
            ))
        })?;
        Ok(Self { key, iv })
    }

    fn keystream(&self, iv: &[u8], buf: &mut [u8]) -> StoreResult<()> {
        let mut cipher = Aes256Ctr::new_from_slices(&self.key, iv)
            .map_err(|_| StoreError::crypto("invalid key or IV length"))?;
        cipher.apply_keystream(buf);
        Ok(())
    }

    /// Encrypts a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    pub fn encrypt(&self, value: &Value) -> StoreResult<String> {
        let mut buf =
            serde_json::to_vec(value).map_err(|e| StoreError::crypto(e.to_string()))?;
        self.keystream(&self.iv, &mut buf)?;
        Ok(format!(
            "{}{SEPARATOR}{}",
            hex::encode(self.iv),
            hex::encode(&buf)
        ))
    }

    /// Decrypts a value produced by [`encrypt`](Self::encrypt).
    ///
    /// The IV is read from the payload, not from this cipher.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Crypto`] if the payload is malformed or does not
    /// decrypt to JSON.
    pub fn decrypt(&self, payload: &str) -> StoreResult<Value> {
        let (iv_hex, ct_hex) = payload
            .split_once(SEPARATOR)
            .ok_or_else(|| StoreError::crypto("payload is not in iv:ciphertext form"))?;
        let iv = hex::decode(iv_hex).map_err(|e| StoreError::crypto(format!("bad IV: {e}")))?;
        if iv.len() != IV_SIZE {
            return Err(StoreError::crypto(format!(
                "IV must be {IV_SIZE} bytes, got {}",
                iv.len()
            )));
        }
        let mut buf = hex::decode(ct_hex)
            .map_err(|e| StoreError::crypto(format!("bad ciphertext: {e}")))?;
        self.keystream(&iv, &mut buf)?;
        serde_json::from_slice(&buf)
            .map_err(|e| StoreError::crypto(format!("decrypted data is not JSON: {e}")))
    }

    fn encrypt_str(&self, text: &str) -> StoreResult<String> {
        self.encrypt(&Value::String(text.to_string()))
    }

    fn decrypt_str(&self, payload: &str) -> StoreResult<String> {
        match self.decrypt(payload)? {
            Value::String(text) => Ok(text),
            other => Err(StoreError::crypto(format!(
                "expected an encrypted string, found {other}"
            ))),
        }
    }
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCipher")
            .field("key", &"[REDACTED]")
            .field("iv", &"[REDACTED]")
            .finish()
    }
}

/// Applies field encryption to whole records according to a mode.
#[derive(Debug, Clone)]
pub struct FieldCodec {
    cipher: FieldCipher,
    mode: EncryptionMode,
}

impl FieldCodec {
    /// Creates a codec.
    #[must_use]
    pub fn new(cipher: FieldCipher, mode: EncryptionMode) -> Self {
        Self { cipher, mode }
    }

    /// Builds a codec from store configuration. Returns `None` when
    /// encryption is disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret or IV has the wrong length.
    pub fn from_config(config: &EncryptionConfig) -> StoreResult<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }
        let cipher = FieldCipher::new(&config.secret, &config.iv)?;
        Ok(Some(Self::new(cipher, config.mode)))
    }

    /// Returns the mode.
    #[must_use]
    pub fn mode(&self) -> EncryptionMode {
        self.mode
    }

    /// Encrypts the fields selected by the mode.
    ///
    /// # Errors
    ///
    /// Returns an error if a field cannot be serialized.
    pub fn encrypt_record(&self, record: &Record) -> StoreResult<Record> {
        let mut out = record.clone();
        if self.mode.encrypts_value() {
            out.value = record
                .value
                .as_ref()
                .map(|v| self.cipher.encrypt(v).map(Value::String))
                .transpose()?;
            out.kind = record
                .kind
                .as_deref()
                .map(|k| self.cipher.encrypt_str(k))
                .transpose()?;
        }
        if self.mode.encrypts_key() {
            out.key = record
                .key
                .as_deref()
                .map(|k| self.cipher.encrypt_str(k))
                .transpose()?;
        }
        Ok(out)
    }

    /// Reverses [`encrypt_record`](Self::encrypt_record).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Crypto`] if a field selected by the mode does
    /// not hold valid ciphertext. A record written under a different mode
    /// typically fails here.
    pub fn decrypt_record(&self, record: &Record) -> StoreResult<Record> {
        let mut out = record.clone();
        if self.mode.encrypts_value() {
            out.value = match &record.value {
                Some(Value::String(payload)) => Some(self.cipher.decrypt(payload)?),
                Some(other) => {
                    return Err(StoreError::crypto(format!(
                        "expected an encrypted value, found {other}"
                    )))
                }
                None => None,
            };
            out.kind = record
                .kind
                .as_deref()
                .map(|k| self.cipher.decrypt_str(k))
                .transpose()?;
        }
        if self.mode.encrypts_key() {
            out.key = record
                .key
                .as_deref()
                .map(|k| self.cipher.decrypt_str(k))
                .transpose()?;
        }
        Ok(out)
    }

    /// Returns the key a record is stored under at rest.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be encrypted.
    pub fn storage_key(&self, composed: &str) -> StoreResult<String> {
        if self.mode.encrypts_key() {
            self.cipher.encrypt_str(composed)
        } else {
            Ok(composed.to_string())
        }
    }

    /// Reverses [`storage_key`](Self::storage_key).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Crypto`] if the stored key is not valid
    /// ciphertext.
    pub fn plain_key(&self, stored: &str) -> StoreResult<String> {
        if self.mode.encrypts_key() {
            self.cipher.decrypt_str(stored)
        } else {
            Ok(stored.to_string())
        }
    }
}
