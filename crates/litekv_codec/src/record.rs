//! Stored record and its type tag.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Coarse type tag inferred from a record's value.
///
/// Only `String`, `Number`, `Boolean`, `Array` and `Object` can be inferred
/// from a JSON value; `null` counts as an object. The other tags are accepted when reading documents
/// written by other producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// UTF-8 string.
    String,
    /// Integer or floating point number.
    Number,
    /// `true` or `false`.
    Boolean,
    /// Ordered list.
    Array,
    /// Keyed map.
    Map,
    /// Unordered set.
    Set,
    /// Point in time.
    Date,
    /// Regular expression.
    #[serde(rename = "regexp")]
    RegExp,
    /// Callable.
    Function,
    /// Any other structured value.
    Object,
}

impl RecordType {
    /// Infers the tag for a value. `null` is tagged `object`.
    #[must_use]
    pub fn infer(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(_) => Some(Self::Boolean),
            Value::Number(_) => Some(Self::Number),
            Value::String(_) => Some(Self::String),
            Value::Array(_) => Some(Self::Array),
            Value::Null | Value::Object(_) => Some(Self::Object),
        }
    }

    /// Returns the lowercase tag as written to disk.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Map => "map",
            Self::Set => "set",
            Self::Date => "date",
            Self::RegExp => "regexp",
            Self::Function => "function",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            "array" => Ok(Self::Array),
            "map" => Ok(Self::Map),
            "set" => Ok(Self::Set),
            "date" => Ok(Self::Date),
            "regexp" => Ok(Self::RegExp),
            "function" => Ok(Self::Function),
            "object" => Ok(Self::Object),
            other => Err(format!("unknown record type: {other}")),
        }
    }
}

/// Returns true for values that are dropped by the sparse-field rule:
/// `null`, `false`, numeric zero and the empty string.
///
/// Arrays and objects are never falsy, even when empty.
#[must_use]
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// A stored record.
///
/// Every field is optional because the sparse-field rule drops falsy
/// values before storage. `kind` and `key` are plain strings so they can
/// hold ciphertext when field encryption is enabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Type tag (see [`RecordType`]), or ciphertext of it.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Composed key, or ciphertext of it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Stored value, or ciphertext of it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Absolute expiry instant in epoch milliseconds. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
}

impl Record {
    /// Parses the type tag. Returns `None` when absent or not a known tag
    /// (for example while it is still encrypted).
    #[must_use]
    pub fn record_type(&self) -> Option<RecordType> {
        self.kind.as_deref().and_then(|k| k.parse().ok())
    }

    /// Returns true when the record carries a value field.
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn infer_json_types() {
        assert_eq!(RecordType::infer(&json!("x")), Some(RecordType::String));
        assert_eq!(RecordType::infer(&json!(1.5)), Some(RecordType::Number));
        assert_eq!(RecordType::infer(&json!(false)), Some(RecordType::Boolean));
        assert_eq!(RecordType::infer(&json!([])), Some(RecordType::Array));
        assert_eq!(RecordType::infer(&json!({"a": 1})), Some(RecordType::Object));
        assert_eq!(RecordType::infer(&Value::Null), Some(RecordType::Object));
    }

    #[test]
    fn falsy_values() {
        assert!(is_falsy(&Value::Null));
        assert!(is_falsy(&json!(false)));
        assert!(is_falsy(&json!(0)));
        assert!(is_falsy(&json!(0.0)));
        assert!(is_falsy(&json!("")));

        assert!(!is_falsy(&json!(true)));
        assert!(!is_falsy(&json!(-1)));
        assert!(!is_falsy(&json!("0")));
        assert!(!is_falsy(&json!([])));
        assert!(!is_falsy(&json!({})));
    }

    #[test]
    fn sparse_record_serializes_without_absent_fields() {
        let record = Record {
            kind: Some("number".to_string()),
            key: Some("z".to_string()),
            value: None,
            ttl: None,
        };
        let text = serde_json::to_string(&record).unwrap();
        assert_eq!(text, r#"{"type":"number","key":"z"}"#);
    }

    #[test]
    fn record_type_parses_from_tag() {
        let record: Record = serde_json::from_str(r#"{"type":"regexp","key":"r"}"#).unwrap();
        assert_eq!(record.record_type(), Some(RecordType::RegExp));
        assert!(!record.has_value());
    }

    #[test]
    fn tag_roundtrips_through_display() {
        for tag in [
            RecordType::String,
            RecordType::Map,
            RecordType::Date,
            RecordType::RegExp,
            RecordType::Function,
        ] {
            assert_eq!(tag.to_string().parse::<RecordType>().unwrap(), tag);
        }
    }
}
