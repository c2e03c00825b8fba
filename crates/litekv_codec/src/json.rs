//! JSON encoding of table documents.

use crate::error::{CodecError, CodecResult};
use crate::table::TableData;

/// Encodes a table as compact JSON.
pub fn encode_table(table: &TableData) -> CodecResult<Vec<u8>> {
    serde_json::to_vec(table).map_err(|e| CodecError::encoding_failed(e.to_string()))
}

/// Decodes a table document.
///
/// An empty (or whitespace-only) document and a literal `null` decode to
/// `None`; the caller decides what an absent table means.
pub fn decode_table(bytes: &[u8]) -> CodecResult<Option<TableData>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| CodecError::decoding_failed(e.to_string()))?;

    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
            // Re-parse from bytes so the mapping keeps document order.
            serde_json::from_slice(bytes)
                .map(Some)
                .map_err(|e| CodecError::decoding_failed(e.to_string()))
        }
        other => Err(CodecError::invalid_document(format!(
            "expected object or array, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
