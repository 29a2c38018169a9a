//! JSON encoding with four-space pretty printing, and best-effort decoding

use crate::error::{RenderError, Result};
use crate::value::Value;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::debug;

/// Pretty-print `value` with four-space indentation.
pub fn encode_pretty(value: &Value) -> Result<String> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|e| RenderError::EncodingFailed(e.to_string()))
}

/// Decode JSON text into a graph of mappings. `None` on malformed input.
pub fn decode(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!(error = %e, "json decode failed");
            None
        }
    }
}
