//! YAML emission and parsing (compiled in with the `yaml` feature)

use crate::error::{RenderError, Result};
use crate::value::Value;
use tracing::debug;

/// Emit a graph as a YAML document.
#[cfg(feature = "yaml")]
pub fn emit(value: &Value) -> Result<String> {
    serde_yaml::to_string(value).map_err(|e| RenderError::EncodingFailed(e.to_string()))
}

/// Emit a graph as a YAML document. Always fails without the `yaml` feature.
#[cfg(not(feature = "yaml"))]
pub fn emit(_value: &Value) -> Result<String> {
    Err(RenderError::unavailable("YAML"))
}

/// Parse a YAML document. Empty, null and malformed documents give `None`.
#[cfg(feature = "yaml")]
pub fn parse(text: &str) -> Option<Value> {
    match serde_yaml::from_str::<Value>(text) {
        Ok(Value::Null) => None,
        Ok(v) => Some(v),
        Err(e) => {
            debug!(error = %e, "yaml parse failed");
            None
        }
    }
}

/// Parse a YAML document. Always `None` without the `yaml` feature.
#[cfg(not(feature = "yaml"))]
pub fn parse(_text: &str) -> Option<Value> {
    debug!("yaml support not compiled in");
    None
}

#[cfg(all(test, feature = "yaml"))]
mod tests {
    use super::*;

    #[test]
    fn emits_block_mappings() {
        let v = Value::mapping([
            ("a", Value::from("b")),
            ("b", Value::mapping([("c", Value::from("d"))])),
        ]);
        assert_eq!(emit(&v).unwrap(), "a: b\nb:\n  c: d\n");
    }

    #[test]
    fn parses_back() {
        let v = parse("a: b\nb:\n  c: d\nn: 3\n").unwrap();
        assert_eq!(v.get("a"), Some(&Value::from("b")));
        assert_eq!(v.get("n"), Some(&Value::Int(3)));
        assert_eq!(v.get("b").and_then(|b| b.get("c")), Some(&Value::from("d")));
    }

    #[test]
    fn integer_keys_become_strings() {
        let v = parse("1: one\n2: two\n").unwrap();
        assert_eq!(v.get("2"), Some(&Value::from("two")));
    }

    #[test]
    fn empty_and_bad_documents_are_none() {
        assert!(parse("").is_none());
        assert!(parse("~").is_none());
        assert!(parse("a: [unclosed").is_none());
    }
}
