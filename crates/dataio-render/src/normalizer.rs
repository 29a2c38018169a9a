//! Graph normalization: objects to mappings, mappings to objects, flattening

use crate::value::{Mapping, Object, Value};
use dataio_codec::ensure_utf8;
use serde::Serialize;
use std::borrow::Cow;
use tracing::debug;

/// Field name carried by objects whose class was unknown at deserialization.
pub const INCOMPLETE_CLASS_MARKER: &str = "__PHP_Incomplete_Class_Name";

/// Element name substituted for mapping keys that are not XML names.
pub const XML_ITEM_KEY: &str = "item";

/// Converts between object graphs and plain mapping/sequence graphs.
///
/// Never fails: anything that cannot be converted is passed through.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    json_fast_path: bool,
}

impl Normalizer {
    /// `json_fast_path` converts containers by a JSON encode/decode round trip
    /// instead of walking them. Byte leaves come back as UTF-8 strings and
    /// non-finite floats as null on that path.
    pub fn new(json_fast_path: bool) -> Self {
        Self { json_fast_path }
    }

    /// Whether containers are converted by a JSON round trip.
    pub fn json_fast_path(&self) -> bool {
        self.json_fast_path
    }

    /// Replace every object with a mapping of its fields, recursively.
    pub fn to_graph(&self, value: &Value) -> Value {
        if !value.is_container() {
            return value.clone();
        }
        if self.json_fast_path {
            match json_roundtrip(value) {
                Some(graph) => return strip_incomplete_markers(graph),
                None => debug!("json fast path failed, walking graph"),
            }
        }
        structural_graph(value)
    }

    /// Lift any serializable Rust value into a graph. Returns `Value::Null`
    /// when the value cannot be represented.
    pub fn to_graph_from<T: Serialize + ?Sized>(&self, value: &T) -> Value {
        let lifted = serde_json::to_string(value)
            .and_then(|text| serde_json::from_str::<Value>(&text));
        match lifted {
            Ok(graph) => strip_incomplete_markers(graph),
            Err(e) => {
                debug!(error = %e, "value could not be lifted into a graph");
                Value::Null
            }
        }
    }

    /// Convert objects and mappings to mappings, dropping any key in
    /// `skip_keys` at every depth. Children are converted before the key test
    /// runs for the current level. Leaves are returned unchanged.
    pub fn flatten(&self, value: &Value, skip_keys: &[&str]) -> Value {
        match value {
            Value::Mapping(m) => Value::Mapping(self.flatten_fields(m, skip_keys)),
            Value::Object(o) => Value::Mapping(self.flatten_fields(&o.fields, skip_keys)),
            Value::Sequence(items) => Value::Sequence(
                items
                    .iter()
                    .map(|item| self.flatten(item, skip_keys))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn flatten_fields(&self, fields: &Mapping, skip_keys: &[&str]) -> Mapping {
        let mut out = Mapping::new();
        for (key, child) in fields.iter() {
            let converted = self.flatten(child, skip_keys);
            if skip_keys.contains(&key.as_str()) {
                continue;
            }
            out.insert(key.clone(), converted);
        }
        out
    }

    /// Turn mappings into generic objects, recursively. Sequences stay
    /// sequences; existing objects keep their class.
    pub fn to_object(&self, value: &Value) -> Value {
        match value {
            Value::Mapping(m) => Value::Object(Object::generic(self.object_fields(m))),
            Value::Object(o) => Value::Object(Object::new(o.class.clone(), self.object_fields(&o.fields))),
            Value::Sequence(items) => {
                Value::Sequence(items.iter().map(|item| self.to_object(item)).collect())
            }
            other => other.clone(),
        }
    }

    fn object_fields(&self, fields: &Mapping) -> Mapping {
        fields
            .iter()
            .filter(|(k, _)| k.as_str() != INCOMPLETE_CLASS_MARKER)
            .map(|(k, v)| (k.clone(), self.to_object(v)))
            .collect()
    }

    /// [`Self::to_graph`] followed by UTF-8 coercion of byte leaves.
    /// Idempotent.
    pub fn normalize(&self, value: &Value) -> Value {
        coerce_utf8(self.to_graph(value))
    }
}

fn json_roundtrip(value: &Value) -> Option<Value> {
    let text = serde_json::to_string(value).ok()?;
    serde_json::from_str(&text).ok()
}

fn structural_graph(value: &Value) -> Value {
    match value {
        Value::Object(o) => Value::Mapping(graph_fields(&o.fields)),
        Value::Mapping(m) => Value::Mapping(graph_fields(m)),
        Value::Sequence(items) => Value::Sequence(items.iter().map(structural_graph).collect()),
        other => other.clone(),
    }
}

fn graph_fields(fields: &Mapping) -> Mapping {
    fields
        .iter()
        .filter(|(k, _)| k.as_str() != INCOMPLETE_CLASS_MARKER)
        .map(|(k, v)| (k.clone(), structural_graph(v)))
        .collect()
}

fn strip_incomplete_markers(value: Value) -> Value {
    match value {
        Value::Mapping(m) => Value::Mapping(
            m.into_iter()
                .filter(|(k, _)| k != INCOMPLETE_CLASS_MARKER)
                .map(|(k, v)| (k, strip_incomplete_markers(v)))
                .collect(),
        ),
        Value::Sequence(items) => {
            Value::Sequence(items.into_iter().map(strip_incomplete_markers).collect())
        }
        other => other,
    }
}

fn coerce_utf8(value: Value) -> Value {
    match value {
        Value::Bytes(b) => Value::String(ensure_utf8(&b)),
        Value::Mapping(m) => Value::Mapping(m.into_iter().map(|(k, v)| (k, coerce_utf8(v))).collect()),
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(coerce_utf8).collect()),
        other => other,
    }
}

/// Element name for a mapping key. Keys that are not XML names (numeric
/// keys, keys with spaces, `@attributes`) become [`XML_ITEM_KEY`].
pub fn xml_key(key: &str) -> Cow<'_, str> {
    if is_xml_name(key) {
        Cow::Borrowed(key)
    } else {
        Cow::Borrowed(XML_ITEM_KEY)
    }
}

fn is_xml_name(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested_object() -> Value {
        Value::object([(
            "a",
            Value::object([(
                "nextLevel",
                Value::mapping([
                    ("arrayLevel", Value::from("part 1")),
                    (
                        "nextLevel",
                        Value::mapping([("recursiveLevel", Value::from("yes"))]),
                    ),
                ]),
            )]),
        )])
    }

    #[test]
    fn objects_become_mappings() {
        for fast in [false, true] {
            let graph = Normalizer::new(fast).to_graph(&nested_object());
            let a = graph.get("a").unwrap();
            assert!(a.as_mapping().is_some());
            let inner = a.get("nextLevel").unwrap().get("nextLevel").unwrap();
            assert_eq!(inner.get("recursiveLevel"), Some(&Value::from("yes")));
        }
    }

    #[test]
    fn incomplete_class_marker_is_removed() {
        let broken = Value::Object(Object::new(
            "__PHP_Incomplete_Class",
            [
                (INCOMPLETE_CLASS_MARKER, Value::from("Remote\\Type")),
                ("id", Value::Int(7)),
            ]
            .into_iter()
            .collect(),
        ));
        for fast in [false, true] {
            let graph = Normalizer::new(fast).to_graph(&Value::Sequence(vec![broken.clone()]));
            assert_eq!(graph, Value::Sequence(vec![Value::mapping([("id", Value::Int(7))])]));
        }
    }

    #[test]
    fn leaves_pass_through() {
        let n = Normalizer::default();
        assert_eq!(n.to_graph(&Value::Int(4)), Value::Int(4));
        assert_eq!(n.flatten(&Value::from("x"), &["x"]), Value::from("x"));
    }

    #[test]
    fn empty_input_gives_empty_mapping() {
        let n = Normalizer::default();
        let empty = Value::object(Vec::<(String, Value)>::new());
        assert_eq!(n.to_graph(&empty), Value::Mapping(Mapping::new()));
        assert_eq!(n.flatten(&empty, &[]), Value::Mapping(Mapping::new()));
    }

    #[test]
    fn flatten_skips_keys_at_every_depth() {
        let n = Normalizer::default();
        let flat = n.flatten(&nested_object(), &["arrayLevel"]);
        let level = flat.get("a").unwrap().get("nextLevel").unwrap();
        assert!(level.get("arrayLevel").is_none());
        assert!(level.get("nextLevel").is_some());

        let flat = n.flatten(&nested_object(), &["nextLevel"]);
        assert_eq!(flat, Value::mapping([("a", Value::mapping(Vec::<(String, Value)>::new()))]));
    }

    #[test]
    fn to_object_builds_generic_objects() {
        let n = Normalizer::default();
        let obj = n.to_object(&Value::mapping([
            ("a", Value::from("b")),
            ("b", Value::mapping([("c", Value::from("d"))])),
        ]));
        let b = obj.get("b").unwrap().as_object().unwrap();
        assert_eq!(b.class, "stdClass");
        assert_eq!(b.fields.get("c"), Some(&Value::from("d")));
    }

    #[test]
    fn normalize_coerces_bytes() {
        let n = Normalizer::default();
        let v = Value::mapping([("s", Value::Bytes(vec![b'r', 0xe4, b'k']))]);
        assert_eq!(
            n.normalize(&v),
            Value::mapping([("s", Value::from("r\u{e4}k"))])
        );
    }

    #[test]
    fn serializable_structs_lift() {
        #[derive(Serialize)]
        struct Probe {
            name: &'static str,
            sizes: Vec<u32>,
        }
        let graph = Normalizer::default().to_graph_from(&Probe {
            name: "p",
            sizes: vec![1, 2],
        });
        assert_eq!(
            graph,
            Value::mapping([
                ("name", Value::from("p")),
                ("sizes", Value::Sequence(vec![Value::Int(1), Value::Int(2)])),
            ])
        );
    }

    #[test]
    fn numeric_keys_become_item() {
        assert_eq!(xml_key("12"), "item");
        assert_eq!(xml_key("a1"), "a1");
        assert_eq!(xml_key("räk_1.x-y"), "räk_1.x-y");
    }

    #[test]
    fn invalid_names_become_item() {
        for key in ["", "a b", "@attributes", "1a", "-x", "a<b", "a&b", "a/b", "p:x"] {
            assert_eq!(xml_key(key), "item", "{:?}", key);
        }
    }
}
