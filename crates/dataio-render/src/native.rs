//! Native serialize format
//!
//! ```text
//! N;  b:1;  i:42;  d:0.5;  s:5:"hello";
//! a:2:{i:0;s:1:"x";s:1:"k";N;}
//! O:8:"stdClass":1:{s:1:"a";i:1;}
//! ```
//!
//! String lengths count bytes. Mapping keys that are canonical integers are
//! written as `i:` keys, as the format's own arrays do.

use crate::value::{Mapping, Object, Value, MAX_DEPTH};
use tracing::debug;

/// Serialize a graph. Objects keep their class names.
pub fn serialize(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => out.extend_from_slice(b"N;"),
        Value::Bool(b) => out.extend_from_slice(if *b { b"b:1;" } else { b"b:0;" }),
        Value::Int(n) => out.extend_from_slice(format!("i:{};", n).as_bytes()),
        Value::Float(f) => out.extend_from_slice(format!("d:{};", format_float(*f)).as_bytes()),
        Value::String(s) => write_bytes(out, s.as_bytes()),
        Value::Bytes(b) => write_bytes(out, b),
        Value::Sequence(items) => {
            out.extend_from_slice(format!("a:{}:{{", items.len()).as_bytes());
            for (i, item) in items.iter().enumerate() {
                out.extend_from_slice(format!("i:{};", i).as_bytes());
                write_value(out, item);
            }
            out.push(b'}');
        }
        Value::Mapping(m) => {
            out.extend_from_slice(format!("a:{}:{{", m.len()).as_bytes());
            write_fields(out, m, true);
            out.push(b'}');
        }
        Value::Object(o) => {
            out.extend_from_slice(
                format!("O:{}:\"{}\":{}:{{", o.class.len(), o.class, o.fields.len()).as_bytes(),
            );
            write_fields(out, &o.fields, false);
            out.push(b'}');
        }
    }
}

fn write_fields(out: &mut Vec<u8>, fields: &Mapping, integer_keys: bool) {
    for (k, v) in fields.iter() {
        match canonical_int(k).filter(|_| integer_keys) {
            Some(n) => out.extend_from_slice(format!("i:{};", n).as_bytes()),
            None => write_bytes(out, k.as_bytes()),
        }
        write_value(out, v);
    }
}

fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(format!("s:{}:\"", bytes.len()).as_bytes());
    out.extend_from_slice(bytes);
    out.extend_from_slice(b"\";");
}

fn canonical_int(key: &str) -> Option<i64> {
    let n: i64 = key.parse().ok()?;
    (n.to_string() == key).then_some(n)
}

/// Shortest round-trip representation; scientific notation with a signed
/// exponent outside `1e-4..1e15`.
fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "NAN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    let abs = f.abs();
    if abs != 0.0 && !(1e-4..1e15).contains(&abs) {
        let sci = format!("{:e}", f);
        let (mantissa, exp) = sci.split_once('e').unwrap_or((&sci, "0"));
        let mantissa = if mantissa.contains('.') {
            mantissa.to_string()
        } else {
            format!("{}.0", mantissa)
        };
        let exp = if exp.starts_with('-') {
            exp.to_string()
        } else {
            format!("+{}", exp)
        };
        return format!("{}E{}", mantissa, exp);
    }
    format!("{}", f)
}

/// Parse native serialize text. `None` on malformed input, trailing data, or
/// nesting deeper than [`MAX_DEPTH`].
pub fn unserialize(input: &[u8]) -> Option<Value> {
    let mut parser = Parser {
        input,
        pos: 0,
        depth: 0,
    };
    let value = parser.value();
    match value {
        Some(v) if parser.pos == input.len() => Some(v),
        Some(_) => {
            debug!(offset = parser.pos, "trailing data after serialized value");
            None
        }
        None => {
            debug!(offset = parser.pos, "malformed serialized value");
            None
        }
    }
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Option<()> {
        (self.peek()? == byte).then(|| self.pos += 1)
    }

    fn until(&mut self, stop: u8) -> Option<&'a str> {
        let start = self.pos;
        let len = self.input[start..].iter().position(|&b| b == stop)?;
        self.pos = start + len + 1;
        std::str::from_utf8(&self.input[start..start + len]).ok()
    }

    fn int_until(&mut self, stop: u8) -> Option<i64> {
        self.until(stop)?.parse().ok()
    }

    fn count(&mut self) -> Option<usize> {
        self.until(b':')?.parse().ok()
    }

    fn quoted(&mut self, len: usize) -> Option<&'a [u8]> {
        self.expect(b'"')?;
        let end = self.pos.checked_add(len)?;
        let bytes = self.input.get(self.pos..end)?;
        self.pos = end;
        self.expect(b'"')?;
        Some(bytes)
    }

    fn enter(&mut self) -> Option<()> {
        self.depth += 1;
        (self.depth <= MAX_DEPTH).then_some(())
    }

    fn value(&mut self) -> Option<Value> {
        let tag = self.peek()?;
        self.pos += 1;
        if tag == b'N' {
            self.expect(b';')?;
            return Some(Value::Null);
        }
        self.expect(b':')?;
        match tag {
            b'b' => match self.until(b';')? {
                "0" => Some(Value::Bool(false)),
                "1" => Some(Value::Bool(true)),
                _ => None,
            },
            b'i' => self.int_until(b';').map(Value::Int),
            b'd' => parse_float(self.until(b';')?).map(Value::Float),
            b's' => {
                let len = self.count()?;
                let bytes = self.quoted(len)?;
                self.expect(b';')?;
                Some(match std::str::from_utf8(bytes) {
                    Ok(s) => Value::String(s.to_string()),
                    Err(_) => Value::Bytes(bytes.to_vec()),
                })
            }
            b'a' => {
                self.enter()?;
                let n = self.count()?;
                self.expect(b'{')?;
                let mut entries = Vec::with_capacity(n.min(1024));
                for _ in 0..n {
                    let key = self.key()?;
                    let value = self.value()?;
                    entries.push((key, value));
                }
                self.expect(b'}')?;
                self.depth -= 1;
                Some(array_value(entries))
            }
            b'O' => {
                self.enter()?;
                let len = self.count()?;
                let class = std::str::from_utf8(self.quoted(len)?).ok()?.to_string();
                self.expect(b':')?;
                let n = self.count()?;
                self.expect(b'{')?;
                let mut fields = Mapping::new();
                for _ in 0..n {
                    let key = visible_name(&self.key()?.into_string()).to_string();
                    let value = self.value()?;
                    fields.insert(key, value);
                }
                self.expect(b'}')?;
                self.depth -= 1;
                Some(Value::Object(Object::new(class, fields)))
            }
            _ => None,
        }
    }

    fn key(&mut self) -> Option<Key> {
        match self.value()? {
            Value::Int(n) => Some(Key::Int(n)),
            Value::String(s) => Some(Key::Str(s)),
            _ => None,
        }
    }
}

enum Key {
    Int(i64),
    Str(String),
}

impl Key {
    fn into_string(self) -> String {
        match self {
            Key::Int(n) => n.to_string(),
            Key::Str(s) => s,
        }
    }
}

/// Arrays keyed exactly `0..n` become sequences.
fn array_value(entries: Vec<(Key, Value)>) -> Value {
    let sequential = entries
        .iter()
        .enumerate()
        .all(|(i, (k, _))| matches!(k, Key::Int(n) if *n == i as i64));
    if sequential {
        Value::Sequence(entries.into_iter().map(|(_, v)| v).collect())
    } else {
        Value::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.into_string(), v))
                .collect(),
        )
    }
}

/// Protected and private members are stored as `\0*\0name` and
/// `\0Class\0name`.
fn visible_name(raw: &str) -> &str {
    match raw.strip_prefix('\0') {
        Some(rest) => rest.split_once('\0').map_or(raw, |(_, name)| name),
        None => raw,
    }
}

fn parse_float(text: &str) -> Option<f64> {
    match text {
        "NAN" => Some(f64::NAN),
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        _ => text.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars() {
        assert_eq!(serialize(&Value::Null), b"N;");
        assert_eq!(serialize(&Value::Bool(true)), b"b:1;");
        assert_eq!(serialize(&Value::Int(-3)), b"i:-3;");
        assert_eq!(serialize(&Value::from("räk")), "s:4:\"räk\";".as_bytes());
    }

    #[test]
    fn floats_use_shortest_form() {
        assert_eq!(format_float(0.5), "0.5");
        assert_eq!(format_float(1.0), "1");
        assert_eq!(format_float(1e15), "1.0E+15");
        assert_eq!(format_float(1.5e-7), "1.5E-7");
        assert_eq!(format_float(f64::NEG_INFINITY), "-INF");
    }

    #[test]
    fn nested_mapping_snapshot() {
        let v = Value::mapping([
            ("a", Value::from("b")),
            ("b", Value::mapping([("c", Value::from("d"))])),
        ]);
        assert_eq!(
            serialize(&v),
            br#"a:2:{s:1:"a";s:1:"b";s:1:"b";a:1:{s:1:"c";s:1:"d";}}"#
        );
    }

    #[test]
    fn integer_keys() {
        let v = Value::mapping([("7", Value::Null), ("07", Value::Null)]);
        assert_eq!(serialize(&v), br#"a:2:{i:7;N;s:2:"07";N;}"#);
    }

    #[test]
    fn parse_sequences_and_mappings() {
        assert_eq!(
            unserialize(br#"a:2:{i:0;s:1:"x";i:1;b:0;}"#),
            Some(Value::Sequence(vec![Value::from("x"), Value::Bool(false)]))
        );
        assert_eq!(
            unserialize(br#"a:1:{i:5;d:2.5;}"#),
            Some(Value::mapping([("5", Value::Float(2.5))]))
        );
    }

    #[test]
    fn parse_object_with_hidden_members() {
        let text = b"O:3:\"Foo\":2:{s:4:\"\0*\0a\";i:1;s:6:\"\0Foo\0b\";i:2;}";
        let v = unserialize(text).unwrap();
        let o = v.as_object().unwrap();
        assert_eq!(o.class, "Foo");
        assert_eq!(o.fields.get("a"), Some(&Value::Int(1)));
        assert_eq!(o.fields.get("b"), Some(&Value::Int(2)));
    }

    #[test]
    fn bad_input_is_none() {
        assert!(unserialize(b"fail_this").is_none());
        assert!(unserialize(b"").is_none());
        assert!(unserialize(b"s:10:\"short\";").is_none());
        assert!(unserialize(b"i:1;junk").is_none());
        assert!(unserialize(b"a:1:{N;N;}").is_none());
    }

    #[test]
    fn nesting_limit() {
        let nested = |depth: usize| {
            let mut text = "a:1:{i:0;".repeat(depth);
            text.push_str("N;");
            text.push_str(&"}".repeat(depth));
            text.into_bytes()
        };
        assert!(unserialize(&nested(MAX_DEPTH)).is_some());
        assert!(unserialize(&nested(MAX_DEPTH + 1)).is_none());
        assert!(unserialize(&nested(200_000)).is_none());
    }

    #[test]
    fn binary_strings_survive() {
        let v = Value::Bytes(vec![0xff, 0x00, b'"']);
        assert_eq!(unserialize(&serialize(&v)), Some(v));
    }
}
