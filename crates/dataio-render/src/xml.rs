//! Simple XML backend: a hand-rolled builder and tree parser
//!
//! The builder writes one element per mapping key (numeric keys become
//! `item`), repeats the element name for each sequence member, and escapes
//! leaf text or wraps it in CDATA. The parser produces an [`XmlElement`] tree;
//! prefixed child elements are held apart from the default view, so a SOAP
//! envelope parses to an empty graph.

use crate::normalizer::{xml_key, XML_ITEM_KEY};
use crate::value::{Mapping, Value, MAX_DEPTH};
use dataio_codec::strings::{escape_xml, unescape_entities};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// XML declaration written by both backends.
pub const XML_PROLOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Root element name used when none is configured.
pub const DEFAULT_ROOT: &str = "XMLResponse";

/// SOAP 1.1 envelope namespace.
pub const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Which XML implementation renders and parses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum XmlBackend {
    /// Hand-rolled builder and tree parser
    Simple,
    /// quick-xml writer and unserializer, when compiled in
    #[default]
    Library,
}

/// SOAP envelope wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoapEnvelope {
    /// Namespace prefix of the Envelope and Body elements
    pub prefix: String,
}

impl Default for SoapEnvelope {
    fn default() -> Self {
        Self {
            prefix: "SOAP-ENV".to_string(),
        }
    }
}

/// XML rendering options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmlOptions {
    /// Preferred backend
    pub backend: XmlBackend,
    /// Wrap leaf text in CDATA sections
    pub cdata: bool,
    /// Document (or SOAP body payload) element name
    pub root_name: String,
    /// Wrap the document in a SOAP envelope
    pub soap: Option<SoapEnvelope>,
}

impl Default for XmlOptions {
    fn default() -> Self {
        Self {
            backend: XmlBackend::default(),
            cdata: false,
            root_name: DEFAULT_ROOT.to_string(),
            soap: None,
        }
    }
}

/// Text form of a scalar leaf. `None` for containers.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Int(n) => Some(n.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Bytes(b) => Some(dataio_codec::ensure_utf8(b)),
        _ => None,
    }
}

/// Wrap text in CDATA, splitting any `]]>` it contains.
pub(crate) fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

/// Render a graph with the simple builder.
pub fn build(value: &Value, options: &XmlOptions) -> String {
    let mut out = String::new();
    out.push_str(XML_PROLOG);
    out.push('\n');
    if let Some(soap) = &options.soap {
        let _ = write!(
            out,
            "<{p}:Envelope xmlns:{p}=\"{ns}\"><{p}:Body>",
            p = soap.prefix,
            ns = SOAP_ENVELOPE_NS
        );
    }
    write_element(&mut out, &options.root_name, value, options.cdata);
    if let Some(soap) = &options.soap {
        let _ = write!(out, "</{p}:Body></{p}:Envelope>", p = soap.prefix);
    }
    out.push('\n');
    out
}

fn write_element(out: &mut String, name: &str, value: &Value, use_cdata: bool) {
    match value {
        Value::Mapping(m) => write_fields(out, name, m, use_cdata),
        Value::Object(o) => write_fields(out, name, &o.fields, use_cdata),
        Value::Sequence(items) if items.is_empty() => {
            let _ = write!(out, "<{}/>", name);
        }
        Value::Sequence(items) => {
            let _ = write!(out, "<{}>", name);
            for item in items {
                write_element(out, XML_ITEM_KEY, item, use_cdata);
            }
            let _ = write!(out, "</{}>", name);
        }
        Value::Null => {
            let _ = write!(out, "<{}/>", name);
        }
        leaf => {
            let text = scalar_text(leaf).unwrap_or_default();
            let body = if use_cdata {
                cdata(&text)
            } else {
                escape_xml(&text)
            };
            let _ = write!(out, "<{name}>{body}</{name}>");
        }
    }
}

fn write_fields(out: &mut String, name: &str, fields: &Mapping, use_cdata: bool) {
    if fields.is_empty() {
        let _ = write!(out, "<{}/>", name);
        return;
    }
    let _ = write!(out, "<{}>", name);
    for (key, child) in fields.iter() {
        let key = xml_key(key);
        match child {
            Value::Sequence(items) if !items.is_empty() => {
                for item in items {
                    write_element(out, &key, item, use_cdata);
                }
            }
            other => write_element(out, &key, other, use_cdata),
        }
    }
    let _ = write!(out, "</{}>", name);
}

/// A parsed XML element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    /// Qualified element name
    pub name: String,
    /// Unprefixed attributes in document order, values unescaped
    pub attributes: Vec<(String, String)>,
    /// Concatenated character data
    pub text: String,
    /// Unprefixed child elements
    pub children: Vec<XmlElement>,
    /// Prefixed (namespaced) child elements, outside the default view
    pub namespaced: Vec<XmlElement>,
}

impl XmlElement {
    /// First unprefixed child called `name`.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Default graph view: text-only elements become strings, anything else a
    /// mapping of child names (repeated names fold into sequences) plus an
    /// `@attributes` mapping when attributes are present.
    pub fn to_value(&self) -> Value {
        if self.children.is_empty() && self.attributes.is_empty() {
            let text = self.text.trim();
            return if text.is_empty() {
                Value::Mapping(Mapping::new())
            } else {
                Value::String(self.text.clone())
            };
        }
        let mut map = Mapping::new();
        if !self.attributes.is_empty() {
            map.insert(
                "@attributes",
                Value::Mapping(
                    self.attributes
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                        .collect(),
                ),
            );
        }
        for child in &self.children {
            let value = child.to_value();
            match map.get_mut(&child.name) {
                Some(Value::Sequence(items)) => items.push(value),
                Some(existing) => {
                    let first = std::mem::take(existing);
                    *existing = Value::Sequence(vec![first, value]);
                }
                None => {
                    map.insert(child.name.clone(), value);
                }
            }
        }
        Value::Mapping(map)
    }
}

/// Parse a document into its root element. `None` on malformed input or
/// nesting deeper than [`MAX_DEPTH`].
pub fn parse(text: &str) -> Option<XmlElement> {
    let mut parser = TreeParser { src: text, pos: 0 };
    parser.skip_misc()?;
    let root = parser.element(0)?;
    parser.skip_misc()?;
    (parser.pos == text.len()).then_some(root)
}

struct TreeParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> TreeParser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn skip_past(&mut self, terminator: &str) -> Option<()> {
        let end = self.rest().find(terminator)?;
        self.pos += end + terminator.len();
        Some(())
    }

    /// Whitespace, declarations, processing instructions, comments, doctype.
    fn skip_misc(&mut self) -> Option<()> {
        loop {
            self.skip_ws();
            let rest = self.rest();
            if rest.starts_with("<?") {
                self.skip_past("?>")?;
            } else if rest.starts_with("<!--") {
                self.skip_past("-->")?;
            } else if rest.starts_with("<!DOCTYPE") {
                self.skip_past(">")?;
            } else {
                return Some(());
            }
        }
    }

    fn name(&mut self) -> Option<String> {
        let rest = self.rest();
        let len = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '/' | '>' | '=' | '<'))
            .unwrap_or(rest.len());
        if len == 0 {
            return None;
        }
        self.pos += len;
        Some(rest[..len].to_string())
    }

    fn element(&mut self, depth: usize) -> Option<XmlElement> {
        if depth >= MAX_DEPTH || !self.rest().starts_with('<') {
            return None;
        }
        self.pos += 1;
        let mut element = XmlElement {
            name: self.name()?,
            ..XmlElement::default()
        };

        loop {
            self.skip_ws();
            let rest = self.rest();
            if rest.starts_with("/>") {
                self.pos += 2;
                return Some(element);
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break;
            }
            let key = self.name()?;
            self.skip_ws();
            if !self.rest().starts_with('=') {
                return None;
            }
            self.pos += 1;
            self.skip_ws();
            let quote = self.rest().chars().next().filter(|c| *c == '"' || *c == '\'')?;
            self.pos += 1;
            let end = self.rest().find(quote)?;
            let raw = &self.rest()[..end];
            if raw.contains('<') {
                return None;
            }
            // namespace declarations and prefixed attributes stay out of the default view
            if key != "xmlns" && !key.contains(':') {
                element.attributes.push((key, unescape_entities(raw)));
            }
            self.pos += end + 1;
        }

        loop {
            let rest = self.rest();
            if rest.is_empty() {
                return None;
            }
            if let Some(after) = rest.strip_prefix("</") {
                let len = after.find('>')?;
                if after[..len].trim_end() != element.name {
                    return None;
                }
                self.pos += 2 + len + 1;
                return Some(element);
            }
            if rest.starts_with("<!--") {
                self.skip_past("-->")?;
            } else if let Some(body) = rest.strip_prefix("<![CDATA[") {
                let end = body.find("]]>")?;
                element.text.push_str(&body[..end]);
                self.pos += "<![CDATA[".len() + end + 3;
            } else if rest.starts_with("<?") {
                self.skip_past("?>")?;
            } else if rest.starts_with('<') {
                let child = self.element(depth + 1)?;
                if child.name.contains(':') {
                    element.namespaced.push(child);
                } else {
                    element.children.push(child);
                }
            } else {
                let end = rest.find('<').unwrap_or(rest.len());
                element.text.push_str(&unescape_entities(&rest[..end]));
                self.pos += end;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        Value::mapping([
            ("a", Value::from("b & c")),
            (
                "list",
                Value::Sequence(vec![Value::Int(1), Value::Int(2)]),
            ),
            ("0", Value::from("numeric")),
            ("empty", Value::Null),
        ])
    }

    #[test]
    fn builds_document() {
        let xml = build(&sample(), &XmlOptions::default());
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<XMLResponse><a>b &amp; c</a>\
             <list>1</list><list>2</list><item>numeric</item><empty/></XMLResponse>\n"
        );
    }

    #[test]
    fn cdata_wraps_and_splits() {
        let opts = XmlOptions {
            cdata: true,
            ..XmlOptions::default()
        };
        let xml = build(&Value::mapping([("t", Value::from("x]]>y"))]), &opts);
        assert!(xml.contains("<t><![CDATA[x]]]]><![CDATA[>y]]></t>"));
        let root = parse(&xml).unwrap();
        assert_eq!(root.child("t").unwrap().text, "x]]>y");
    }

    #[test]
    fn soap_envelope_wraps_root() {
        let opts = XmlOptions {
            root_name: "getMethodName".to_string(),
            soap: Some(SoapEnvelope::default()),
            ..XmlOptions::default()
        };
        let xml = build(&Value::mapping(Vec::<(String, Value)>::new()), &opts);
        assert!(xml.contains(
            "<SOAP-ENV:Envelope xmlns:SOAP-ENV=\"http://schemas.xmlsoap.org/soap/envelope/\">\
             <SOAP-ENV:Body><getMethodName/></SOAP-ENV:Body></SOAP-ENV:Envelope>"
        ));
    }

    #[test]
    fn parse_round_trips_graph_view() {
        let xml = build(&sample(), &XmlOptions::default());
        let root = parse(&xml).unwrap();
        assert_eq!(root.name, "XMLResponse");
        let graph = root.to_value();
        assert_eq!(graph.get("a"), Some(&Value::from("b & c")));
        assert_eq!(
            graph.get("list"),
            Some(&Value::Sequence(vec![Value::from("1"), Value::from("2")]))
        );
        assert_eq!(graph.get("item"), Some(&Value::from("numeric")));
        assert_eq!(graph.get("empty"), Some(&Value::Mapping(Mapping::new())));
    }

    #[test]
    fn parse_attributes_and_comments() {
        let root = parse(
            "<!-- lead --><r id='7' name=\"x &amp; y\"><!-- c --><v>1</v><w/></r>",
        )
        .unwrap();
        assert_eq!(root.attributes[1], ("name".to_string(), "x & y".to_string()));
        let graph = root.to_value();
        assert_eq!(
            graph.get("@attributes").and_then(|a| a.get("id")),
            Some(&Value::from("7"))
        );
        assert_eq!(graph.get("v"), Some(&Value::from("1")));
    }

    #[test]
    fn prefixed_children_are_hidden() {
        let root = parse(
            "<soap:Envelope xmlns:soap=\"x\"><soap:Body><r><id>1</id></r></soap:Body></soap:Envelope>",
        )
        .unwrap();
        assert!(root.children.is_empty());
        assert_eq!(root.namespaced.len(), 1);
        assert!(root.to_value().is_empty());
    }

    #[test]
    fn invalid_key_names_render_as_item() {
        let v = Value::mapping([
            ("a b", Value::Int(1)),
            ("@attributes", Value::mapping([("id", Value::Int(2))])),
            ("ok", Value::Int(3)),
        ]);
        let xml = build(&v, &XmlOptions::default());
        assert!(xml.contains("<item>1</item><item><id>2</id></item><ok>3</ok>"));
        let graph = parse(&xml).unwrap().to_value();
        assert_eq!(graph.get("ok"), Some(&Value::from("3")));
        assert!(graph.get("item").is_some());
    }

    #[test]
    fn nesting_limit() {
        let nested = |depth: usize| format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
        assert!(parse(&nested(MAX_DEPTH)).is_some());
        assert!(parse(&nested(MAX_DEPTH + 1)).is_none());
        assert!(parse(&nested(200_000)).is_none());
    }

    #[test]
    fn malformed_documents_are_none() {
        assert!(parse("").is_none());
        assert!(parse("<a><b></a>").is_none());
        assert!(parse("<a>").is_none());
        assert!(parse("&lt;a&gt;&lt;/a&gt;").is_none());
        assert!(parse("<a></a><b></b>").is_none());
    }
}
