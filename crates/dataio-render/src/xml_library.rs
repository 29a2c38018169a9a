//! Library XML backend on quick-xml: indented writer and unserializer

use crate::error::{RenderError, Result};
use crate::normalizer::{xml_key, XML_ITEM_KEY};
use crate::value::{Mapping, Value, MAX_DEPTH};
use crate::xml::{scalar_text, XmlOptions, SOAP_ENVELOPE_NS};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tracing::debug;

type XmlWriter = Writer<Vec<u8>>;

fn io_err(e: std::io::Error) -> RenderError {
    RenderError::EncodingFailed(e.to_string())
}

/// Render a graph as an indented document.
pub fn serialize(value: &Value, options: &XmlOptions) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(io_err)?;

    let envelope = options.soap.as_ref().map(|soap| {
        (
            format!("{}:Envelope", soap.prefix),
            format!("{}:Body", soap.prefix),
            format!("xmlns:{}", soap.prefix),
        )
    });
    if let Some((env, body, xmlns)) = &envelope {
        let mut start = BytesStart::new(env.as_str());
        start.push_attribute((xmlns.as_str(), SOAP_ENVELOPE_NS));
        writer.write_event(Event::Start(start)).map_err(io_err)?;
        writer
            .write_event(Event::Start(BytesStart::new(body.as_str())))
            .map_err(io_err)?;
    }

    write_element(&mut writer, &options.root_name, value, options.cdata)?;

    if let Some((env, body, _)) = &envelope {
        writer
            .write_event(Event::End(BytesEnd::new(body.as_str())))
            .map_err(io_err)?;
        writer
            .write_event(Event::End(BytesEnd::new(env.as_str())))
            .map_err(io_err)?;
    }

    String::from_utf8(writer.into_inner()).map_err(|e| RenderError::EncodingFailed(e.to_string()))
}

fn write_element(writer: &mut XmlWriter, name: &str, value: &Value, use_cdata: bool) -> Result<()> {
    let fields = match value {
        Value::Mapping(m) => Some(m),
        Value::Object(o) => Some(&o.fields),
        _ => None,
    };
    if let Some(fields) = fields {
        return write_fields(writer, name, fields, use_cdata);
    }

    match value {
        Value::Sequence(items) if !items.is_empty() => {
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(io_err)?;
            for item in items {
                write_element(writer, XML_ITEM_KEY, item, use_cdata)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(io_err)?;
        }
        Value::Sequence(_) | Value::Null => {
            writer
                .write_event(Event::Empty(BytesStart::new(name)))
                .map_err(io_err)?;
        }
        leaf => {
            let text = scalar_text(leaf).unwrap_or_default();
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(io_err)?;
            if use_cdata {
                for part in BytesCData::escaped(&text) {
                    writer.write_event(Event::CData(part)).map_err(io_err)?;
                }
            } else {
                writer
                    .write_event(Event::Text(BytesText::new(&text)))
                    .map_err(io_err)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(io_err)?;
        }
    }
    Ok(())
}

fn write_fields(writer: &mut XmlWriter, name: &str, fields: &Mapping, use_cdata: bool) -> Result<()> {
    if fields.is_empty() {
        writer
            .write_event(Event::Empty(BytesStart::new(name)))
            .map_err(io_err)?;
        return Ok(());
    }
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(io_err)?;
    for (key, child) in fields.iter() {
        let key = xml_key(key);
        match child {
            Value::Sequence(items) if !items.is_empty() => {
                for item in items {
                    write_element(writer, &key, item, use_cdata)?;
                }
            }
            other => write_element(writer, &key, other, use_cdata)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(io_err)?;
    Ok(())
}

struct Frame {
    name: String,
    text: String,
    children: Vec<(String, Value)>,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// Leaves become their text; elements with children become mappings
    /// with repeated names folded into sequences. Attributes are ignored.
    fn into_value(self) -> Value {
        if self.children.is_empty() {
            return Value::String(self.text);
        }
        let mut map = Mapping::new();
        for (name, value) in self.children {
            match map.get_mut(&name) {
                Some(Value::Sequence(items)) => items.push(value),
                Some(existing) => {
                    let first = std::mem::take(existing);
                    *existing = Value::Sequence(vec![first, value]);
                }
                None => {
                    map.insert(name, value);
                }
            }
        }
        Value::Mapping(map)
    }
}

/// Unserialize a document into the graph of its root element's content.
/// `None` on malformed input or nesting deeper than [`MAX_DEPTH`].
pub fn unserialize(text: &str) -> Option<Value> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);
    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<Value> = None;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                debug!(error = %e, position = reader.buffer_position(), "xml unserialize failed");
                return None;
            }
        };
        match event {
            Event::Start(e) => {
                if root.is_some() || stack.len() >= MAX_DEPTH {
                    return None;
                }
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                stack.push(Frame::new(name));
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let value = Value::String(String::new());
                match stack.last_mut() {
                    Some(parent) => parent.children.push((name, value)),
                    None if root.is_none() => root = Some(Value::Mapping(Mapping::new())),
                    None => return None,
                }
            }
            Event::End(_) => {
                let frame = stack.pop()?;
                let name = frame.name.clone();
                let value = frame.into_value();
                match stack.last_mut() {
                    Some(parent) => parent.children.push((name, value)),
                    None => {
                        root = Some(match value {
                            Value::String(s) if s.is_empty() => Value::Mapping(Mapping::new()),
                            other => other,
                        })
                    }
                }
            }
            Event::Text(e) => {
                let text = e.unescape().ok()?;
                stack.last_mut()?.text.push_str(&text);
            }
            Event::CData(e) => {
                let raw = e.into_inner();
                stack.last_mut()?.text.push_str(&String::from_utf8_lossy(&raw));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.is_empty() {
        root
    } else {
        None
    }
}
