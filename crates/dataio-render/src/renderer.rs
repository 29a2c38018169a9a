//! Format renderer: graph to JSON, XML, YAML or native serialize text,
//! optionally compressed, plus the matching parsers

use crate::config::RenderConfig;
use crate::error::{RenderError, Result};
use crate::json;
use crate::native;
use crate::normalizer::Normalizer;
use crate::terminal::TerminalWriter;
use crate::value::Value;
use crate::xml::{self, XmlBackend, XmlElement, XmlOptions};
use crate::yaml;
use dataio_codec::compression::MAX_LEVEL;
use dataio_codec::strings::unescape_entities;
use dataio_codec::{Capabilities, CompressionKind, Compressor};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Pretty-printed JSON
    Json,
    /// XML document
    Xml,
    /// YAML document
    Yaml,
    /// Native serialize text
    Serialized,
}

impl Format {
    /// `Content-Type` of an uncompressed payload.
    pub fn content_type(&self) -> &'static str {
        match self {
            Format::Json => "application/json; charset=utf-8",
            Format::Xml => "application/xml; charset=utf-8",
            Format::Yaml => "application/x-yaml; charset=utf-8",
            Format::Serialized => "text/plain; charset=utf-8",
        }
    }
}

/// Per-call options.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderOptions {
    /// Compression applied after encoding
    pub compression: CompressionKind,
    /// Compression level; the renderer's configured level when `None`
    pub level: Option<u32>,
    /// XML settings
    pub xml: XmlOptions,
}

impl RenderOptions {
    /// Same options with a compression kind.
    pub fn compressed(mut self, kind: CompressionKind) -> Self {
        self.compression = kind;
        self
    }
}

/// A rendered payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Encoded (and possibly compressed) bytes
    pub body: Vec<u8>,
    /// Format the body was encoded in
    pub format: Format,
    /// Compression applied to the body
    pub compression: CompressionKind,
}

impl Rendered {
    /// Header value describing the body.
    pub fn content_type(&self) -> &'static str {
        if self.compression.is_compressed() {
            self.compression.content_type()
        } else {
            self.format.content_type()
        }
    }

    /// Discriminator tag of the compression, empty when uncompressed.
    pub fn tag(&self) -> &'static str {
        self.compression.tag()
    }

    /// Body as text, when uncompressed.
    pub fn text(&self) -> Option<&str> {
        if self.compression.is_compressed() {
            return None;
        }
        std::str::from_utf8(&self.body).ok()
    }
}

/// Result of [`Renderer::parse_xml`].
#[derive(Debug, Clone, PartialEq)]
pub enum XmlDocument {
    /// Raw element tree
    Tree(XmlElement),
    /// Normalized graph, or an object graph from the library unserializer
    Graph(Value),
}

impl XmlDocument {
    /// Graph view of the document.
    pub fn into_value(self) -> Value {
        match self {
            XmlDocument::Tree(root) => root.to_value(),
            XmlDocument::Graph(v) => v,
        }
    }
}

/// Renders graphs and parses them back. Instance settings are plain fields;
/// share one instance across threads only behind external synchronization.
#[derive(Debug, Clone)]
pub struct Renderer {
    caps: Capabilities,
    config: RenderConfig,
    normalizer: Normalizer,
    compressor: Compressor,
}

impl Renderer {
    /// Renderer over explicit capabilities and configuration.
    pub fn new(caps: Capabilities, config: RenderConfig) -> Self {
        Self {
            caps,
            normalizer: Normalizer::new(config.json_roundtrip),
            compressor: Compressor::new(caps),
            config,
        }
    }

    /// Probed capabilities, default configuration.
    pub fn probe() -> Self {
        Self::new(Capabilities::probe(), RenderConfig::default())
    }

    /// Capabilities this renderer was built with.
    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    /// Current instance defaults.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Graph normalizer used before encoding.
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Compressor used for compressed output.
    pub fn compressor(&self) -> &Compressor {
        &self.compressor
    }

    /// Default compression level, clamped to 0-9.
    pub fn set_compression_level(&mut self, level: u32) {
        self.config.compression_level = level.min(MAX_LEVEL);
    }

    /// Default XML backend.
    pub fn set_xml_backend(&mut self, backend: XmlBackend) {
        self.config.xml_backend = backend;
    }

    /// Wrap XML leaf text in CDATA sections.
    pub fn set_cdata(&mut self, cdata: bool) {
        self.config.cdata = cdata;
    }

    /// Parse XML with the library unserializer when it is available.
    pub fn set_use_unserializer(&mut self, on: bool) {
        self.config.use_unserializer = on;
    }

    /// Library XML backend is compiled in and advertised.
    pub fn has_xml_library(&self) -> bool {
        self.caps.has_xml_library && cfg!(feature = "xml-library")
    }

    /// YAML is compiled in and advertised.
    pub fn has_yaml(&self) -> bool {
        self.caps.has_yaml && cfg!(feature = "yaml")
    }

    /// Options seeded from the instance configuration.
    pub fn options(&self) -> RenderOptions {
        RenderOptions {
            compression: CompressionKind::None,
            level: None,
            xml: XmlOptions {
                backend: self.config.xml_backend,
                cdata: self.config.cdata,
                root_name: self.config.root_name.clone(),
                soap: None,
            },
        }
    }

    /// Encode `input` as `format`, then compress if requested.
    #[instrument(skip(self, input, options), fields(compression = ?options.compression))]
    pub fn render(&self, input: &Value, format: Format, options: &RenderOptions) -> Result<Rendered> {
        let encoded = self.encode(input, format, &options.xml)?;
        let body = if options.compression.is_compressed() {
            let level = options.level.unwrap_or(self.config.compression_level);
            self.compressor
                .compress(&encoded, options.compression, level)?
        } else {
            encoded
        };
        debug!(bytes = body.len(), "rendered");
        Ok(Rendered {
            body,
            format,
            compression: options.compression,
        })
    }

    fn encode(&self, input: &Value, format: Format, xml_options: &XmlOptions) -> Result<Vec<u8>> {
        match format {
            Format::Json => {
                let graph = match input {
                    Value::String(text) => match json::decode(text) {
                        Some(decoded) => self.normalizer.normalize(&decoded),
                        None => self.normalizer.normalize(input),
                    },
                    other => self.normalizer.normalize(other),
                };
                Ok(json::encode_pretty(&graph)?.into_bytes())
            }
            Format::Serialized => Ok(native::serialize(input)),
            Format::Xml => {
                let graph = self.normalizer.normalize(input);
                if xml_options.backend == XmlBackend::Library && self.has_xml_library() {
                    if let Some(out) = library_xml(&graph, xml_options) {
                        return Ok(out?.into_bytes());
                    }
                }
                Ok(xml::build(&graph, xml_options).into_bytes())
            }
            Format::Yaml => {
                if !self.has_yaml() {
                    return Err(RenderError::unavailable("YAML"));
                }
                Ok(yaml::emit(&self.normalizer.normalize(input))?.into_bytes())
            }
        }
    }

    fn render_text(&self, input: &Value, format: Format) -> Result<String> {
        let rendered = self.render(input, format, &self.options())?;
        String::from_utf8(rendered.body).map_err(|e| RenderError::EncodingFailed(e.to_string()))
    }

    /// Pretty JSON. A string input is treated as JSON text and re-rendered.
    pub fn render_json(&self, input: &Value) -> Result<String> {
        self.render_text(input, Format::Json)
    }

    /// Decode `json` and render it again.
    pub fn render_json_str(&self, json: &str) -> Result<String> {
        self.render_json(&Value::String(json.to_string()))
    }

    /// XML with the instance's backend, root name and CDATA setting.
    pub fn render_xml(&self, input: &Value) -> Result<String> {
        self.render_text(input, Format::Xml)
    }

    /// YAML; fails with a 404-coded error when YAML is unavailable.
    pub fn render_yaml(&self, input: &Value) -> Result<String> {
        self.render_text(input, Format::Yaml)
    }

    /// Native serialize bytes. Objects are written as objects.
    pub fn render_serialized(&self, input: &Value) -> Vec<u8> {
        native::serialize(input)
    }

    /// Render, then emit headers and body through `writer` and terminate it.
    pub fn render_to(
        &self,
        writer: &mut dyn TerminalWriter,
        input: &Value,
        format: Format,
        options: &RenderOptions,
    ) -> Result<()> {
        let rendered = self.render(input, format, options)?;
        writer.header("Content-Type", rendered.content_type())?;
        if rendered.compression.is_compressed() {
            writer.header("Content-Encoding", rendered.tag())?;
        }
        writer.body(&rendered.body)?;
        writer.terminate()?;
        Ok(())
    }

    /// Decode JSON; JSON objects come back as generic objects.
    pub fn parse_json(&self, text: &str) -> Option<Value> {
        json::decode(text).map(|v| self.normalizer.to_object(&v))
    }

    /// Decode JSON; JSON objects come back as mappings.
    pub fn parse_json_graph(&self, text: &str) -> Option<Value> {
        json::decode(text)
    }

    /// Parse XML. Input that starts entity-escaped is unescaped once first.
    ///
    /// With the library unserializer enabled and available the result is
    /// always a graph (mappings when `normalize`, objects otherwise);
    /// otherwise `normalize` picks between the graph view and the raw tree.
    pub fn parse_xml(&self, text: &str, normalize: bool) -> Option<XmlDocument> {
        let trimmed = text.trim_start();
        let unescaped;
        let source = if trimmed.starts_with("&lt;") {
            unescaped = unescape_entities(trimmed);
            unescaped.as_str()
        } else {
            text
        };

        if self.config.use_unserializer && self.has_xml_library() {
            let value = library_unserialize(source)?;
            return Some(XmlDocument::Graph(if normalize {
                value
            } else {
                self.normalizer.to_object(&value)
            }));
        }

        let root = xml::parse(source)?;
        Some(if normalize {
            XmlDocument::Graph(root.to_value())
        } else {
            XmlDocument::Tree(root)
        })
    }

    /// Parse YAML into mappings, or objects when `as_mapping` is false.
    pub fn parse_yaml(&self, text: &str, as_mapping: bool) -> Option<Value> {
        if !self.has_yaml() {
            debug!("yaml parse requested without yaml support");
            return None;
        }
        let value = yaml::parse(text)?;
        Some(if as_mapping {
            value
        } else {
            self.normalizer.to_object(&value)
        })
    }

    /// Parse native serialize bytes.
    pub fn parse_serialized(&self, bytes: &[u8]) -> Option<Value> {
        native::unserialize(bytes)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::probe()
    }
}

#[cfg(feature = "xml-library")]
fn library_xml(graph: &Value, options: &XmlOptions) -> Option<Result<String>> {
    Some(crate::xml_library::serialize(graph, options))
}

#[cfg(not(feature = "xml-library"))]
fn library_xml(_graph: &Value, _options: &XmlOptions) -> Option<Result<String>> {
    None
}

#[cfg(feature = "xml-library")]
fn library_unserialize(text: &str) -> Option<Value> {
    crate::xml_library::unserialize(text)
}

#[cfg(not(feature = "xml-library"))]
fn library_unserialize(_text: &str) -> Option<Value> {
    None
}
