#![warn(missing_docs)]

//! dataio render: graph normalization and format rendering
//!
//! A [`Value`] graph is normalized by [`Normalizer`] and rendered by
//! [`Renderer`] as pretty JSON, XML (simple builder or the quick-xml
//! backend), YAML or native serialize text, optionally compressed through
//! [`dataio_codec::Compressor`]. Each format has a parser returning `None`
//! on malformed input.

pub mod config;
pub mod error;
pub mod json;
pub mod native;
pub mod normalizer;
pub mod renderer;
pub mod terminal;
pub mod value;
pub mod xml;
#[cfg(feature = "xml-library")]
pub mod xml_library;
pub mod yaml;

pub use config::RenderConfig;
pub use error::{RenderError, Result};
pub use normalizer::Normalizer;
pub use renderer::{Format, RenderOptions, Rendered, Renderer, XmlDocument};
pub use terminal::{BufferedTerminal, StdoutTerminal, TerminalWriter};
pub use value::{Mapping, Object, Value, GENERIC_CLASS};
pub use xml::{SoapEnvelope, XmlBackend, XmlElement, XmlOptions};
