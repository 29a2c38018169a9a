//! Renderer instance defaults

use crate::xml::{XmlBackend, DEFAULT_ROOT};
use dataio_codec::compression::MAX_LEVEL;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Defaults held by a [`crate::renderer::Renderer`] across calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Level used when a call does not name one (0-9)
    pub compression_level: u32,
    /// Preferred XML backend
    pub xml_backend: XmlBackend,
    /// Wrap XML leaf text in CDATA
    pub cdata: bool,
    /// Parse XML with the library unserializer when it is available
    pub use_unserializer: bool,
    /// XML document element name
    pub root_name: String,
    /// Normalize containers through a JSON round trip
    pub json_roundtrip: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            compression_level: MAX_LEVEL,
            xml_backend: XmlBackend::Library,
            cdata: false,
            use_unserializer: false,
            root_name: DEFAULT_ROOT.to_string(),
            json_roundtrip: false,
        }
    }
}

impl RenderConfig {
    /// Load from a `.toml` or `.json` file. Missing fields take defaults.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        dataio_codec::load_config(path)
    }
}
