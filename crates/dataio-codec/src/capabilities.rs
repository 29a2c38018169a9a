//! Runtime capability probing.
//!
//! Optional codecs, formats and cipher backends are compiled in through cargo
//! features. [`Capabilities::probe`] reads the feature set once; components take
//! a `Capabilities` value instead of checking for features on their own, so tests
//! can inject any combination.

use serde::{Deserialize, Serialize};

/// Optional platform features available to the dataio components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// The modern (AES) cipher backend is present
    pub has_modern_cipher: bool,
    /// The legacy (Rijndael-256) cipher backend is present
    pub has_legacy_cipher: bool,
    /// The legacy backend is present but the deployment has retired it
    pub legacy_cipher_retired: bool,
    /// bzip2 compression is available
    pub has_bzip2: bool,
    /// Zstandard compression is available
    pub has_zstd: bool,
    /// LZ4 compression is available
    pub has_lz4: bool,
    /// YAML emission and parsing is available
    pub has_yaml: bool,
    /// The library-based XML serializer/unserializer is available
    pub has_xml_library: bool,
}

impl Capabilities {
    /// Probe the compiled feature set.
    pub fn probe() -> Self {
        Self {
            has_modern_cipher: true,
            has_legacy_cipher: cfg!(feature = "legacy-cipher"),
            legacy_cipher_retired: false,
            has_bzip2: cfg!(feature = "bzip2"),
            has_zstd: cfg!(feature = "zstd"),
            has_lz4: cfg!(feature = "lz4"),
            has_yaml: cfg!(feature = "yaml"),
            has_xml_library: cfg!(feature = "xml-library"),
        }
    }

    /// A capability set with every optional feature switched off.
    pub fn none() -> Self {
        Self {
            has_modern_cipher: false,
            has_legacy_cipher: false,
            legacy_cipher_retired: false,
            has_bzip2: false,
            has_zstd: false,
            has_lz4: false,
            has_yaml: false,
            has_xml_library: false,
        }
    }

    /// True when the legacy backend exists and has not been retired.
    pub fn legacy_cipher_usable(&self) -> bool {
        self.has_legacy_cipher && !self.legacy_cipher_retired
    }

    /// Builder-style override of the modern cipher flag.
    pub fn with_modern_cipher(mut self, present: bool) -> Self {
        self.has_modern_cipher = present;
        self
    }

    /// Builder-style override of the legacy cipher flags.
    pub fn with_legacy_cipher(mut self, present: bool, retired: bool) -> Self {
        self.has_legacy_cipher = present;
        self.legacy_cipher_retired = retired;
        self
    }

    /// Builder-style override of the bzip2 flag.
    pub fn with_bzip2(mut self, present: bool) -> Self {
        self.has_bzip2 = present;
        self
    }

    /// Builder-style override of the YAML flag.
    pub fn with_yaml(mut self, present: bool) -> Self {
        self.has_yaml = present;
        self
    }

    /// Builder-style override of the XML library flag.
    pub fn with_xml_library(mut self, present: bool) -> Self {
        self.has_xml_library = present;
        self
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::probe()
    }
}
