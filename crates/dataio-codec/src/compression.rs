//! gzip, bzip2, Zstd and LZ4 compression with selectable levels

use crate::capabilities::Capabilities;
use crate::error::{CodecError, Result};
use crate::strings::{base64url_decode, base64url_encode};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use tracing::debug;

/// Highest accepted compression level. Levels are clamped to `0..=MAX_LEVEL`.
pub const MAX_LEVEL: u32 = 9;

/// Compression algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CompressionKind {
    /// No compression (passthrough)
    #[default]
    None,
    /// gzip (RFC 1952) framing around deflate
    Gzip,
    /// bzip2 block-sorting compression
    Bzip2,
    /// Zstandard
    Zstd,
    /// LZ4 block with prepended size
    Lz4,
}

impl CompressionKind {
    /// Every kind that actually compresses, in preference order.
    pub const ALL: [CompressionKind; 4] = [
        CompressionKind::Gzip,
        CompressionKind::Bzip2,
        CompressionKind::Zstd,
        CompressionKind::Lz4,
    ];

    /// Short discriminator tag identifying the algorithm that produced a payload.
    pub fn tag(&self) -> &'static str {
        match self {
            CompressionKind::None => "",
            CompressionKind::Gzip => "gz",
            CompressionKind::Bzip2 => "bz2",
            CompressionKind::Zstd => "zst",
            CompressionKind::Lz4 => "lz4",
        }
    }

    /// Inverse of [`CompressionKind::tag`].
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "" => Some(CompressionKind::None),
            "gz" => Some(CompressionKind::Gzip),
            "bz2" => Some(CompressionKind::Bzip2),
            "zst" => Some(CompressionKind::Zstd),
            "lz4" => Some(CompressionKind::Lz4),
            _ => None,
        }
    }

    /// Returns true if this kind actually compresses data.
    pub fn is_compressed(&self) -> bool {
        !matches!(self, CompressionKind::None)
    }

    /// MIME type of a payload compressed with this kind.
    pub fn content_type(&self) -> &'static str {
        match self {
            CompressionKind::None => "application/octet-stream",
            CompressionKind::Gzip => "application/gzip",
            CompressionKind::Bzip2 => "application/x-bzip2",
            CompressionKind::Zstd => "application/zstd",
            CompressionKind::Lz4 => "application/x-lz4",
        }
    }

    fn uses_level(&self) -> bool {
        matches!(
            self,
            CompressionKind::Gzip | CompressionKind::Bzip2 | CompressionKind::Zstd
        )
    }
}

/// A compressed payload together with how it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compressed {
    /// Algorithm used
    pub kind: CompressionKind,
    /// Level used (0 for kinds without levels)
    pub level: u32,
    /// Compressed bytes
    pub data: Vec<u8>,
}

/// Compression adapter bound to a capability set.
#[derive(Debug, Clone)]
pub struct Compressor {
    caps: Capabilities,
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new(Capabilities::probe())
    }
}

impl Compressor {
    /// Create a compressor that honors the given capabilities.
    pub fn new(caps: Capabilities) -> Self {
        Self { caps }
    }

    /// True if `kind` can be used with this build and capability set.
    pub fn supports(&self, kind: CompressionKind) -> bool {
        match kind {
            CompressionKind::None | CompressionKind::Gzip => true,
            CompressionKind::Bzip2 => self.caps.has_bzip2 && cfg!(feature = "bzip2"),
            CompressionKind::Zstd => self.caps.has_zstd && cfg!(feature = "zstd"),
            CompressionKind::Lz4 => self.caps.has_lz4 && cfg!(feature = "lz4"),
        }
    }

    fn require(&self, kind: CompressionKind) -> Result<()> {
        if self.supports(kind) {
            Ok(())
        } else {
            Err(CodecError::unavailable(format!("{:?} compression", kind)))
        }
    }

    /// Compress `data` with `kind` at `level` (clamped to 0..=9).
    pub fn compress(&self, data: &[u8], kind: CompressionKind, level: u32) -> Result<Vec<u8>> {
        self.require(kind)?;
        let level = level.min(MAX_LEVEL);
        let out = match kind {
            CompressionKind::None => data.to_vec(),
            CompressionKind::Gzip => gzip_encode(data, level)?,
            CompressionKind::Bzip2 => bzip2_encode(data, level)?,
            CompressionKind::Zstd => zstd_encode(data, level)?,
            CompressionKind::Lz4 => lz4_encode(data)?,
        };
        debug!(
            kind = kind.tag(),
            level,
            original = data.len(),
            compressed = out.len(),
            "payload compressed"
        );
        Ok(out)
    }

    /// Decompress data using the algorithm that was used for compression.
    pub fn decompress(&self, data: &[u8], kind: CompressionKind) -> Result<Vec<u8>> {
        self.require(kind)?;
        match kind {
            CompressionKind::None => Ok(data.to_vec()),
            CompressionKind::Gzip => gzip_decode(data),
            CompressionKind::Bzip2 => bzip2_decode(data),
            CompressionKind::Zstd => zstd_decode(data),
            CompressionKind::Lz4 => lz4_decode(data),
        }
    }

    /// Try every supported candidate at every level and keep the smallest
    /// output. Ties keep the earliest candidate and the lowest level.
    pub fn best_compression(
        &self,
        data: &[u8],
        candidates: &[CompressionKind],
    ) -> Result<Compressed> {
        let mut best: Option<Compressed> = None;
        for &kind in candidates.iter().filter(|k| self.supports(**k)) {
            let levels = if kind.uses_level() { 1..=MAX_LEVEL } else { 0..=0 };
            for level in levels {
                let out = self.compress(data, kind, level)?;
                if best.as_ref().map_or(true, |b| out.len() < b.data.len()) {
                    best = Some(Compressed {
                        kind,
                        level,
                        data: out,
                    });
                }
            }
        }
        let best = best.unwrap_or_else(|| Compressed {
            kind: CompressionKind::None,
            level: 0,
            data: data.to_vec(),
        });
        debug!(
            kind = best.kind.tag(),
            level = best.level,
            size = best.data.len(),
            "best compression selected"
        );
        Ok(best)
    }

    /// Compress and frame the result as base64url text.
    pub fn compress_base64(&self, data: &[u8], kind: CompressionKind, level: u32) -> Result<String> {
        Ok(base64url_encode(&self.compress(data, kind, level)?))
    }

    /// Inverse of [`Compressor::compress_base64`].
    pub fn decompress_base64(&self, text: &str, kind: CompressionKind) -> Result<Vec<u8>> {
        self.decompress(&base64url_decode(text)?, kind)
    }
}

fn gzip_encode(data: &[u8], level: u32) -> Result<Vec<u8>> {
    let mut encoder =
        flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::new(level));
    encoder
        .write_all(data)
        .map_err(|e| CodecError::CompressionFailed(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| CodecError::CompressionFailed(e.to_string()))
}

fn gzip_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    flate2::read::GzDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| CodecError::DecompressionFailed(e.to_string()))?;
    Ok(out)
}

#[cfg(feature = "bzip2")]
fn bzip2_encode(data: &[u8], level: u32) -> Result<Vec<u8>> {
    // bzip2 block sizes run 1..=9; level 0 maps to the smallest block.
    let mut encoder =
        bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::new(level.max(1)));
    encoder
        .write_all(data)
        .map_err(|e| CodecError::CompressionFailed(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| CodecError::CompressionFailed(e.to_string()))
}

#[cfg(feature = "bzip2")]
fn bzip2_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    bzip2::read::BzDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| CodecError::DecompressionFailed(e.to_string()))?;
    Ok(out)
}

#[cfg(not(feature = "bzip2"))]
fn bzip2_encode(_data: &[u8], _level: u32) -> Result<Vec<u8>> {
    Err(CodecError::unavailable("Bzip2 compression"))
}

#[cfg(not(feature = "bzip2"))]
fn bzip2_decode(_data: &[u8]) -> Result<Vec<u8>> {
    Err(CodecError::unavailable("Bzip2 compression"))
}

#[cfg(feature = "zstd")]
fn zstd_encode(data: &[u8], level: u32) -> Result<Vec<u8>> {
    // Zstd level 0 means "library default"; keep 0..=9 monotonic instead.
    zstd::encode_all(data, level.max(1) as i32)
        .map_err(|e| CodecError::CompressionFailed(e.to_string()))
}

#[cfg(feature = "zstd")]
fn zstd_decode(data: &[u8]) -> Result<Vec<u8>> {
    zstd::decode_all(data).map_err(|e| CodecError::DecompressionFailed(e.to_string()))
}

#[cfg(not(feature = "zstd"))]
fn zstd_encode(_data: &[u8], _level: u32) -> Result<Vec<u8>> {
    Err(CodecError::unavailable("Zstd compression"))
}

#[cfg(not(feature = "zstd"))]
fn zstd_decode(_data: &[u8]) -> Result<Vec<u8>> {
    Err(CodecError::unavailable("Zstd compression"))
}

#[cfg(feature = "lz4")]
fn lz4_encode(data: &[u8]) -> Result<Vec<u8>> {
    Ok(lz4_flex::compress_prepend_size(data))
}

#[cfg(feature = "lz4")]
fn lz4_decode(data: &[u8]) -> Result<Vec<u8>> {
    lz4_flex::decompress_size_prepended(data)
        .map_err(|e| CodecError::DecompressionFailed(e.to_string()))
}

#[cfg(not(feature = "lz4"))]
fn lz4_encode(_data: &[u8]) -> Result<Vec<u8>> {
    Err(CodecError::unavailable("Lz4 compression"))
}

#[cfg(not(feature = "lz4"))]
fn lz4_decode(_data: &[u8]) -> Result<Vec<u8>> {
    Err(CodecError::unavailable("Lz4 compression"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ERR_FEATURE_UNAVAILABLE;
    use proptest::prelude::*;

    fn compressor() -> Compressor {
        Compressor::new(Capabilities::probe())
    }

    proptest! {
        #[test]
        fn prop_gzip_roundtrip_all_levels(
            data in prop::collection::vec(0u8..=255, 0..20_000),
            level in 0u32..=9,
        ) {
            let c = compressor();
            let packed = c.compress(&data, CompressionKind::Gzip, level).unwrap();
            prop_assert_eq!(c.decompress(&packed, CompressionKind::Gzip).unwrap(), data);
        }

        #[test]
        fn prop_bzip2_roundtrip_all_levels(
            data in prop::collection::vec(0u8..=255, 0..20_000),
            level in 0u32..=9,
        ) {
            let c = compressor();
            prop_assume!(c.supports(CompressionKind::Bzip2));
            let packed = c.compress(&data, CompressionKind::Bzip2, level).unwrap();
            prop_assert_eq!(c.decompress(&packed, CompressionKind::Bzip2).unwrap(), data);
        }

        #[test]
        fn prop_none_roundtrip(data in prop::collection::vec(0u8..=255, 0..10_000)) {
            let c = compressor();
            let packed = c.compress(&data, CompressionKind::None, 9).unwrap();
            prop_assert_eq!(&packed, &data);
        }
    }

    #[test]
    fn hello_world_gzip() {
        let c = compressor();
        let packed = c.compress(b"Hello World", CompressionKind::Gzip, 9).unwrap();
        assert!(!packed.is_empty());
        assert_eq!(&packed[..2], &[0x1f, 0x8b]);
        assert_eq!(
            c.decompress(&packed, CompressionKind::Gzip).unwrap(),
            b"Hello World"
        );
    }

    #[test]
    fn empty_roundtrips() {
        let c = compressor();
        for kind in CompressionKind::ALL {
            if !c.supports(kind) {
                continue;
            }
            let packed = c.compress(&[], kind, 5).unwrap();
            assert_eq!(c.decompress(&packed, kind).unwrap(), b"");
        }
    }

    #[test]
    fn missing_bzip2_is_feature_unavailable() {
        let c = Compressor::new(Capabilities::probe().with_bzip2(false));
        assert!(!c.supports(CompressionKind::Bzip2));
        let err = c
            .compress(b"Hello world", CompressionKind::Bzip2, 9)
            .unwrap_err();
        assert_eq!(err.code(), ERR_FEATURE_UNAVAILABLE);
    }

    #[test]
    fn tags_roundtrip() {
        for kind in [CompressionKind::None]
            .into_iter()
            .chain(CompressionKind::ALL)
        {
            assert_eq!(CompressionKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(CompressionKind::Gzip.tag(), "gz");
        assert_eq!(CompressionKind::Bzip2.tag(), "bz2");
        assert_eq!(CompressionKind::from_tag("rar"), None);
    }

    #[test]
    fn levels_above_nine_are_clamped() {
        let c = compressor();
        let a = c.compress(b"aaaaaaaaaaaaaaaa", CompressionKind::Gzip, 9).unwrap();
        let b = c.compress(b"aaaaaaaaaaaaaaaa", CompressionKind::Gzip, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn best_compression_picks_smallest() {
        let c = compressor();
        let data = b"abcabcabcabcabcabcabcabcabcabcabcabcabcabcabcabc".repeat(50);
        let best = c.best_compression(&data, &CompressionKind::ALL).unwrap();
        assert!(best.kind.is_compressed());
        assert!(best.data.len() < data.len());
        for kind in CompressionKind::ALL.into_iter().filter(|k| c.supports(*k)) {
            let single = c.best_compression(&data, &[kind]).unwrap();
            assert!(best.data.len() <= single.data.len());
        }
        assert_eq!(c.decompress(&best.data, best.kind).unwrap(), data);
    }

    #[test]
    fn best_compression_without_candidates_is_passthrough() {
        let c = compressor();
        let best = c.best_compression(b"xyz", &[]).unwrap();
        assert_eq!(best.kind, CompressionKind::None);
        assert_eq!(best.data, b"xyz");
    }

    #[test]
    fn base64_helpers_roundtrip() {
        let c = compressor();
        let text = c
            .compress_base64(b"Hello World", CompressionKind::Gzip, 6)
            .unwrap();
        assert!(text.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'));
        assert_eq!(
            c.decompress_base64(&text, CompressionKind::Gzip).unwrap(),
            b"Hello World"
        );
    }

    #[test]
    fn corrupt_gzip_fails() {
        let c = compressor();
        let err = c
            .decompress(b"definitely not gzip", CompressionKind::Gzip)
            .unwrap_err();
        assert!(matches!(err, CodecError::DecompressionFailed(_)));
    }
}
