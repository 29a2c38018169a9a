//! Compression adapter behaviour across capability sets.

use dataio_codec::error::ERR_FEATURE_UNAVAILABLE;
use dataio_codec::{Capabilities, CompressionKind, Compressor};

fn sample() -> Vec<u8> {
    br#"{"a":{"nextLevel":{"arrayLevel":"part 1","nextLevel":{"recursiveLevel":"yes"}}}}"#
        .repeat(20)
}

#[test]
fn test_every_probed_kind_roundtrips() {
    let compressor = Compressor::new(Capabilities::probe());
    let data = sample();
    for kind in CompressionKind::ALL {
        if !compressor.supports(kind) {
            continue;
        }
        let packed = compressor.compress(&data, kind, 6).unwrap();
        assert!(packed.len() < data.len(), "{:?} did not shrink", kind);
        assert_eq!(compressor.decompress(&packed, kind).unwrap(), data);
    }
}

#[test]
fn test_missing_bzip2_is_404() {
    let compressor = Compressor::new(Capabilities::none());
    assert!(!compressor.supports(CompressionKind::Bzip2));
    assert!(compressor.supports(CompressionKind::Gzip));
    let err = compressor
        .compress(b"x", CompressionKind::Bzip2, 9)
        .unwrap_err();
    assert_eq!(err.code(), ERR_FEATURE_UNAVAILABLE);
    let err = compressor
        .decompress(b"x", CompressionKind::Bzip2)
        .unwrap_err();
    assert_eq!(err.code(), ERR_FEATURE_UNAVAILABLE);
}

#[test]
fn test_best_compression_skips_unsupported() {
    let compressor = Compressor::new(Capabilities::none());
    let best = compressor
        .best_compression(&sample(), &[CompressionKind::Bzip2, CompressionKind::Gzip])
        .unwrap();
    assert_eq!(best.kind, CompressionKind::Gzip);
    assert!((1..=9).contains(&best.level));
    assert_eq!(
        compressor.decompress(&best.data, best.kind).unwrap(),
        sample()
    );
}

#[test]
fn test_best_compression_without_candidates_is_identity() {
    let compressor = Compressor::new(Capabilities::none());
    let best = compressor.best_compression(b"abc", &[]).unwrap();
    assert_eq!(best.kind, CompressionKind::None);
    assert_eq!(best.data, b"abc");
}

#[test]
fn test_base64_framing() {
    let compressor = Compressor::new(Capabilities::none());
    let text = compressor
        .compress_base64(&sample(), CompressionKind::Gzip, 9)
        .unwrap();
    assert!(!text.contains('=') && !text.contains('+') && !text.contains('/'));
    assert_eq!(
        compressor
            .decompress_base64(&text, CompressionKind::Gzip)
            .unwrap(),
        sample()
    );
}

#[test]
fn test_tags_roundtrip() {
    for kind in CompressionKind::ALL {
        assert_eq!(CompressionKind::from_tag(kind.tag()), Some(kind));
    }
    assert_eq!(CompressionKind::from_tag("rar"), None);
}
