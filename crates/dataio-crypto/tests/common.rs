//! Common test utilities for the crypto integration tests.

#![allow(dead_code)]

use dataio_codec::Capabilities;
use dataio_crypto::{Aes, CryptoConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(EnvFilter::from_default_env())
        .try_init();
}

/// Capabilities with only the modern backend.
pub fn modern_only() -> Capabilities {
    Capabilities::none().with_modern_cipher(true)
}

/// Capabilities with both backends usable.
pub fn both_backends() -> Capabilities {
    modern_only().with_legacy_cipher(true, false)
}

/// A modern-only provider with default configuration.
pub fn modern_aes() -> Aes {
    init_tracing();
    Aes::new(modern_only(), CryptoConfig::default()).expect("modern backend")
}
