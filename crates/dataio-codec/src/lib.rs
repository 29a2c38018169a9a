#![warn(missing_docs)]

//! dataio codec layer: base64url/UTF-8 string codec, compression, capability probing
//!
//! Leaf crate shared by the cipher provider (base64url framing of ciphertext)
//! and the format renderer (UTF-8 coercion, output compression).

pub mod capabilities;
pub mod compression;
pub mod config;
pub mod error;
pub mod strings;

pub use capabilities::Capabilities;
pub use compression::{Compressed, CompressionKind, Compressor};
pub use config::load_config;
pub use error::CodecError;
pub use strings::{base64url_decode, base64url_encode, ensure_utf8};
