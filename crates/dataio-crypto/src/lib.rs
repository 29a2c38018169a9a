#![warn(missing_docs)]

//! dataio crypto: symmetric cipher provider and password generator
//!
//! [`Aes`] selects between a modern AES backend and a legacy Rijndael-256
//! backend from a [`dataio_codec::Capabilities`] value, derives key material
//! from caller strings, and frames ciphertext as base64url.
//! [`PasswordGenerator`] produces random strings under a [`PasswordPolicy`].

pub mod aes;
pub mod config;
pub mod crypto;
pub mod derivation;
pub mod error;
pub mod legacy;
pub mod modern;
pub mod password;

pub use aes::{Aes, CipherBackend};
pub use config::CryptoConfig;
pub use crypto::Crypto;
pub use derivation::{CipherKeyMaterial, KeyDerivation};
pub use error::{CryptoError, Result};
pub use password::{CharacterClasses, PasswordGenerator, PasswordPolicy};
