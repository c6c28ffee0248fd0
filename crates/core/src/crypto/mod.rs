//! Cryptography module for wgcf
//!
//! Curve25519 key material in the shape WireGuard expects: clamped private
//! scalars, derived public keys, preshared keys and their base64 wire form.

pub mod error;
pub mod keys;

pub use error::KeyError;
pub use keys::*;
