//! Key management for wgcf
//!
//! All three WireGuard key roles share one representation, a 32-byte [`Key`].
//! Private keys are clamped exactly once, when they are generated; keys that
//! come in through [`Key::from_base64`] are taken as-is so relay-supplied and
//! user-imported values round-trip unchanged.
//!
//! Comparisons between keys go through `subtle` and never exit early.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use subtle::{Choice, ConstantTimeEq};
use tracing::debug;
use x25519_dalek::{x25519, X25519_BASEPOINT_BYTES};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::error::KeyError;

/// Length of every curve25519 key in bytes.
pub const KEY_LEN: usize = 32;

/// Raw 32-byte key material.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Key([u8; KEY_LEN]);

impl Key {
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Standard base64 with padding, the form `wg` and the relay use.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Decode a base64 key. Never clamps.
    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        let decoded = Zeroizing::new(
            STANDARD
                .decode(encoded)
                .map_err(|e| KeyError::invalid(format!("not valid base64: {e}")))?,
        );

        let bytes = <[u8; KEY_LEN]>::try_from(decoded.as_slice()).map_err(|_| {
            KeyError::invalid(format!(
                "expected {KEY_LEN} bytes, got {}",
                decoded.len()
            ))
        })?;

        Ok(Self(bytes))
    }

    /// Constant-time check against the all-zero key.
    pub fn is_zero(&self) -> bool {
        self.0[..].ct_eq(&[0u8; KEY_LEN][..]).into()
    }
}

impl ConstantTimeEq for Key {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0[..].ct_eq(&other.0[..])
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for Key {}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key(<redacted>)")
    }
}

impl FromStr for Key {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base64(s)
    }
}

/// Clamp a raw scalar the way the WireGuard reference implementation does.
fn clamp(bytes: &mut [u8; KEY_LEN]) {
    bytes[0] &= 0b1111_1000;
    bytes[31] = (bytes[31] & 0b0111_1111) | 0b0100_0000;
}

/// A device's private key. Owned by the device, never transmitted.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(Key);

impl PrivateKey {
    /// Import an existing private key verbatim.
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(Key::from_bytes(bytes))
    }

    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        Key::from_base64(encoded).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        self.0.as_bytes()
    }

    pub fn to_base64(&self) -> String {
        self.0.to_base64()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Scalar multiplication of this key against the curve25519 base point.
    pub fn public_key(&self) -> PublicKey {
        let scalar = Zeroizing::new(*self.0.as_bytes());
        PublicKey(Key::from_bytes(x25519(*scalar, X25519_BASEPOINT_BYTES)))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key().to_base64())
            .finish()
    }
}

impl FromStr for PrivateKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base64(s)
    }
}

/// A public key, either derived locally or supplied by a peer.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(Key);

impl PublicKey {
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(Key::from_bytes(bytes))
    }

    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        Key::from_base64(encoded).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        self.0.as_bytes()
    }

    pub fn to_base64(&self) -> String {
        self.0.to_base64()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_base64()).finish()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base64(s)
    }
}

/// Optional symmetric key shared between both ends of a tunnel.
#[derive(Clone, PartialEq, Eq)]
pub struct PresharedKey(Key);

impl PresharedKey {
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(Key::from_bytes(bytes))
    }

    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        Key::from_base64(encoded).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        self.0.as_bytes()
    }

    pub fn to_base64(&self) -> String {
        self.0.to_base64()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Debug for PresharedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PresharedKey(<redacted>)")
    }
}

impl FromStr for PresharedKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base64(s)
    }
}

/// Generates fresh key material from a cryptographically secure source.
pub struct KeyManager<R = OsRng> {
    rng: R,
}

impl KeyManager<OsRng> {
    pub fn new() -> Self {
        Self { rng: OsRng }
    }
}

impl Default for KeyManager<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore + CryptoRng> KeyManager<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    fn random_bytes(&mut self) -> Result<Zeroizing<[u8; KEY_LEN]>, KeyError> {
        let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
        self.rng
            .try_fill_bytes(&mut bytes[..])
            .map_err(|e| KeyError::EntropyFailure(e.to_string()))?;
        Ok(bytes)
    }

    /// Generate a new clamped private key.
    pub fn generate_private_key(&mut self) -> Result<PrivateKey, KeyError> {
        let mut bytes = self.random_bytes()?;
        clamp(&mut bytes);
        debug!("generated private key");
        Ok(PrivateKey::from_bytes(*bytes))
    }

    /// Generate a preshared key. Preshared keys are not clamped.
    pub fn generate_preshared_key(&mut self) -> Result<PresharedKey, KeyError> {
        let bytes = self.random_bytes()?;
        debug!("generated preshared key");
        Ok(PresharedKey::from_bytes(*bytes))
    }
}
