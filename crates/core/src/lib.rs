//! wgcf Core Library
//!
//! WireGuard key material and profile rendering for devices provisioned
//! against the relay's API.

pub mod config;
pub mod constants;
pub mod crypto;
mod files;
pub mod profile;
pub mod relay;

// Re-export important types for easier access
pub use config::{AccountConfig, ConfigError};
pub use crypto::{Key, KeyError, KeyManager, PresharedKey, PrivateKey, PublicKey, KEY_LEN};
pub use profile::{render, write_profile, ProfileData};
pub use relay::{find_device, BoundDevice, DeviceConfig, RegisterRequest, RelayClientConfig, RelayError};
