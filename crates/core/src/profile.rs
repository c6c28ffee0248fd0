//! WireGuard profile rendering
//!
//! A profile is a single `[Interface]` section followed by a single `[Peer]`
//! section. Field values are substituted verbatim; checking addresses and
//! endpoints is left to whoever builds the [`ProfileData`].

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::profile::{
    ADDRESS_V4_PREFIX, ADDRESS_V6_PREFIX, ALLOWED_IPS, DNS_SERVERS, MTU,
};
use crate::crypto::PrivateKey;
use crate::relay::DeviceConfig;

/// Everything that varies between rendered profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileData {
    /// Base64 private key of this device
    pub private_key: String,
    /// Assigned IPv4 address, without prefix length
    pub address_1: String,
    /// Assigned IPv6 address, without prefix length
    pub address_2: String,
    /// Base64 public key of the relay's server
    pub public_key: String,
    /// `host:port` of the relay's server
    pub endpoint: String,
}

impl ProfileData {
    /// Combine a locally held private key with the relay's view of the device.
    pub fn new(private_key: &PrivateKey, device: &DeviceConfig) -> Self {
        Self {
            private_key: private_key.to_base64(),
            address_1: device.address_v4.clone(),
            address_2: device.address_v6.clone(),
            public_key: device.peer_public_key.clone(),
            endpoint: device.endpoint.clone(),
        }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ProfileData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[Interface]")?;
        writeln!(f, "PrivateKey = {}", self.private_key)?;
        writeln!(
            f,
            "Address = {}/{}, {}/{}",
            self.address_1, ADDRESS_V4_PREFIX, self.address_2, ADDRESS_V6_PREFIX
        )?;
        writeln!(f, "DNS = {}", DNS_SERVERS.join(", "))?;
        writeln!(f, "MTU = {}", MTU)?;
        writeln!(f)?;
        writeln!(f, "[Peer]")?;
        writeln!(f, "PublicKey = {}", self.public_key)?;
        writeln!(f, "AllowedIPs = {}", ALLOWED_IPS.join(", "))?;
        writeln!(f, "Endpoint = {}", self.endpoint)
    }
}

/// Render a profile. Pure; cannot fail.
pub fn render(data: &ProfileData) -> String {
    data.render()
}

/// Write a rendered profile, readable and writable by the owner only.
pub fn write_profile(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    crate::files::write_private(path, contents)?;
    info!(path = %path.display(), "wrote profile");
    Ok(())
}
