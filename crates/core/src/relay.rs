//! Boundary types for the relay's provisioning API
//!
//! The HTTP transport lives elsewhere. This module holds the values it
//! exchanges with the rest of wgcf: the device list the relay reports, the
//! tunnel configuration it hands back after registration, and the client
//! settings a transport must present.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::relay::{
    API_BASE_URL, CLIENT_VERSION, CONTENT_TYPE, TLS_MAX_VERSION, USER_AGENT,
};
use crate::crypto::PublicKey;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("device not found in list: {0}")]
    DeviceNotFound(String),
}

/// A device bound to an account, as listed by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundDevice {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub model: String,
    pub role: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub created: String,
    pub activated: String,
    pub active: bool,
}

/// Find a device by id. The returned reference points into `devices`.
pub fn find_device<'a>(
    devices: &'a mut [BoundDevice],
    device_id: &str,
) -> Result<&'a mut BoundDevice, RelayError> {
    devices
        .iter_mut()
        .find(|d| d.id == device_id)
        .ok_or_else(|| RelayError::DeviceNotFound(device_id.to_string()))
}

/// Tunnel parameters the relay assigns to a registered device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub peer_public_key: String,
    pub endpoint: String,
    pub address_v4: String,
    pub address_v6: String,
}

/// Registration payload: the only key material that ever leaves the device.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub key: String,
    pub install_id: String,
    pub fcm_token: String,
    pub tos: String,
    pub model: String,
    pub r#type: String,
    pub locale: String,
}

impl RegisterRequest {
    pub fn new(public_key: &PublicKey, model: impl Into<String>, tos: impl Into<String>) -> Self {
        Self {
            key: public_key.to_base64(),
            install_id: String::new(),
            fcm_token: String::new(),
            tos: tos.into(),
            model: model.into(),
            r#type: "Android".to_string(),
            locale: "en_US".to_string(),
        }
    }
}

/// Settings an HTTP transport applies to every request it sends to the relay.
///
/// Built once and passed explicitly to whatever performs the requests; there
/// is no shared "current client".
#[derive(Clone, PartialEq, Eq)]
pub struct RelayClientConfig {
    base_url: String,
    access_token: Option<String>,
    tls_max_version: &'static str,
}

impl RelayClientConfig {
    /// Client for calls made before a device is registered.
    pub fn unauthenticated() -> Self {
        Self {
            base_url: API_BASE_URL.to_string(),
            access_token: None,
            tls_max_version: TLS_MAX_VERSION,
        }
    }

    /// Client that authenticates with the device's access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            ..Self::unauthenticated()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tls_max_version(&self) -> &str {
        self.tls_max_version
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// URL for an API path such as `reg` or `reg/{id}/account`.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Headers in the order the mobile client sends them.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("User-Agent", USER_AGENT.to_string()),
            ("CF-Client-Version", CLIENT_VERSION.to_string()),
            ("Content-Type", CONTENT_TYPE.to_string()),
        ];
        if let Some(token) = &self.access_token {
            headers.push(("Authorization", format!("Bearer {token}")));
        }
        headers
    }
}

impl std::fmt::Debug for RelayClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayClientConfig")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.is_authenticated())
            .field("tls_max_version", &self.tls_max_version)
            .finish()
    }
}
