//! Global constants for wgcf

/// Fixed values baked into every rendered WireGuard profile
pub mod profile {
    /// Resolvers written to the `DNS =` line, IPv4 first
    pub const DNS_SERVERS: [&str; 4] = [
        "1.1.1.1",
        "1.0.0.1",
        "2606:4700:4700::1111",
        "2606:4700:4700::1001",
    ];

    /// Interface MTU; leaves room for the relay's encapsulation overhead
    pub const MTU: u16 = 1280;

    /// Route all IPv4 and IPv6 traffic through the tunnel
    pub const ALLOWED_IPS: [&str; 2] = ["0.0.0.0/0", "::/0"];

    /// Prefix length appended to the assigned IPv4 address
    pub const ADDRESS_V4_PREFIX: u8 = 32;

    /// Prefix length appended to the assigned IPv6 address
    pub const ADDRESS_V6_PREFIX: u8 = 128;

    /// Default output file name
    pub const DEFAULT_FILE_NAME: &str = "wgcf-profile.conf";
}

/// Account configuration store
pub mod account {
    /// Default account file name, resolved against the working directory
    pub const DEFAULT_FILE_NAME: &str = "wgcf-account.toml";

    /// Prefix for environment variable overrides (`WGCF_DEVICE_ID`, ...)
    pub const ENV_PREFIX: &str = "WGCF_";
}

/// Values the relay expects a client to present
pub mod relay {
    pub const API_BASE_URL: &str = "https://api.cloudflareclient.com/v0a1922";
    pub const DEFAULT_ENDPOINT: &str = "engage.cloudflareclient.com:2408";

    pub const USER_AGENT: &str = "okhttp/3.12.1";
    pub const CLIENT_VERSION: &str = "a-6.3-1922";
    pub const CONTENT_TYPE: &str = "application/json; charset=UTF-8";

    /// Highest TLS version the transport may negotiate
    pub const TLS_MAX_VERSION: &str = "1.2";
}
