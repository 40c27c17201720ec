use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default upstream API root. Request paths are appended to it.
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://api.alchemer.com/v5/";

/// Proxy service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Whether to allow LAN access
    /// - false: only local access 127.0.0.1 (default)
    /// - true: bind 0.0.0.0
    #[serde(default)]
    pub allow_lan_access: bool,

    /// Listening port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upstream API root, must end with `/`
    #[serde(default = "default_upstream_base_url")]
    pub upstream_base_url: String,

    /// Upstream request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Maximum accepted inbound body size (bytes)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Outbound proxy configuration
    #[serde(default)]
    pub upstream_proxy: UpstreamProxyConfig,

    /// Directory for the rolling log file. Console only when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

/// Outbound proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpstreamProxyConfig {
    /// Whether enabled
    pub enabled: bool,
    /// Proxy address (http://, https://, socks5://)
    pub url: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            allow_lan_access: false,
            port: default_port(),
            upstream_base_url: default_upstream_base_url(),
            request_timeout: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
            upstream_proxy: UpstreamProxyConfig::default(),
            log_dir: None,
        }
    }
}

fn default_port() -> u16 {
    8045
}

fn default_upstream_base_url() -> String {
    DEFAULT_UPSTREAM_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

impl ProxyConfig {
    /// Get the actual listening address
    /// - allow_lan_access = false: "127.0.0.1"
    /// - allow_lan_access = true: "0.0.0.0"
    pub fn get_bind_address(&self) -> &str {
        if self.allow_lan_access {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        }
    }
}
