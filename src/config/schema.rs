//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the request pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// The single authoritative hostname all traffic is normalized to.
    /// Empty disables host enforcement (scheme enforcement still applies).
    pub canonical_host: String,

    /// The authoritative scheme, compared against `X-Forwarded-Proto`.
    pub canonical_scheme: String,

    /// Locale codes recognized as language-hint subdomains of the
    /// canonical host (e.g. `fr.example.com`).
    pub locales: Vec<String>,

    /// Include the exception's debug representation in 500 bodies.
    /// Never enable in production.
    pub show_tracebacks: bool,

    /// Listener configuration for the demo server binary.
    pub listener: ListenerConfig,

    /// Edge-proxy header contracts.
    pub proxy: ProxyHeadersConfig,

    /// Rate limiting for unsafe methods.
    pub rate_limit: RateLimitConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            canonical_host: String::new(),
            canonical_scheme: "https".to_string(),
            locales: Vec::new(),
            show_tracebacks: false,
            listener: ListenerConfig::default(),
            proxy: ProxyHeadersConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Names of the headers the edge proxy stamps onto forwarded requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyHeadersConfig {
    /// Header whose absence marks a request as having bypassed the proxy.
    pub trusted_header: String,

    /// Geo header carrying the client's country code.
    pub geo_header: String,
}

impl Default for ProxyHeadersConfig {
    fn default() -> Self {
        Self {
            trusted_header: "Cf-Connecting-Ip".to_string(),
            geo_header: "Cf-Ipcountry".to_string(),
        }
    }
}

/// Windowed-counter rate limit applied to non-GET/HEAD requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Hits allowed per identity within one window.
    pub max_hits: u32,

    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_hits: 10,
            window_secs: 10,
        }
    }
}
