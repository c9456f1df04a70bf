//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Origin of the backend compute service in the reference setup.
pub const DEFAULT_UPSTREAM: &str = "http://localhost:5000";

/// Prefixes forwarded to the backend in the reference setup.
pub const DEFAULT_PREFIXES: [&str; 5] = ["/predict", "/features", "/cluster", "/health", "/history"];

/// Root configuration for the reverse proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Route definitions mapping path prefixes to upstream origins.
    pub routes: Vec<RouteConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            routes: DEFAULT_PREFIXES
                .iter()
                .map(|prefix| RouteConfig::new(*prefix, DEFAULT_UPSTREAM))
                .collect(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:5173").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5173".to_string(),
        }
    }
}

/// A single `prefix -> upstream` binding.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Path prefix to match on whole segments (e.g., "/predict").
    pub prefix: String,

    /// Upstream origin (e.g., "http://localhost:5000").
    pub upstream: String,

    /// Wait for upstream response headers, overriding `timeouts.upstream_headers_ms`.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Remove the matched prefix from the forwarded path.
    #[serde(default)]
    pub strip_prefix: bool,

    /// Send the upstream authority as `Host` instead of the caller's.
    #[serde(default)]
    pub rewrite_host: bool,

    /// Add `X-Forwarded-For`, `X-Forwarded-Proto` and `X-Forwarded-Host`.
    #[serde(default)]
    pub forwarded_headers: bool,
}

impl RouteConfig {
    /// A route with every option at its default.
    pub fn new(prefix: impl Into<String>, upstream: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            upstream: upstream.into(),
            timeout_ms: None,
            strip_prefix: false,
            rewrite_host: false,
            forwarded_headers: false,
        }
    }
}

/// Timeout and pooling configuration for upstream traffic.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Default wait for upstream response headers in milliseconds.
    pub upstream_headers_ms: u64,

    /// TCP connect timeout in milliseconds.
    pub connect_ms: u64,

    /// Abort a response body that stalls this long. 0 disables it.
    pub body_idle_ms: u64,

    /// How long idle pooled upstream connections are kept, in seconds.
    pub pool_idle_secs: u64,
}

impl TimeoutConfig {
    pub fn upstream_headers(&self) -> Duration {
        Duration::from_millis(self.upstream_headers_ms)
    }

    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    pub fn body_idle(&self) -> Option<Duration> {
        (self.body_idle_ms > 0).then(|| Duration::from_millis(self.body_idle_ms))
    }

    pub fn pool_idle(&self) -> Duration {
        Duration::from_secs(self.pool_idle_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            upstream_headers_ms: 30_000,
            connect_ms: 5_000,
            body_idle_ms: 0,
            pool_idle_secs: 90,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_reference_table() {
        let config = ProxyConfig::default();
        let prefixes: Vec<&str> = config.routes.iter().map(|r| r.prefix.as_str()).collect();
        assert_eq!(prefixes, DEFAULT_PREFIXES);
        assert!(config.routes.iter().all(|r| r.upstream == DEFAULT_UPSTREAM));
        assert!(config.routes.iter().all(|r| !r.strip_prefix));
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config: ProxyConfig = toml::from_str("").unwrap();
        assert_eq!(config.routes.len(), 5);
        assert_eq!(config.timeouts.upstream_headers_ms, 30_000);
        assert_eq!(config.timeouts.body_idle(), None);
    }

    #[test]
    fn parse_route_options() {
        let doc = r#"
[listener]
bind_address = "0.0.0.0:3000"

[timeouts]
body_idle_ms = 1500

[observability]
log_format = "json"

[[routes]]
prefix = "/api"
upstream = "http://127.0.0.1:8080"
timeout_ms = 250
strip_prefix = true
"#;
        let config: ProxyConfig = toml::from_str(doc).unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
        assert_eq!(config.timeouts.body_idle(), Some(Duration::from_millis(1500)));
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.routes.len(), 1);
        let route = &config.routes[0];
        assert_eq!(route.timeout_ms, Some(250));
        assert!(route.strip_prefix);
        assert!(!route.rewrite_host);
    }
}
