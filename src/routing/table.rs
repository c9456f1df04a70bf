//! The routing table: validated `prefix -> upstream` bindings.
//!
//! # Design Decisions
//! - Built once by `RoutingTable::load`; never mutated afterwards, so it is
//!   shared across request tasks without locks
//! - Insertion order from the configuration is preserved
//! - Every check happens at load time; nothing is re-validated per request

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::uri::Authority;
use url::Url;

use crate::config::{ConfigError, RouteConfig};
use crate::routing::matcher::PathPrefixMatcher;

/// An upstream HTTP origin. The authority always carries an explicit port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamAddress {
    authority: Authority,
}

impl UpstreamAddress {
    /// Parse and validate an origin such as `http://localhost:5000`.
    ///
    /// Only plain `http` origins are accepted, without credentials, path,
    /// query or fragment. The error is a human-readable reason.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let url = Url::parse(raw).map_err(|e| e.to_string())?;

        if url.scheme() != "http" {
            return Err(format!("unsupported scheme '{}'", url.scheme()));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err("credentials are not allowed".to_string());
        }
        if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
            return Err("an origin must not carry a path, query or fragment".to_string());
        }
        let host = url.host_str().ok_or_else(|| "missing host".to_string())?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| "missing port".to_string())?;
        let authority = Authority::from_str(&format!("{host}:{port}")).map_err(|e| e.to_string())?;

        Ok(Self { authority })
    }

    /// `host:port`, used for the request URI and for `Host` rewriting.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }
}

impl std::fmt::Display for UpstreamAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "http://{}", self.authority)
    }
}

/// Per-route forwarding behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteOptions {
    /// Forward `/prefix/rest` as `/rest`.
    pub strip_prefix: bool,
    /// Wait for response headers; `None` uses the server default.
    pub timeout: Option<Duration>,
    /// Send the upstream authority as `Host`.
    pub rewrite_host: bool,
    /// Add `X-Forwarded-*` headers.
    pub forwarded_headers: bool,
}

/// A validated route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub prefix: PathPrefixMatcher,
    pub target: UpstreamAddress,
    pub options: RouteOptions,
}

impl Route {
    fn from_config(config: &RouteConfig) -> Result<Self, ConfigError> {
        let prefix =
            PathPrefixMatcher::new(&config.prefix).ok_or_else(|| ConfigError::InvalidPrefix {
                prefix: config.prefix.clone(),
            })?;

        let target =
            UpstreamAddress::parse(&config.upstream).map_err(|reason| ConfigError::InvalidTarget {
                prefix: config.prefix.clone(),
                upstream: config.upstream.clone(),
                reason,
            })?;

        Ok(Self {
            prefix,
            target,
            options: RouteOptions {
                strip_prefix: config.strip_prefix,
                timeout: config.timeout_ms.map(Duration::from_millis),
                rewrite_host: config.rewrite_host,
                forwarded_headers: config.forwarded_headers,
            },
        })
    }
}

/// Ordered, immutable set of routes.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: Vec<Arc<Route>>,
}

impl RoutingTable {
    /// Validate `routes` and build the table, failing on the first bad entry.
    pub fn load(routes: &[RouteConfig]) -> Result<Self, ConfigError> {
        let mut seen = HashSet::with_capacity(routes.len());
        let mut table = Vec::with_capacity(routes.len());

        for config in routes {
            let route = Route::from_config(config)?;
            if !seen.insert(route.prefix.clone()) {
                return Err(ConfigError::DuplicatePrefix {
                    prefix: route.prefix.to_string(),
                });
            }
            table.push(Arc::new(route));
        }

        Ok(Self { routes: table })
    }

    /// Routes in configuration order.
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }
}
