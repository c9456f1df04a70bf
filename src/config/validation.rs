//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, bind address parses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Prefix and upstream checks live in `RoutingTable::load`, which runs
//!   before the server accepts traffic

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("no routes configured")]
    NoRoutes,

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("route '{0}' has a zero timeout_ms")]
    ZeroRouteTimeout(String),

    #[error("observability.log_level '{0}' is not a valid filter")]
    LogLevel(String),

    #[error("invalid observability.metrics_address '{0}'")]
    MetricsAddress(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.routes.is_empty() {
        errors.push(ValidationError::NoRoutes);
    }

    if config.timeouts.upstream_headers_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream_headers_ms"));
    }
    if config.timeouts.connect_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_ms"));
    }

    for route in &config.routes {
        if route.timeout_ms == Some(0) {
            errors.push(ValidationError::ZeroRouteTimeout(route.prefix.clone()));
        }
    }

    if config
        .observability
        .log_level
        .parse::<tracing_subscriber::EnvFilter>()
        .is_err()
    {
        errors.push(ValidationError::LogLevel(config.observability.log_level.clone()));
    }

    // Only checked when the exporter will actually bind it.
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
