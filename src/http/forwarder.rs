//! Upstream forwarding.
//!
//! # Responsibilities
//! - Own the pooled upstream client (connection reuse keyed by origin)
//! - Send exactly one upstream request per inbound request
//! - Bound the wait for response headers and classify failures
//!
//! # Design Decisions
//! - No retries: the forwarder cannot know whether the upstream call was
//!   idempotent, so retrying belongs to the caller. This includes the
//!   client's own resend of requests canceled on a closing pooled connection
//! - Dropping the in-flight future (timeout, caller gone) drops the
//!   upstream connection with it

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::config::TimeoutConfig;
use crate::http::request::prepare_upstream_request;
use crate::http::response::{prepare_client_response, ProxyError};
use crate::net::RelayTracker;
use crate::routing::RouteMatch;

/// HTTP client type for forwarding requests.
pub type HttpClient = Client<HttpConnector, Body>;

/// Relays requests to upstream origins.
#[derive(Clone)]
pub struct Forwarder {
    client: HttpClient,
    body_idle: Option<Duration>,
    tracker: RelayTracker,
}

impl Forwarder {
    pub fn new(timeouts: &TimeoutConfig, tracker: RelayTracker) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeouts.connect()));
        connector.set_nodelay(true);

        // A request handed to a pooled connection that closes under it fails
        // as 502 rather than being resent on a fresh connection.
        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(timeouts.pool_idle())
            .retry_canceled_requests(false)
            .build(connector);

        Self {
            client,
            body_idle: timeouts.body_idle(),
            tracker,
        }
    }

    /// Forward `request` to the matched route's upstream.
    ///
    /// `timeout` bounds the wait for response headers only. On success the
    /// response body streams from upstream as the caller reads it.
    pub async fn relay(
        &self,
        request: Request<Body>,
        matched: &RouteMatch,
        timeout: Duration,
    ) -> Result<Response<Body>, ProxyError> {
        let route = &matched.route;
        let upstream_request = prepare_upstream_request(request, matched)?;
        let guard = self.tracker.track();

        tracing::debug!(
            relay_id = %guard.id(),
            upstream = %route.target,
            uri = %upstream_request.uri(),
            "Forwarding request"
        );

        let response = match tokio::time::timeout(timeout, self.client.request(upstream_request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(source)) => {
                return Err(ProxyError::UpstreamUnavailable {
                    upstream: route.target.to_string(),
                    source,
                })
            }
            Err(_) => {
                return Err(ProxyError::UpstreamTimeout {
                    upstream: route.target.to_string(),
                    timeout,
                })
            }
        };

        tracing::debug!(
            relay_id = %guard.id(),
            status = %response.status(),
            "Upstream responded"
        );

        Ok(prepare_client_response(
            response,
            guard,
            self.body_idle,
            route.prefix.as_str(),
        ))
    }
}
