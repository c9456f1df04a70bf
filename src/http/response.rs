//! Response handling and transformation.
//!
//! # Responsibilities
//! - Relay the upstream response to the caller as a stream
//! - Strip hop-by-hop headers from the upstream response
//! - Map upstream failures to client-facing status codes
//!
//! # Design Decisions
//! - Frames are forwarded as they arrive; nothing buffers the whole body
//! - Upstream timeouts result in 504, unreachable upstreams in 502
//! - No route is a plain 404 with an empty body
//! - A failure after headers were sent truncates the response; it is never
//!   retried or patched up

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{Response, StatusCode};
use axum::response::IntoResponse;
use axum::BoxError;
use hyper::body::{Body as HttpBody, Frame, Incoming, SizeHint};
use thiserror::Error;

use crate::net::RelayGuard;
use crate::resilience::timeouts::IdleTimeoutBody;
use crate::routing::NoRouteFound;
use crate::security::headers::strip_hop_by_hop;

/// Per-request upstream failure. Never fatal to the process.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("upstream {upstream} sent no response headers within {timeout:?}")]
    UpstreamTimeout { upstream: String, timeout: Duration },

    #[error("upstream {upstream} unavailable: {source}")]
    UpstreamUnavailable {
        upstream: String,
        source: hyper_util::client::legacy::Error,
    },

    #[error("cannot build upstream request: {0}")]
    InvalidRequest(#[from] axum::http::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::UpstreamTimeout { .. } => "timeout",
            ProxyError::UpstreamUnavailable { .. } => "unavailable",
            ProxyError::InvalidRequest(_) => "invalid_request",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> axum::response::Response {
        let message = match &self {
            ProxyError::UpstreamTimeout { .. } => "Upstream timed out",
            ProxyError::UpstreamUnavailable { .. } => "Upstream unavailable",
            ProxyError::InvalidRequest(_) => "Bad request",
        };
        (self.status(), message).into_response()
    }
}

impl IntoResponse for NoRouteFound {
    fn into_response(self) -> axum::response::Response {
        StatusCode::NOT_FOUND.into_response()
    }
}

/// Upstream body as sent to the caller.
///
/// Holds the relay guard, so dropping the body (caller gone) releases the
/// upstream connection and the in-flight slot together.
#[derive(Debug)]
pub struct RelayBody {
    inner: IdleTimeoutBody<Incoming>,
    guard: RelayGuard,
    route: String,
}

impl HttpBody for RelayBody {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        if let Poll::Ready(Some(Err(e))) = &polled {
            tracing::warn!(
                relay_id = %this.guard.id(),
                route = %this.route,
                error = %e,
                "Upstream body interrupted; truncating response"
            );
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Convert the upstream response into the one returned to the caller.
pub fn prepare_client_response(
    response: Response<Incoming>,
    guard: RelayGuard,
    body_idle: Option<Duration>,
    route: &str,
) -> Response<Body> {
    let (mut parts, incoming) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);

    let body = RelayBody {
        inner: IdleTimeoutBody::new(incoming, body_idle),
        guard,
        route: route.to_string(),
    };
    Response::from_parts(parts, Body::new(body))
}
