//! Request handling and transformation.
//!
//! # Responsibilities
//! - Request ID generation and propagation (`x-request-id`)
//! - Rewrite the inbound request into its upstream form
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing, and forwarded upstream
//! - Method, body and end-to-end headers pass through untouched
//! - The query string always survives path rewriting

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::uri::Scheme;
use axum::http::{Request, Uri, Version};

use crate::http::response::ProxyError;
use crate::routing::RouteMatch;
use crate::security::headers::{append_forwarded, strip_hop_by_hop};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// The request ID set by `SetRequestIdLayer`, or `"-"` outside the stack.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}

/// Turn an inbound request into the request sent to the matched upstream.
pub fn prepare_upstream_request(
    request: Request<Body>,
    matched: &RouteMatch,
) -> Result<Request<Body>, ProxyError> {
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let (mut parts, body) = request.into_parts();
    let route = &matched.route;

    let path_and_query = match parts.uri.query() {
        Some(query) => format!("{}?{}", matched.forward_path, query),
        None => matched.forward_path.clone(),
    };
    parts.uri = Uri::builder()
        .scheme(Scheme::HTTP)
        .authority(route.target.authority().clone())
        .path_and_query(path_and_query)
        .build()?;

    // The pooled client speaks HTTP/1.1 upstream whatever the caller used.
    parts.version = Version::HTTP_11;
    parts.extensions.clear();

    strip_hop_by_hop(&mut parts.headers);
    if route.options.forwarded_headers {
        append_forwarded(&mut parts.headers, client_ip);
    }
    if route.options.rewrite_host {
        let host = HeaderValue::from_str(route.target.authority().as_str())
            .map_err(axum::http::Error::from)?;
        parts.headers.insert(header::HOST, host);
    }

    Ok(Request::from_parts(parts, body))
}
