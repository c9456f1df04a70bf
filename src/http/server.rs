//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler on every path
//! - Wire up middleware (request ID, tracing)
//! - Resolve each request against the routing table
//! - Hand matched requests to the forwarder
//! - Serve until the shutdown broadcast fires

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::{ConfigError, ProxyConfig};
use crate::http::forwarder::Forwarder;
use crate::http::request::request_id;
use crate::net::RelayTracker;
use crate::observability::metrics;
use crate::routing::{Router as ProxyRouter, RoutingTable};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: ProxyRouter,
    pub forwarder: Forwarder,
    pub default_timeout: Duration,
}

/// HTTP server for the reverse proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    tracker: RelayTracker,
}

impl HttpServer {
    /// Build the routing table and the service stack.
    ///
    /// Fails on any routing-table error, before a socket is touched.
    pub fn new(config: ProxyConfig) -> Result<Self, ConfigError> {
        let table = RoutingTable::load(&config.routes)?;
        let tracker = RelayTracker::new();

        let state = AppState {
            router: ProxyRouter::new(table),
            forwarder: Forwarder::new(&config.timeouts, tracker.clone()),
            default_timeout: config.timeouts.upstream_headers(),
        };

        let router = Self::build_router(state);
        Ok(Self {
            router,
            config,
            tracker,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        request_id = %request_id(request),
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::x_request_id());

        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(middleware)
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, routes = self.config.routes.len(), "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// In-flight relay counter shared with the forwarder.
    pub fn tracker(&self) -> RelayTracker {
        self.tracker.clone()
    }
}

/// Main proxy handler.
/// Looks up the route and forwards the request to its upstream.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let matched = match state.router.resolve(&path) {
        Ok(matched) => matched,
        Err(no_route) => {
            tracing::debug!(path = %path, "No route matched");
            metrics::record_request(method.as_str(), 404, "none", start_time);
            return no_route.into_response();
        }
    };

    let route = matched.route.clone();
    let timeout = route.options.timeout.unwrap_or(state.default_timeout);

    tracing::debug!(
        prefix = %route.prefix,
        upstream = %route.target,
        forward_path = %matched.forward_path,
        "Route matched"
    );

    match state.forwarder.relay(request, &matched, timeout).await {
        Ok(response) => {
            metrics::record_request(
                method.as_str(),
                response.status().as_u16(),
                route.prefix.as_str(),
                start_time,
            );
            response
        }
        Err(err) => {
            tracing::warn!(
                prefix = %route.prefix,
                upstream = %route.target,
                error = %err,
                "Upstream request failed"
            );
            metrics::record_upstream_error(err.kind(), route.prefix.as_str());
            metrics::record_request(
                method.as_str(),
                err.status().as_u16(),
                route.prefix.as_str(),
                start_time,
            );
            err.into_response()
        }
    }
}
