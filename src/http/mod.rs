//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → routing (longest-prefix lookup) ── no match → 404
//!     → forwarder.rs (one upstream attempt, header timeout)
//!         → request.rs (path rewrite, header hygiene)
//!         → response.rs (stream body back, map errors to 502/504)
//!     → Send to client
//! ```

pub mod forwarder;
pub mod request;
pub mod response;
pub mod server;

pub use forwarder::Forwarder;
pub use request::X_REQUEST_ID;
pub use response::ProxyError;
pub use server::HttpServer;
