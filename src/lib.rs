//! prefix-proxy: a development reverse proxy with a static routing table.
//!
//! Requests whose path falls under a configured prefix are relayed to that
//! prefix's upstream origin; everything else gets a 404.
//!
//! ```text
//!  caller ──▶ http::server ──▶ routing::Router ──▶ http::Forwarder ──▶ upstream
//!                 ▲                  │ no match                  │
//!                 └──── 404 ◀────────┘                           │
//!                 └──── streamed response / 502 / 504 ◀──────────┘
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
