//! Header hygiene for proxied traffic.
//!
//! # Design Decisions
//! - Applied to every forwarded request and every relayed response
//! - No authentication or rate limiting; this proxy is a development tool

pub mod headers;
