//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → wait for response headers (bounded by the route timeout)
//!     → stream body (optionally bounded by timeouts.rs idle timer)
//! ```
//!
//! # Design Decisions
//! - Exactly one upstream attempt per request; the proxy cannot know whether
//!   the upstream call was idempotent, so nothing is retried here
//! - Timeouts are non-negotiable for the header wait; the body may be long-lived

pub mod timeouts;
