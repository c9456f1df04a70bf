//! Network resource accounting.
//!
//! # Data Flow
//! ```text
//! Upstream exchange starts
//!     → connection.rs (RelayTracker::track hands out a RelayGuard)
//!     → guard rides inside the relayed response body
//!     → body finished, failed or dropped by the caller → slot released
//! ```
//!
//! Connection pooling itself is owned by the hyper-util client; this
//! module only counts what is in use.

pub mod connection;

pub use connection::{RelayGuard, RelayId, RelayTracker};
