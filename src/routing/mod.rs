//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → table.rs (validate prefixes and upstream origins, reject duplicates)
//!     → Freeze as immutable RoutingTable
//!
//! Incoming Request (path)
//!     → router.rs (longest-prefix lookup)
//!     → matcher.rs (segment-aligned prefix test)
//!     → Return: RouteMatch or NoRouteFound
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod router;
pub mod table;

pub use router::{resolve, NoRouteFound, RouteMatch, Router};
pub use table::{Route, RouteOptions, RoutingTable, UpstreamAddress};
