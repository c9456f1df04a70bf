//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Look up the route for a request path
//! - Compute the path to forward (prefix stripped when the route asks)
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan (acceptable for typical route counts)
//! - Longest prefix wins; equal lengths keep the first inserted route
//! - Explicit NoRouteFound rather than silent default

use std::sync::Arc;

use thiserror::Error;

use crate::routing::table::{Route, RoutingTable};

/// No configured prefix covers the request path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no route for path '{path}'")]
pub struct NoRouteFound {
    pub path: String,
}

/// A resolved route together with the path to send upstream.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    pub forward_path: String,
}

/// Select the route for `path` by segment-aligned longest-prefix match.
pub fn resolve(table: &RoutingTable, path: &str) -> Result<RouteMatch, NoRouteFound> {
    let mut best: Option<&Arc<Route>> = None;

    for route in table.routes() {
        if !route.prefix.matches(path) {
            continue;
        }
        let longer = best.map_or(true, |b| route.prefix.as_str().len() > b.prefix.as_str().len());
        if longer {
            best = Some(route);
        }
    }

    let route = best.ok_or_else(|| NoRouteFound {
        path: path.to_string(),
    })?;

    let forward_path = if route.options.strip_prefix {
        route.prefix.strip(path).to_string()
    } else {
        path.to_string()
    };

    Ok(RouteMatch {
        route: Arc::clone(route),
        forward_path,
    })
}

/// Router over a shared, immutable routing table.
#[derive(Debug, Clone)]
pub struct Router {
    table: Arc<RoutingTable>,
}

impl Router {
    pub fn new(table: RoutingTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    /// Find the route for a request path.
    pub fn resolve(&self, path: &str) -> Result<RouteMatch, NoRouteFound> {
        resolve(&self.table, path)
    }
}
