//! In-flight relay tracking.
//!
//! # Responsibilities
//! - Count upstream exchanges that are still holding a connection
//! - Generate unique relay IDs for tracing
//! - Release the slot as soon as the response body is finished or dropped
//!
//! The guard travels inside the relayed response body, so a caller that
//! disconnects mid-stream drops the body, the guard and the upstream
//! connection together.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Global atomic counter for relay IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static RELAY_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for one upstream exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelayId(u64);

impl RelayId {
    /// Generate a new unique relay ID.
    pub fn new() -> Self {
        Self(RELAY_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for RelayId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RelayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "relay-{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Shared {
    active: AtomicU64,
    idle: Notify,
}

/// Counts in-flight relays. Cheap to clone; clones share the count.
#[derive(Debug, Clone, Default)]
pub struct RelayTracker {
    shared: Arc<Shared>,
}

impl RelayTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new relay. The returned guard releases it on drop.
    pub fn track(&self) -> RelayGuard {
        let active = self.shared.active.fetch_add(1, Ordering::SeqCst) + 1;
        crate::observability::metrics::record_inflight(active);
        RelayGuard {
            shared: Arc::clone(&self.shared),
            id: RelayId::new(),
        }
    }

    /// Current number of in-flight relays.
    pub fn active_count(&self) -> u64 {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Resolve once no relay is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            if self.active_count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Keeps one relay counted for as long as it lives.
#[derive(Debug)]
pub struct RelayGuard {
    shared: Arc<Shared>,
    id: RelayId,
}

impl RelayGuard {
    pub fn id(&self) -> RelayId {
        self.id
    }
}

impl Drop for RelayGuard {
    fn drop(&mut self) {
        let active = self.shared.active.fetch_sub(1, Ordering::SeqCst) - 1;
        crate::observability::metrics::record_inflight(active);
        if active == 0 {
            self.shared.idle.notify_waiters();
        }
        tracing::trace!(relay_id = %self.id, "Relay released");
    }
}
