//! Time-boxed configuration cache
//!
//! Process-wide caches (prompt catalog, verified outbound numbers) share
//! this component: a single cached value with a TTL, an injectable clock so
//! staleness windows are testable without waiting real time, and a
//! force-refresh hook for admin mutations.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// Clock abstraction so tests can advance time manually.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock implementation used in production.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct Entry<T> {
    value: T,
    refreshed_at: Instant,
}

/// Single-value cache with a fixed TTL.
///
/// Readers may observe data up to one TTL window stale; writers call
/// [`TtlCache::invalidate`] to force the next read to refresh.
pub struct TtlCache<T> {
    entry: RwLock<Option<Entry<T>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entry: RwLock::new(None),
            ttl,
            clock,
        }
    }

    /// Return the cached value if it is still within its TTL.
    pub fn get(&self) -> Option<T> {
        let guard = self.entry.read();
        let entry = guard.as_ref()?;
        if self.clock.now().duration_since(entry.refreshed_at) > self.ttl {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Store a freshly loaded value, restarting its TTL window.
    pub fn put(&self, value: T) {
        *self.entry.write() = Some(Entry {
            value,
            refreshed_at: self.clock.now(),
        });
    }

    /// Drop the cached value so the next read refreshes immediately.
    pub fn invalidate(&self) {
        *self.entry.write() = None;
    }

    /// Whether a read right now would need a refresh.
    pub fn is_stale(&self) -> bool {
        self.get().is_none()
    }
}
