//! # Cooldown Cache
//!
//! Per-key cooldown gate for provider polling.
//!
//! The first call for a key (or the first after its window lapsed) is
//! admitted and opens a window of fixed length; calls inside the window are
//! refused. State is in memory only and is lost on restart.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use shared_types::TimeSource;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Expired entries are swept once the map grows past this size.
const SWEEP_THRESHOLD: usize = 4_096;

/// Time-indexed cooldown cache with fixed TTL.
pub struct CooldownCache<K: Eq + Hash + Clone> {
    /// Key to window expiry (ms since epoch).
    windows: DashMap<K, u64>,
    ttl_millis: u64,
    clock: Arc<dyn TimeSource>,
}

impl<K: Eq + Hash + Clone> CooldownCache<K> {
    pub fn new(ttl: Duration, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            windows: DashMap::new(),
            ttl_millis: ttl.as_millis() as u64,
            clock,
        }
    }

    /// Admit `key` if it is outside its window, opening a new window.
    pub fn allow(&self, key: &K) -> bool {
        if self.windows.len() > SWEEP_THRESHOLD {
            self.purge_expired();
        }

        let now = self.clock.now_millis();
        match self.windows.entry(key.clone()) {
            Entry::Occupied(mut window) => {
                if *window.get() > now {
                    return false;
                }
                window.insert(now + self.ttl_millis);
                true
            }
            Entry::Vacant(slot) => {
                slot.insert(now + self.ttl_millis);
                true
            }
        }
    }

    /// Milliseconds left in `key`'s window, if one is open.
    pub fn remaining(&self, key: &K) -> Option<u64> {
        let now = self.clock.now_millis();
        self.windows
            .get(key)
            .and_then(|expiry| expiry.checked_sub(now))
            .filter(|left| *left > 0)
    }

    /// Drop lapsed windows.
    pub fn purge_expired(&self) {
        let now = self.clock.now_millis();
        let before = self.windows.len();
        self.windows.retain(|_, expiry| *expiry > now);
        debug!(
            removed = before.saturating_sub(self.windows.len()),
            "[pp-02] Purged expired cooldown windows"
        );
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
