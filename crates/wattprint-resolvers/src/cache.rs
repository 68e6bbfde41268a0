//! TTL cache with an injectable clock
//!
//! Every resolver shares the same cache shape: lazily populated per
//! normalized key, entries valid for a fixed TTL, process lifetime, no
//! per-entry eviction beyond an administrative full clear. Concurrent
//! misses for the same key may each re-fetch; upstream reads are
//! idempotent and last write wins.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Cache validity shared by all resolvers
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Source of "now", injected so tests can control expiry deterministically
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> SystemTime;
}

/// Production clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Manually advanced clock for deterministic cache tests
#[derive(Debug)]
pub struct ManualClock {
    now: parking_lot::Mutex<SystemTime>,
}

impl ManualClock {
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: parking_lot::Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock()
    }
}

/// A cached value with its fetch timestamp
#[derive(Debug, Clone)]
struct CachedEntry<V> {
    value: V,
    fetched_at: SystemTime,
}

/// Key-value cache whose entries expire strictly after `ttl`
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CachedEntry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Get the value for `key` if present and unexpired
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        let age = self
            .clock
            .now()
            .duration_since(entry.fetched_at)
            .unwrap_or(Duration::ZERO);
        if age < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Insert or overwrite the value for `key`, stamped with the current time
    pub fn insert(&self, key: K, value: V) {
        let entry = CachedEntry {
            value,
            fetched_at: self.clock.now(),
        };
        self.entries.write().insert(key, entry);
    }

    /// Administrative full clear
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of entries, expired or not
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
