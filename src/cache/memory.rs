//! Byte-budgeted in-memory cache tier.
//!
//! Strict LRU over a sharded map: every get stamps the entry with a
//! monotonic counter, eviction removes the lowest stamp until the tier is
//! back under budget. Evicted entries are returned to the caller so the
//! manager can make sure the disk tier still holds them.

use dashmap::DashMap;
use glimpse_common::ResolvedMedia;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

struct MemoryEntry {
    media: Arc<ResolvedMedia>,
    size_bytes: u64,
    last_access: u64,
}

/// In-memory cache tier with a strict byte budget.
pub(crate) struct MemoryTier {
    entries: DashMap<String, MemoryEntry>,
    budget_bytes: u64,
    resident_bytes: AtomicU64,
    clock: AtomicU64,
    // Eviction needs a consistent view across map shards.
    evict_lock: parking_lot::Mutex<()>,
}

impl MemoryTier {
    pub fn new(budget_bytes: u64) -> Self {
        Self {
            entries: DashMap::new(),
            budget_bytes,
            resident_bytes: AtomicU64::new(0),
            clock: AtomicU64::new(0),
            evict_lock: parking_lot::Mutex::new(()),
        }
    }

    /// Fetch an entry, refreshing its LRU stamp.
    pub fn get(&self, key: &str) -> Option<Arc<ResolvedMedia>> {
        self.entries.get_mut(key).map(|mut entry| {
            entry.last_access = self.clock.fetch_add(1, Ordering::Relaxed);
            Arc::clone(&entry.media)
        })
    }

    /// Insert an entry and evict until the tier is under budget.
    ///
    /// Returns the evicted entries, least recent first. An entry larger than
    /// the whole budget is never admitted.
    pub fn insert(
        &self,
        key: String,
        media: Arc<ResolvedMedia>,
        size_bytes: u64,
    ) -> Vec<(String, Arc<ResolvedMedia>)> {
        if size_bytes > self.budget_bytes {
            debug!(key = %key, size_bytes, "entry exceeds memory budget, disk only");
            return Vec::new();
        }

        let stamp = self.clock.fetch_add(1, Ordering::Relaxed);
        let entry = MemoryEntry {
            media,
            size_bytes,
            last_access: stamp,
        };
        if let Some(old) = self.entries.insert(key, entry) {
            self.resident_bytes.fetch_sub(old.size_bytes, Ordering::Relaxed);
        }
        self.resident_bytes.fetch_add(size_bytes, Ordering::Relaxed);

        let mut evicted = Vec::new();
        let _guard = self.evict_lock.lock();
        while self.resident_bytes.load(Ordering::Relaxed) > self.budget_bytes {
            let victim = self
                .entries
                .iter()
                .min_by_key(|entry| entry.last_access)
                .map(|entry| entry.key().clone());

            match victim {
                Some(victim_key) => {
                    if let Some((victim_key, entry)) = self.entries.remove(&victim_key) {
                        self.resident_bytes.fetch_sub(entry.size_bytes, Ordering::Relaxed);
                        debug!(key = %victim_key, "evicting from memory tier");
                        evicted.push((victim_key, entry.media));
                    }
                }
                None => break,
            }
        }
        evicted
    }

    /// Remove an entry outright.
    pub fn remove(&self, key: &str) {
        if let Some((_, entry)) = self.entries.remove(key) {
            self.resident_bytes.fetch_sub(entry.size_bytes, Ordering::Relaxed);
        }
    }

    /// Bytes currently resident.
    pub fn resident_bytes(&self) -> u64 {
        self.resident_bytes.load(Ordering::Relaxed)
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
