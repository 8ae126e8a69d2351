//! Two-tier resolved-media cache with single-flight coalescing.
//!
//! Memory is a small, fast subset view of disk: puts write through to disk
//! first, memory evictions demote back to disk, and a disk hit promotes into
//! memory subject to its budget. Constructed once at process start and passed
//! by reference; there are no global statics.

mod coalesce;
mod disk;
mod memory;

pub(crate) use coalesce::{Flight, FlightOutcome};

use disk::DiskTier;
use glimpse_common::{ResolvedMedia, Result};
use memory::MemoryTier;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::EngineConfig;

/// Point-in-time cache occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Bytes resident in the memory tier.
    pub memory_bytes: u64,
    /// Entries resident in the memory tier.
    pub memory_entries: usize,
    /// Bytes resident in the disk tier.
    pub disk_bytes: u64,
    /// Entries resident in the disk tier.
    pub disk_entries: usize,
}

/// Memory + disk cache for resolved media artifacts.
pub struct CacheManager {
    memory: MemoryTier,
    disk: DiskTier,
    inflight: coalesce::InFlightMap,
}

impl CacheManager {
    /// Build both tiers from the engine configuration.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        Ok(Self {
            memory: MemoryTier::new(config.memory_budget_bytes),
            disk: DiskTier::open(config.disk_root.clone(), config.disk_budget_bytes)?,
            inflight: coalesce::InFlightMap::new(),
        })
    }

    /// Look up a key: memory tier first, then disk with promotion.
    pub fn get(&self, key: &str) -> Option<Arc<ResolvedMedia>> {
        if let Some(media) = self.memory.get(key) {
            debug!(key = %key, tier = "memory", "cache hit");
            return Some(media);
        }

        if let Some((media, size_bytes)) = self.disk.get(key) {
            debug!(key = %key, tier = "disk", "cache hit, promoting");
            let media = Arc::new(media);
            self.demote_victims(self.memory.insert(
                key.to_string(),
                Arc::clone(&media),
                size_bytes,
            ));
            return Some(media);
        }

        debug!(key = %key, "cache miss");
        None
    }

    /// Write-through insert under the artifact's own cache key.
    ///
    /// Disk is written first so memory never holds an artifact the disk tier
    /// does not; memory evictions triggered by the insert are demoted back to
    /// disk if its own eviction dropped them meanwhile.
    pub fn put(&self, media: &ResolvedMedia) -> Result<()> {
        let key = media.cache_key.clone();
        let size_bytes = self.disk.put(&key, media)?;
        let victims = self.memory.insert(key, Arc::new(media.clone()), size_bytes);
        self.demote_victims(victims);
        Ok(())
    }

    /// Force eviction from both tiers.
    pub fn invalidate(&self, key: &str) {
        debug!(key = %key, "invalidating both tiers");
        self.memory.remove(key);
        self.disk.remove(key);
    }

    /// Join (or start) the in-flight fetch for a key.
    pub(crate) fn coalesce(&self, key: &str) -> Flight {
        self.inflight.join(key)
    }

    /// Finish the in-flight fetch for a key, releasing every waiter.
    pub(crate) fn complete(&self, key: &str, outcome: FlightOutcome) {
        self.inflight.complete(key, outcome);
    }

    /// Current occupancy of both tiers.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            memory_bytes: self.memory.resident_bytes(),
            memory_entries: self.memory.len(),
            disk_bytes: self.disk.resident_bytes(),
            disk_entries: self.disk.len(),
        }
    }

    /// Keep memory-evicted artifacts reachable on disk.
    fn demote_victims(&self, victims: Vec<(String, Arc<ResolvedMedia>)>) {
        for (key, media) in victims {
            if self.disk.contains(&key) {
                continue;
            }
            if let Err(e) = self.disk.put(&key, &media) {
                warn!(key = %key, error = %e, "failed to demote evicted entry to disk");
            }
        }
    }
}
