//! Disk-backed cache tier.
//!
//! One JSON file per cache key under a root directory, written atomically
//! via temp-file-then-rename so readers never observe a partial artifact.
//! The tier keeps its own byte budget and LRU index; the index is rebuilt
//! from a directory scan at startup, oldest files seeded as least recent.

use dashmap::DashMap;
use glimpse_common::{Error, ResolvedMedia, Result};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

const ENTRY_EXTENSION: &str = "json";

struct DiskIndexEntry {
    size_bytes: u64,
    last_access: u64,
}

/// Disk cache tier with an in-process LRU index.
pub(crate) struct DiskTier {
    root: PathBuf,
    budget_bytes: u64,
    index: DashMap<String, DiskIndexEntry>,
    resident_bytes: AtomicU64,
    clock: AtomicU64,
    evict_lock: parking_lot::Mutex<()>,
}

impl DiskTier {
    /// Open (or create) the tier rooted at `root`, indexing existing files.
    pub fn open(root: PathBuf, budget_bytes: u64) -> Result<Self> {
        std::fs::create_dir_all(&root)?;

        let tier = Self {
            root,
            budget_bytes,
            index: DashMap::new(),
            resident_bytes: AtomicU64::new(0),
            clock: AtomicU64::new(0),
            evict_lock: parking_lot::Mutex::new(()),
        };
        tier.scan_existing()?;
        Ok(tier)
    }

    /// Read an artifact, refreshing its LRU stamp.
    ///
    /// A file that fails to read or parse is dropped from the tier; a cached
    /// file that exists must be complete and valid.
    pub fn get(&self, key: &str) -> Option<(ResolvedMedia, u64)> {
        let size_bytes = {
            let mut entry = self.index.get_mut(key)?;
            entry.last_access = self.clock.fetch_add(1, Ordering::Relaxed);
            entry.size_bytes
        };

        let path = self.path_for(key);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key = %key, error = %e, "disk entry unreadable, dropping");
                self.remove(key);
                return None;
            }
        };

        match serde_json::from_slice::<ResolvedMedia>(&bytes) {
            Ok(media) => Some((media, size_bytes)),
            Err(e) => {
                warn!(key = %key, error = %e, "disk entry corrupt, dropping");
                self.remove(key);
                None
            }
        }
    }

    /// Write an artifact atomically, then evict until under budget.
    pub fn put(&self, key: &str, media: &ResolvedMedia) -> Result<u64> {
        let bytes = serde_json::to_vec(media)
            .map_err(|e| Error::io(format!("failed to serialize cache entry: {e}")))?;
        let size_bytes = bytes.len() as u64;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(&bytes)?;
        tmp.persist(self.path_for(key)).map_err(|e| Error::from(e.error))?;

        let stamp = self.clock.fetch_add(1, Ordering::Relaxed);
        let entry = DiskIndexEntry {
            size_bytes,
            last_access: stamp,
        };
        if let Some(old) = self.index.insert(key.to_string(), entry) {
            self.resident_bytes.fetch_sub(old.size_bytes, Ordering::Relaxed);
        }
        self.resident_bytes.fetch_add(size_bytes, Ordering::Relaxed);

        self.evict_over_budget();
        Ok(size_bytes)
    }

    /// Whether the tier currently holds the key.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Remove an artifact and its file.
    pub fn remove(&self, key: &str) {
        if let Some((_, entry)) = self.index.remove(key) {
            self.resident_bytes.fetch_sub(entry.size_bytes, Ordering::Relaxed);
        }
        if let Err(e) = std::fs::remove_file(self.path_for(key)) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(key = %key, error = %e, "failed to remove disk entry");
            }
        }
    }

    /// Bytes currently resident.
    pub fn resident_bytes(&self) -> u64 {
        self.resident_bytes.load(Ordering::Relaxed)
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{ENTRY_EXTENSION}"))
    }

    fn evict_over_budget(&self) {
        let _guard = self.evict_lock.lock();
        while self.resident_bytes.load(Ordering::Relaxed) > self.budget_bytes {
            let victim = self
                .index
                .iter()
                .min_by_key(|entry| entry.last_access)
                .map(|entry| entry.key().clone());

            match victim {
                Some(victim_key) => {
                    debug!(key = %victim_key, "evicting from disk tier");
                    self.remove(&victim_key);
                }
                None => break,
            }
        }
    }

    /// Index files already present under the root, oldest-modified first so
    /// they line up at the cold end of the LRU order.
    fn scan_existing(&self) -> Result<()> {
        let mut found: Vec<(String, u64, std::time::SystemTime)> = Vec::new();

        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let metadata = entry.metadata()?;
            let modified = metadata.modified().unwrap_or(std::time::UNIX_EPOCH);
            found.push((key.to_string(), metadata.len(), modified));
        }

        found.sort_by_key(|(_, _, modified)| *modified);
        for (key, size_bytes, _) in found {
            let stamp = self.clock.fetch_add(1, Ordering::Relaxed);
            self.resident_bytes.fetch_add(size_bytes, Ordering::Relaxed);
            self.index.insert(
                key,
                DiskIndexEntry {
                    size_bytes,
                    last_access: stamp,
                },
            );
        }

        self.evict_over_budget();
        Ok(())
    }
}
