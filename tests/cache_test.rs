//! Cache manager behavior tests: budgets, tier demotion, write-through.

use std::collections::HashMap;

use glimpse::cache::CacheManager;
use glimpse::config::EngineConfig;
use glimpse::{MediaKind, PlaybackStrategy, ResolvedMedia};

fn media(key: &str) -> ResolvedMedia {
    ResolvedMedia {
        canonical_url: format!("https://cdn.example/data/{key}.jpg"),
        kind: MediaKind::Image,
        strategy: PlaybackStrategy::StaticImagePipeline,
        required_headers: HashMap::new(),
        cache_key: key.to_string(),
    }
}

fn entry_size() -> u64 {
    serde_json::to_vec(&media("k00")).unwrap().len() as u64
}

fn config(dir: &std::path::Path, memory_budget: u64, disk_budget: u64) -> EngineConfig {
    EngineConfig {
        memory_budget_bytes: memory_budget,
        disk_budget_bytes: disk_budget,
        disk_root: dir.to_path_buf(),
        ..Default::default()
    }
}

#[test]
fn memory_stays_under_budget_and_evictions_land_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let size = entry_size();
    // Memory fits three entries; disk fits all twenty.
    let cache = CacheManager::new(&config(dir.path(), size * 3 + 10, size * 40)).unwrap();

    let keys: Vec<String> = (0..20).map(|i| format!("k{i:02}")).collect();
    for key in &keys {
        cache.put(&media(key)).unwrap();
        assert!(
            cache.stats().memory_bytes <= size * 3 + 10,
            "memory over budget after put of {key}"
        );
    }

    let stats = cache.stats();
    assert!(stats.memory_entries <= 3);
    assert_eq!(stats.disk_entries, 20);

    // Every entry, evicted or not, is still retrievable.
    for key in &keys {
        let hit = cache.get(key).expect("entry should survive on disk");
        assert_eq!(&hit.cache_key, key);
    }
}

#[test]
fn disk_tier_enforces_its_own_budget() {
    let dir = tempfile::tempdir().unwrap();
    let size = entry_size();
    let cache = CacheManager::new(&config(dir.path(), size * 2 + 10, size * 5 + 10)).unwrap();

    for i in 0..10 {
        cache.put(&media(&format!("k{i:02}"))).unwrap();
    }

    let stats = cache.stats();
    assert!(stats.disk_bytes <= size * 5 + 10);
    assert!(stats.disk_entries <= 5);

    // The most recent entries survived.
    assert!(cache.get("k09").is_some());
}

#[test]
fn disk_hit_promotes_into_memory() {
    let dir = tempfile::tempdir().unwrap();
    let size = entry_size();
    // Memory holds exactly one entry.
    let cache = CacheManager::new(&config(dir.path(), size + 5, size * 40)).unwrap();

    cache.put(&media("k01")).unwrap();
    cache.put(&media("k02")).unwrap();

    // k01 was evicted from memory; this get promotes it back in.
    assert!(cache.get("k01").is_some());
    let stats = cache.stats();
    assert_eq!(stats.memory_entries, 1);
    assert!(stats.memory_bytes <= size + 5);
}

#[test]
fn invalidate_then_get_misses_both_tiers() {
    let dir = tempfile::tempdir().unwrap();
    let cache = CacheManager::new(&config(dir.path(), 1_000_000, 10_000_000)).unwrap();

    cache.put(&media("k01")).unwrap();
    assert!(cache.get("k01").is_some());

    cache.invalidate("k01");
    assert!(cache.get("k01").is_none());
    assert!(!dir.path().join("k01.json").exists());
}

#[test]
fn cache_contents_survive_process_restart() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path(), 1_000_000, 10_000_000);

    {
        let cache = CacheManager::new(&cfg).unwrap();
        cache.put(&media("k01")).unwrap();
    }

    // A fresh manager over the same root finds the artifact on disk.
    let cache = CacheManager::new(&cfg).unwrap();
    let hit = cache.get("k01").expect("disk entry should be reindexed");
    assert_eq!(hit.cache_key, "k01");
}
