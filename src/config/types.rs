use glimpse_common::Origin;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Engine configuration, injected once at construction.
///
/// Domain lists, cache budgets, and retry constants all live here; nothing
/// else in the crate names a hostname or a timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Memory cache tier budget in bytes.
    #[serde(default = "default_memory_budget")]
    pub memory_budget_bytes: u64,

    /// Disk cache tier budget in bytes.
    #[serde(default = "default_disk_budget")]
    pub disk_budget_bytes: u64,

    /// Directory holding the disk cache tier.
    #[serde(default = "default_disk_root")]
    pub disk_root: PathBuf,

    /// Additional retries per candidate on transient failure.
    #[serde(default = "default_max_retries")]
    pub max_retries_per_candidate: u32,

    /// Initial backoff delay in milliseconds; doubles per retry.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Upper bound on any single backoff delay in milliseconds.
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,

    /// Overall deadline per candidate in milliseconds, retries included.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Per-origin domain lists and header requirements.
    #[serde(default)]
    pub origins: OriginsConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            memory_budget_bytes: default_memory_budget(),
            disk_budget_bytes: default_disk_budget(),
            disk_root: default_disk_root(),
            max_retries_per_candidate: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_cap_ms: default_backoff_cap_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            origins: OriginsConfig::default(),
        }
    }
}

/// Domain lists for both origins.
///
/// The single source of truth for CDN hostnames; candidate ordering follows
/// list order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginsConfig {
    /// Origin A: a single primary domain.
    #[serde(default = "default_origin_a")]
    pub origin_a: OriginConfig,

    /// Origin B: a primary CDN node plus rotation fallbacks.
    #[serde(default = "default_origin_b")]
    pub origin_b: OriginConfig,
}

impl OriginsConfig {
    /// Configuration for the given origin.
    pub fn for_origin(&self, origin: Origin) -> &OriginConfig {
        match origin {
            Origin::OriginA => &self.origin_a,
            Origin::OriginB => &self.origin_b,
        }
    }
}

impl Default for OriginsConfig {
    fn default() -> Self {
        Self {
            origin_a: default_origin_a(),
            origin_b: default_origin_b(),
        }
    }
}

/// Per-origin CDN configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OriginConfig {
    /// Base URLs (scheme + host) in reliability order.
    #[serde(default)]
    pub domains: Vec<String>,

    /// Headers every probe/fetch against this origin must carry.
    #[serde(default)]
    pub required_headers: HashMap<String, String>,

    /// Service tags whose video delivery is known to defeat native decode.
    #[serde(default)]
    pub unreliable_service_tags: Vec<String>,
}

fn default_memory_budget() -> u64 {
    8 * 1024 * 1024
}

fn default_disk_budget() -> u64 {
    256 * 1024 * 1024
}

fn default_disk_root() -> PathBuf {
    std::env::temp_dir().join("glimpse-cache")
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_backoff_cap_ms() -> u64 {
    4_000
}

fn default_probe_timeout_ms() -> u64 {
    8_000
}

fn default_origin_a() -> OriginConfig {
    OriginConfig {
        domains: vec!["https://media.origin-a.example".to_string()],
        required_headers: HashMap::new(),
        unreliable_service_tags: Vec::new(),
    }
}

fn default_origin_b() -> OriginConfig {
    OriginConfig {
        domains: vec![
            "https://cdn1.origin-b.example".to_string(),
            "https://cdn2.origin-b.example".to_string(),
            "https://cdn3.origin-b.example".to_string(),
        ],
        required_headers: HashMap::new(),
        unreliable_service_tags: Vec::new(),
    }
}
