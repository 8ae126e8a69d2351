//! The engine facade.
//!
//! [`MediaEngine`] is the single entry point collaborators see: `resolve` a
//! reference into a playable artifact, `invalidate` a stale one, `demote`
//! one whose native decode failed. Internals live behind an `Arc` so the
//! handle clones cheaply into the detached fetch tasks.

use std::sync::Arc;
use std::time::Duration;

use glimpse_common::{Error, ErrorClass, MediaReference, ResolvedMedia, Result};
use tracing::{debug, warn};

use crate::cache::{CacheManager, CacheStats, Flight};
use crate::config::EngineConfig;
use crate::strategy::DecoderCapabilities;
use crate::{fetch, strategy};

/// Media resolution engine.
///
/// Construct once at process start and share; every `resolve` call runs as
/// an independent task and concurrent calls for the same reference coalesce
/// into a single network fetch.
#[derive(Clone)]
pub struct MediaEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: EngineConfig,
    client: reqwest::Client,
    cache: CacheManager,
    capabilities: Arc<dyn DecoderCapabilities>,
}

impl MediaEngine {
    /// Build an engine from configuration and a platform capability query.
    pub fn new(config: EngineConfig, capabilities: Arc<dyn DecoderCapabilities>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.probe_timeout_ms))
            .build()
            .map_err(|e| Error::io(format!("failed to build http client: {e}")))?;
        let cache = CacheManager::new(&config)?;

        Ok(Self {
            inner: Arc::new(EngineInner {
                config,
                client,
                cache,
                capabilities,
            }),
        })
    }

    /// Resolve a reference into a fetched, classified, strategy-annotated
    /// artifact.
    ///
    /// Cache first; on a cold key the first caller fetches and everyone else
    /// waits for the same outcome. The fetch runs on a detached task, so a
    /// caller that loses interest and drops this future never kills a fetch
    /// other waiters depend on.
    pub async fn resolve(&self, reference: &MediaReference) -> Result<ResolvedMedia> {
        let key = reference.cache_key();

        if let Some(hit) = self.inner.cache.get(&key) {
            return Ok((*hit).clone());
        }

        let mut rx = match self.inner.cache.coalesce(&key) {
            Flight::Owner(rx) => {
                let inner = Arc::clone(&self.inner);
                let reference = reference.clone();
                let key = key.clone();
                tokio::spawn(async move {
                    let outcome = inner.owner_outcome(&key, &reference).await;
                    inner.cache.complete(&key, outcome);
                });
                rx
            }
            Flight::Waiter(rx) => {
                debug!(key = %key, "joining in-flight fetch");
                rx
            }
        };

        match rx.recv().await {
            Ok(outcome) => outcome,
            // The owning task never completed the flight; treat as transient
            // so the caller's manual retry starts a fresh attempt.
            Err(_) => Err(Error::transient("in-flight fetch was abandoned")),
        }
    }

    /// Force eviction of a cached artifact from both tiers.
    pub fn invalidate(&self, cache_key: &str) {
        self.inner.cache.invalidate(cache_key);
    }

    /// Record a decode-class failure for a resolved reference.
    ///
    /// Re-runs the strategy selector with `Unsupported` and rewrites the
    /// cached artifact. The transition is monotonic: once demoted to the
    /// embedded-browser fallback, a reference never climbs back to native
    /// decode, and calling this again is a no-op.
    pub async fn demote(&self, reference: &MediaReference) -> Result<ResolvedMedia> {
        let key = reference.cache_key();
        let current = match self.inner.cache.get(&key) {
            Some(hit) => (*hit).clone(),
            None => self.resolve(reference).await?,
        };

        let demoted = strategy::after_failure(current.strategy, ErrorClass::Unsupported);
        if demoted == current.strategy {
            return Ok(current);
        }

        debug!(key = %key, from = %current.strategy, to = %demoted, "demoting playback strategy");
        let updated = ResolvedMedia {
            strategy: demoted,
            ..current
        };
        self.inner.cache.put(&updated)?;
        Ok(updated)
    }

    /// Current cache occupancy, for diagnostics.
    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }
}

impl EngineInner {
    /// Produce the outcome the flight owner broadcasts to every waiter.
    ///
    /// The caller's cache miss and taking flight ownership are separate
    /// steps, so a finishing flight may have warmed the key in between.
    /// Recheck once before paying for a network fetch.
    async fn owner_outcome(&self, key: &str, reference: &MediaReference) -> Result<ResolvedMedia> {
        if let Some(hit) = self.cache.get(key) {
            debug!(key = %key, "key warmed while acquiring flight ownership");
            return Ok((*hit).clone());
        }

        let outcome = self.run_fetch(reference).await;
        if let Ok(media) = &outcome {
            if let Err(e) = self.cache.put(media) {
                warn!(key = %key, error = %e, "failed to cache resolved media");
            }
        }
        outcome
    }

    async fn run_fetch(&self, reference: &MediaReference) -> Result<ResolvedMedia> {
        fetch::resolve_via_network(
            &self.client,
            &self.config,
            reference,
            self.capabilities.as_ref(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OriginConfig, OriginsConfig};
    use crate::strategy::DefaultCapabilities;
    use glimpse_common::{MediaKind, Origin, PlaybackStrategy};
    use std::collections::HashMap;

    // An origin nothing listens on: any fetch attempt fails fast.
    fn engine_with_unreachable_origin(dir: &std::path::Path) -> MediaEngine {
        let config = EngineConfig {
            disk_root: dir.to_path_buf(),
            max_retries_per_candidate: 0,
            backoff_base_ms: 1,
            backoff_cap_ms: 1,
            probe_timeout_ms: 200,
            origins: OriginsConfig {
                origin_a: OriginConfig {
                    domains: vec!["http://127.0.0.1:9".to_string()],
                    ..Default::default()
                },
                origin_b: OriginConfig::default(),
            },
            ..Default::default()
        };
        MediaEngine::new(config, Arc::new(DefaultCapabilities::new(true))).unwrap()
    }

    #[tokio::test]
    async fn flight_owner_serves_entry_warmed_after_callers_miss() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_unreachable_origin(dir.path());
        let reference = MediaReference::new("/data/a/b.jpg", Origin::OriginA, "svc");
        let key = reference.cache_key();

        // Simulate another flight warming the key between this caller's
        // cache miss and it taking ownership of the fetch.
        let media = ResolvedMedia {
            canonical_url: "http://127.0.0.1:9/data/a/b.jpg".to_string(),
            kind: MediaKind::Image,
            strategy: PlaybackStrategy::StaticImagePipeline,
            required_headers: HashMap::new(),
            cache_key: key.clone(),
        };
        engine.inner.cache.put(&media).unwrap();

        // Without the ownership-time recheck this would probe the dead
        // origin and fail with Unavailable.
        let outcome = engine.inner.owner_outcome(&key, &reference).await.unwrap();
        assert_eq!(outcome, media);
    }
}
