//! Fetch/retry orchestration.
//!
//! Walks the candidate URL list in order, probing each with a lightweight
//! HEAD request. Transient failures retry the same candidate with exponential
//! backoff; 4xx responses advance to the next candidate immediately. The
//! candidate's overall deadline is divided into per-attempt slices, so a
//! probe that hangs times out as transient and still leaves room for its
//! retries. The retry state is threaded explicitly through the loop rather
//! than nested in callbacks.

use std::collections::HashMap;
use std::time::Duration;

use glimpse_common::{Error, ErrorClass, MediaReference, ResolvedMedia, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::strategy::DecoderCapabilities;
use crate::{classifier, resolver, strategy};

/// Transient, per-in-flight-resolution retry bookkeeping.
///
/// Destroyed when the resolution terminates; never persisted.
struct RetryState {
    attempt: u32,
    last_error: Option<ErrorClass>,
}

impl RetryState {
    fn new() -> Self {
        Self {
            attempt: 0,
            last_error: None,
        }
    }

    /// Backoff delay before the next attempt: base doubled per attempt,
    /// capped.
    fn backoff_delay(&self, base_ms: u64, cap_ms: u64) -> Duration {
        let exp = self.attempt.min(16);
        let delay = base_ms.saturating_mul(1u64 << exp).min(cap_ms);
        Duration::from_millis(delay)
    }
}

/// Outcome of probing a single candidate URL, retries included.
enum CandidateOutcome {
    Success,
    NotFound,
    Transient,
}

/// Per-attempt slice of the candidate deadline.
///
/// `probe_timeout_ms` covers every attempt for one candidate plus the backoff
/// sleeps between them. Dividing what remains after backoff evenly across the
/// attempts means a request that never answers is cut off as transient while
/// the remaining retries still fit inside the deadline.
fn attempt_budget(config: &EngineConfig) -> Duration {
    let attempts = u64::from(config.max_retries_per_candidate) + 1;
    let backoff_total: u64 = (0..config.max_retries_per_candidate)
        .map(|i| {
            let exp = i.min(16);
            config
                .backoff_base_ms
                .saturating_mul(1u64 << exp)
                .min(config.backoff_cap_ms)
        })
        .sum();
    let budget = config
        .probe_timeout_ms
        .saturating_sub(backoff_total)
        .max(attempts)
        / attempts;
    Duration::from_millis(budget)
}

/// Resolve a reference over the network: probe candidates in order until one
/// succeeds or all are exhausted.
pub(crate) async fn resolve_via_network(
    client: &reqwest::Client,
    config: &EngineConfig,
    reference: &MediaReference,
    capabilities: &dyn DecoderCapabilities,
) -> Result<ResolvedMedia> {
    let candidates = resolver::build_candidates(reference, &config.origins)?;
    let origin_config = config.origins.for_origin(reference.origin);
    let headers = header_map(&origin_config.required_headers);

    let mut saw_transient = false;

    for url in &candidates {
        match probe_candidate(client, url, &headers, config).await {
            CandidateOutcome::Success => {
                let kind = classifier::classify(&reference.raw_path, reference.kind_hint);
                let strategy = strategy::select(
                    kind,
                    reference.origin,
                    &reference.service_tag,
                    None,
                    capabilities,
                    origin_config,
                );
                debug!(url = %url, kind = %kind, strategy = %strategy, "candidate resolved");
                return Ok(ResolvedMedia {
                    canonical_url: url.clone(),
                    kind,
                    strategy,
                    required_headers: origin_config.required_headers.clone(),
                    cache_key: reference.cache_key(),
                });
            }
            CandidateOutcome::NotFound => {
                debug!(url = %url, "candidate not found, advancing");
            }
            CandidateOutcome::Transient => {
                saw_transient = true;
            }
        }
    }

    if saw_transient {
        Err(Error::unavailable(format!(
            "all {} candidates exhausted for {}",
            candidates.len(),
            reference.raw_path
        )))
    } else {
        Err(Error::not_found(format!(
            "every candidate returned a definitive miss for {}",
            reference.raw_path
        )))
    }
}

/// Probe one candidate, retrying transient failures in place.
async fn probe_candidate(
    client: &reqwest::Client,
    url: &str,
    headers: &HeaderMap,
    config: &EngineConfig,
) -> CandidateOutcome {
    let mut state = RetryState::new();
    let budget = attempt_budget(config);

    loop {
        let result = match tokio::time::timeout(budget, probe_once(client, url, headers)).await {
            Ok(result) => result,
            Err(_) => ProbeResult::Transient(format!(
                "no answer within {}ms",
                budget.as_millis()
            )),
        };

        match result {
            ProbeResult::Success => return CandidateOutcome::Success,
            ProbeResult::NotFound => return CandidateOutcome::NotFound,
            ProbeResult::Transient(reason) => {
                state.last_error = Some(ErrorClass::Transient);
                if state.attempt >= config.max_retries_per_candidate {
                    warn!(
                        url = %url,
                        attempts = state.attempt + 1,
                        last_error = ?state.last_error,
                        "candidate retries exhausted"
                    );
                    return CandidateOutcome::Transient;
                }
                let delay = state.backoff_delay(config.backoff_base_ms, config.backoff_cap_ms);
                warn!(
                    url = %url,
                    attempt = state.attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    reason = %reason,
                    "transient probe failure, backing off"
                );
                tokio::time::sleep(delay).await;
                state.attempt += 1;
            }
        }
    }
}

/// Outcome of a single HEAD request.
enum ProbeResult {
    Success,
    NotFound,
    Transient(String),
}

async fn probe_once(client: &reqwest::Client, url: &str, headers: &HeaderMap) -> ProbeResult {
    let response = match client.head(url).headers(headers.clone()).send().await {
        Ok(response) => response,
        Err(e) => return ProbeResult::Transient(e.to_string()),
    };

    let status = response.status();
    if status.is_success() {
        ProbeResult::Success
    } else if status.is_client_error() {
        // 4xx is a definitive miss for this candidate; no delay, no retry.
        ProbeResult::NotFound
    } else {
        ProbeResult::Transient(format!("status {status}"))
    }
}

/// Build a reqwest header map, skipping malformed entries.
fn header_map(headers: &HashMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (key, value) in headers {
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => warn!(header = %key, "skipping malformed required header"),
        }
    }
    map
}
