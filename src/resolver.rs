//! Candidate URL construction.
//!
//! Normalizes a raw content path into an ordered list of fully-qualified
//! candidate URLs for the reference's origin. Pure, no I/O; the ordering is
//! the contract the fetch orchestrator relies on for fallthrough.

use crate::config::OriginsConfig;
use glimpse_common::{AssetVariant, Error, MediaReference, Result};

/// Build the ordered candidate URL list for a reference.
///
/// Absolute URLs pass through as the sole candidate (protocol-relative forms
/// are pinned to https). Storage-relative paths are stripped of a leading
/// slash and a leading `data/` segment, rebased into the thumbnail or
/// full-resolution tree, and crossed with the origin's domain list in
/// reliability order.
pub fn build_candidates(reference: &MediaReference, origins: &OriginsConfig) -> Result<Vec<String>> {
    let raw = reference.raw_path.trim();
    if raw.is_empty() {
        return Err(Error::invalid_reference("empty raw path"));
    }

    if let Some(rest) = raw.strip_prefix("//") {
        if rest.is_empty() {
            return Err(Error::invalid_reference(format!("bare protocol-relative path: {raw}")));
        }
        return Ok(vec![format!("https://{rest}")]);
    }

    if has_scheme(raw) {
        return Ok(vec![raw.to_string()]);
    }

    let rel = raw.strip_prefix('/').unwrap_or(raw);
    let rel = rel.strip_prefix("data/").unwrap_or(rel);
    if rel.is_empty() {
        return Err(Error::invalid_reference(format!("path has no content segment: {raw}")));
    }

    let rebased = match reference.variant {
        AssetVariant::Thumbnail => format!("thumbnail/data/{rel}"),
        AssetVariant::Full => format!("data/{rel}"),
    };

    let origin = origins.for_origin(reference.origin);
    if origin.domains.is_empty() {
        return Err(Error::invalid_reference(format!(
            "no domains configured for {}",
            reference.origin
        )));
    }

    Ok(origin
        .domains
        .iter()
        .map(|domain| format!("{}/{}", domain.trim_end_matches('/'), rebased))
        .collect())
}

/// True if the path starts with an explicit URL scheme like `https://`.
fn has_scheme(path: &str) -> bool {
    match path.split_once("://") {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
        }
        None => false,
    }
}
