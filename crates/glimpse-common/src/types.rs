//! Core type definitions for media references and resolved artifacts.
//!
//! All enums serialize in lowercase so the disk-tier JSON stays stable and
//! readable. `MediaReference` is the immutable input to the engine;
//! `ResolvedMedia` the immutable output of a successful resolution.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;

/// Which backend content API a reference belongs to.
///
/// The two origins have distinct CDN topologies: A serves from a single
/// primary domain, B from a rotating pool with higher transient-failure
/// rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Primary backend with a single reliable CDN domain.
    OriginA,
    /// Secondary backend with rotating CDN nodes.
    OriginB,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OriginA => write!(f, "origina"),
            Self::OriginB => write!(f, "originb"),
        }
    }
}

/// Classified kind of a media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image.
    Image,
    /// Progressive (non-streaming) video file.
    ProgressiveVideo,
    /// HLS stream (m3u8 playlist).
    HlsStream,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::ProgressiveVideo => write!(f, "progressivevideo"),
            Self::HlsStream => write!(f, "hlsstream"),
        }
    }
}

/// Caller-supplied kind hint for paths without a usable extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindHint {
    /// Treat as a still image.
    Image,
    /// Treat as a video.
    Video,
}

/// Which URL subtree a storage-relative path is rebased into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetVariant {
    /// Thumbnail tree (`/thumbnail/data/...`).
    Thumbnail,
    /// Full-resolution tree (`/data/...`).
    Full,
}

impl fmt::Display for AssetVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thumbnail => write!(f, "thumbnail"),
            Self::Full => write!(f, "full"),
        }
    }
}

/// The chosen rendering/playback mechanism for a resolved artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStrategy {
    /// Decode and display through the static image pipeline.
    StaticImagePipeline,
    /// Hand the URL to the platform's native decoder.
    NativeDecode,
    /// Render inside an embedded browser surface.
    EmbeddedBrowserFallback,
}

impl fmt::Display for PlaybackStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaticImagePipeline => write!(f, "staticimagepipeline"),
            Self::NativeDecode => write!(f, "nativedecode"),
            Self::EmbeddedBrowserFallback => write!(f, "embeddedbrowserfallback"),
        }
    }
}

/// Classification of a probe or playback failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Network-level failure; eligible for retry.
    Transient,
    /// Definitive "does not exist" response.
    NotFound,
    /// The decoder rejected the content.
    Unsupported,
}

/// Input to the engine: an opaque content reference as handed out by one of
/// the backend APIs.
///
/// Immutable once constructed; carries no resolved state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaReference {
    /// Path as returned by the content API; absolute or root-relative.
    pub raw_path: String,
    /// Which backend this content belongs to.
    pub origin: Origin,
    /// Content-provider identifier, used to refine strategy choice.
    pub service_tag: String,
    /// Optional hint for extension-less paths.
    pub kind_hint: Option<KindHint>,
    /// Thumbnail or full-resolution asset.
    pub variant: AssetVariant,
}

impl MediaReference {
    /// Create a reference for a full-resolution asset with no kind hint.
    pub fn new<P: Into<String>, T: Into<String>>(
        raw_path: P,
        origin: Origin,
        service_tag: T,
    ) -> Self {
        Self {
            raw_path: raw_path.into(),
            origin,
            service_tag: service_tag.into(),
            kind_hint: None,
            variant: AssetVariant::Full,
        }
    }

    /// Set the kind hint.
    pub fn with_kind_hint(mut self, hint: KindHint) -> Self {
        self.kind_hint = Some(hint);
        self
    }

    /// Set the asset variant.
    pub fn with_variant(mut self, variant: AssetVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Deterministic cache key for this reference.
    ///
    /// Derived from `(origin, raw_path, variant)` and nothing else, so it is
    /// stable across resolutions and independent of the kind hint. The hex
    /// form doubles as the disk-tier file stem.
    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.origin.to_string().as_bytes());
        hasher.update(b"\n");
        hasher.update(self.raw_path.as_bytes());
        hasher.update(b"\n");
        hasher.update(self.variant.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Output of a successful resolution.
///
/// Created once per resolution, immutable, safe to share across concurrent
/// readers. The serialized form is what the disk cache tier stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMedia {
    /// The exact URL that was successfully probed.
    pub canonical_url: String,
    /// Classified media kind.
    pub kind: MediaKind,
    /// Selected playback strategy.
    pub strategy: PlaybackStrategy,
    /// Headers the fetch must carry to avoid hot-link rejection.
    pub required_headers: HashMap<String, String>,
    /// Cache key this artifact is stored under.
    pub cache_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> MediaReference {
        MediaReference::new("/data/abc/def.jpg", Origin::OriginA, "galleria")
    }

    #[test]
    fn cache_key_is_stable() {
        let a = reference();
        let b = reference();
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn cache_key_independent_of_kind_hint() {
        let plain = reference();
        let hinted = reference().with_kind_hint(KindHint::Video);
        assert_eq!(plain.cache_key(), hinted.cache_key());
    }

    #[test]
    fn cache_key_varies_by_origin_path_and_variant() {
        let base = reference();

        let other_origin = MediaReference::new("/data/abc/def.jpg", Origin::OriginB, "galleria");
        assert_ne!(base.cache_key(), other_origin.cache_key());

        let other_path = MediaReference::new("/data/abc/ghi.jpg", Origin::OriginA, "galleria");
        assert_ne!(base.cache_key(), other_path.cache_key());

        let thumb = reference().with_variant(AssetVariant::Thumbnail);
        assert_ne!(base.cache_key(), thumb.cache_key());
    }

    #[test]
    fn cache_key_is_filesystem_safe() {
        let key = reference().cache_key();
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn resolved_media_roundtrips_through_json() {
        let media = ResolvedMedia {
            canonical_url: "https://cdn.example.net/data/abc/def.jpg".into(),
            kind: MediaKind::Image,
            strategy: PlaybackStrategy::StaticImagePipeline,
            required_headers: HashMap::from([("referer".to_string(), "https://example.net/".to_string())]),
            cache_key: reference().cache_key(),
        };
        let json = serde_json::to_string(&media).unwrap();
        let back: ResolvedMedia = serde_json::from_str(&json).unwrap();
        assert_eq!(media, back);
    }
}
