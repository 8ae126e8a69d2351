//! Playback strategy selection.
//!
//! An explicit state machine over `(kind, origin, service_tag, last_error)`
//! replacing the original's nested try-this-then-that conditionals, so every
//! transition can be tested on its own. The one allowed runtime transition is
//! `NativeDecode -> EmbeddedBrowserFallback` on a decode-class failure, and it
//! never reverses.

use crate::config::OriginConfig;
use glimpse_common::{ErrorClass, MediaKind, Origin, PlaybackStrategy};

/// Platform capability query consulted for HLS playback.
pub trait DecoderCapabilities: Send + Sync {
    /// Whether the native decoder can play HLS streams.
    fn supports_hls(&self) -> bool;
}

/// Static capability answers, fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct DefaultCapabilities {
    hls: bool,
}

impl DefaultCapabilities {
    /// Capabilities with the given HLS support flag.
    pub fn new(hls: bool) -> Self {
        Self { hls }
    }
}

impl DecoderCapabilities for DefaultCapabilities {
    fn supports_hls(&self) -> bool {
        self.hls
    }
}

/// Select the playback strategy for a classified media item.
pub fn select(
    kind: MediaKind,
    origin: Origin,
    service_tag: &str,
    last_error: Option<ErrorClass>,
    capabilities: &dyn DecoderCapabilities,
    origin_config: &OriginConfig,
) -> PlaybackStrategy {
    // A decode-class failure forces the browser fallback for the rest of
    // this resolution. Images never reach a decoder, so they are exempt.
    if last_error == Some(ErrorClass::Unsupported) && kind != MediaKind::Image {
        return PlaybackStrategy::EmbeddedBrowserFallback;
    }

    match kind {
        MediaKind::Image => PlaybackStrategy::StaticImagePipeline,
        MediaKind::HlsStream => {
            if capabilities.supports_hls() {
                PlaybackStrategy::NativeDecode
            } else {
                PlaybackStrategy::EmbeddedBrowserFallback
            }
        }
        MediaKind::ProgressiveVideo => {
            let unreliable = origin_config
                .unreliable_service_tags
                .iter()
                .any(|tag| tag == service_tag);
            if origin == Origin::OriginB || unreliable {
                // Native decode against these CDNs is a known guaranteed
                // failure; skip straight to the fallback.
                PlaybackStrategy::EmbeddedBrowserFallback
            } else {
                PlaybackStrategy::NativeDecode
            }
        }
    }
}

/// Transition after a playback failure of the given class.
///
/// Monotonic: once demoted to the browser fallback a resolution never climbs
/// back to native decode, and there is no strategy below the fallback.
pub fn after_failure(current: PlaybackStrategy, class: ErrorClass) -> PlaybackStrategy {
    match (current, class) {
        (PlaybackStrategy::NativeDecode, ErrorClass::Unsupported) => {
            PlaybackStrategy::EmbeddedBrowserFallback
        }
        (other, _) => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OriginConfig;

    fn origin_config(unreliable: &[&str]) -> OriginConfig {
        OriginConfig {
            domains: vec!["https://cdn.example".to_string()],
            unreliable_service_tags: unreliable.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn images_always_use_static_pipeline() {
        for origin in [Origin::OriginA, Origin::OriginB] {
            let strategy = select(
                MediaKind::Image,
                origin,
                "board",
                None,
                &DefaultCapabilities::new(true),
                &origin_config(&[]),
            );
            assert_eq!(strategy, PlaybackStrategy::StaticImagePipeline);
        }
    }

    #[test]
    fn hls_uses_native_decode_when_supported() {
        let strategy = select(
            MediaKind::HlsStream,
            Origin::OriginA,
            "tube",
            None,
            &DefaultCapabilities::new(true),
            &origin_config(&[]),
        );
        assert_eq!(strategy, PlaybackStrategy::NativeDecode);
    }

    #[test]
    fn hls_falls_back_when_unsupported_by_platform() {
        let strategy = select(
            MediaKind::HlsStream,
            Origin::OriginA,
            "tube",
            None,
            &DefaultCapabilities::new(false),
            &origin_config(&[]),
        );
        assert_eq!(strategy, PlaybackStrategy::EmbeddedBrowserFallback);
    }

    #[test]
    fn progressive_video_on_origin_a_decodes_natively() {
        let strategy = select(
            MediaKind::ProgressiveVideo,
            Origin::OriginA,
            "tube",
            None,
            &DefaultCapabilities::new(true),
            &origin_config(&[]),
        );
        assert_eq!(strategy, PlaybackStrategy::NativeDecode);
    }

    #[test]
    fn progressive_video_on_origin_b_goes_straight_to_fallback() {
        let strategy = select(
            MediaKind::ProgressiveVideo,
            Origin::OriginB,
            "tube",
            None,
            &DefaultCapabilities::new(true),
            &origin_config(&[]),
        );
        assert_eq!(strategy, PlaybackStrategy::EmbeddedBrowserFallback);
    }

    #[test]
    fn unreliable_service_tag_forces_fallback_even_on_origin_a() {
        let strategy = select(
            MediaKind::ProgressiveVideo,
            Origin::OriginA,
            "flaky-host",
            None,
            &DefaultCapabilities::new(true),
            &origin_config(&["flaky-host"]),
        );
        assert_eq!(strategy, PlaybackStrategy::EmbeddedBrowserFallback);
    }

    #[test]
    fn unsupported_error_forces_fallback_for_video_kinds() {
        for kind in [MediaKind::ProgressiveVideo, MediaKind::HlsStream] {
            let strategy = select(
                kind,
                Origin::OriginA,
                "tube",
                Some(ErrorClass::Unsupported),
                &DefaultCapabilities::new(true),
                &origin_config(&[]),
            );
            assert_eq!(strategy, PlaybackStrategy::EmbeddedBrowserFallback);
        }
    }

    #[test]
    fn after_failure_demotes_native_decode_once() {
        let demoted = after_failure(PlaybackStrategy::NativeDecode, ErrorClass::Unsupported);
        assert_eq!(demoted, PlaybackStrategy::EmbeddedBrowserFallback);

        // No strategy below the fallback, and no climb back up.
        let again = after_failure(demoted, ErrorClass::Unsupported);
        assert_eq!(again, PlaybackStrategy::EmbeddedBrowserFallback);
    }

    #[test]
    fn after_failure_ignores_non_decode_errors() {
        assert_eq!(
            after_failure(PlaybackStrategy::NativeDecode, ErrorClass::Transient),
            PlaybackStrategy::NativeDecode
        );
        assert_eq!(
            after_failure(PlaybackStrategy::NativeDecode, ErrorClass::NotFound),
            PlaybackStrategy::NativeDecode
        );
        assert_eq!(
            after_failure(PlaybackStrategy::StaticImagePipeline, ErrorClass::Unsupported),
            PlaybackStrategy::StaticImagePipeline
        );
    }
}
