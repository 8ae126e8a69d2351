//! Media kind classification from path and hint.
//!
//! Pure and total: every input maps to a [`MediaKind`], no I/O. Extension
//! rules win over the caller hint; with neither, Image is the default since a
//! misclassified video degrades to a broken-thumbnail placeholder while the
//! reverse wastes a video-decoder allocation.

use glimpse_common::{KindHint, MediaKind};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "avif", "bmp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "m4v", "mkv"];

/// Classify a raw path into a [`MediaKind`].
pub fn classify(raw_path: &str, kind_hint: Option<KindHint>) -> MediaKind {
    if let Some(ext) = extension(raw_path) {
        let ext = ext.to_ascii_lowercase();
        if ext == "m3u8" {
            return MediaKind::HlsStream;
        }
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            return MediaKind::Image;
        }
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            return MediaKind::ProgressiveVideo;
        }
    }

    match kind_hint {
        Some(KindHint::Image) => MediaKind::Image,
        Some(KindHint::Video) => MediaKind::ProgressiveVideo,
        None => MediaKind::Image,
    }
}

/// Extract the extension of the final path segment, ignoring any query
/// string or fragment suffix.
fn extension(raw_path: &str) -> Option<&str> {
    let path = raw_path.split(['?', '#']).next().unwrap_or(raw_path);

    let segment = path.rsplit('/').next().unwrap_or(path);
    match segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}
