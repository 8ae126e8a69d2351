//! Glimpse - Media resolution and playback engine
//!
//! Given an opaque content reference (raw path, source origin, service tag),
//! the engine computes candidate CDN URLs, classifies the content kind,
//! selects a playback strategy, probes the candidates with bounded retry and
//! backoff, and caches resolved artifacts across memory and disk tiers with
//! single-flight request coalescing.

pub mod cache;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod resolver;
pub mod strategy;

mod fetch;

pub use engine::MediaEngine;
pub use glimpse_common::{
    AssetVariant, Error, ErrorClass, KindHint, MediaKind, MediaReference, Origin,
    PlaybackStrategy, ResolvedMedia, Result,
};
