//! Shared domain types and error taxonomy for the glimpse media engine.
//!
//! This crate defines the vocabulary the engine and its callers exchange:
//! media references and their resolved form, the origin/kind/strategy enums,
//! and the unified error type.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    AssetVariant, ErrorClass, KindHint, MediaKind, MediaReference, Origin, PlaybackStrategy,
    ResolvedMedia,
};
