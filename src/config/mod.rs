//! Engine configuration: cache budgets, retry constants, origin domain lists.

mod types;

pub use types::{EngineConfig, OriginConfig, OriginsConfig};

use glimpse_common::{Error, Result};
use std::path::Path;

/// Load an [`EngineConfig`] from a TOML file.
///
/// Missing fields fall back to their defaults, so a partial config is valid.
pub fn load(path: &Path) -> Result<EngineConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("failed to read {}: {e}", path.display())))?;
    toml::from_str(&content)
        .map_err(|e| Error::config(format!("failed to parse {}: {e}", path.display())))
}
