//! Controller configuration
//!
//! The configuration is an in-memory struct assembled by the caller. It can
//! also be read from a JSON file; nothing is ever written back.

mod schema;

pub use schema::*;

use std::path::Path;

use tracing::debug;

use crate::error::Result;

/// Load a configuration from a JSON file
///
/// Missing fields take their defaults, and saturating fields are clamped
/// the same way the setters clamp them.
pub async fn load_from_file(path: &Path) -> Result<ControllerConfig> {
    let contents = tokio::fs::read_to_string(path).await?;
    let config = parse(&contents)?;
    debug!("Loaded controller configuration from {}", path.display());
    Ok(config)
}

/// Parse a configuration from JSON text
pub fn parse(contents: &str) -> Result<ControllerConfig> {
    let mut config: ControllerConfig = serde_json::from_str(contents)?;
    config.normalize();
    Ok(config)
}
