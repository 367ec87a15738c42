use dotenvy::dotenv;
use eyre::{Result, eyre};
use std::path::Path;
use tracing::warn;

use playground_core::config::PlaygroundConfig;

pub fn load_env() -> Result<()> {
    dotenv().ok();
    Ok(())
}

/// Load the config from `path`, or from the default location when none is
/// given. Invalid or unreadable config files are reported, never replaced by
/// defaults; only a platform without a config directory falls back.
pub fn load_config(path: Option<&Path>) -> Result<PlaygroundConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match PlaygroundConfig::config_path() {
            Ok(path) => path,
            Err(e) => {
                warn!(target: "playground::config", "Using default config: {e}");
                return Ok(PlaygroundConfig::default());
            }
        },
    };

    PlaygroundConfig::load_from(&path)
        .map_err(|e| eyre!("Failed to load config from {}: {}", path.display(), e))
}
