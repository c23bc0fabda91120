// Config file loading

use std::fs;
use std::path::PathBuf;
use sweeper_scanner::SweepConfig;
use sweeper_scanner::error::{Result, SweepError};
use tracing::debug;

/// Expand a leading `~` the same way the shell would.
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Read a JSON config file. Missing keys keep their defaults.
pub fn load_config(path: &str) -> Result<SweepConfig> {
    let path = expand_path(path);
    let content = fs::read_to_string(&path).map_err(|e| SweepError::filesystem(&path, e))?;
    let config: SweepConfig = serde_json::from_str(&content).map_err(|e| {
        SweepError::InvalidInput(format!("Invalid config file {}: {}", path.display(), e))
    })?;
    debug!("Loaded config from {}: {:?}", path.display(), config);
    Ok(config)
}
