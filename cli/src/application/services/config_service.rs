//! Application service: configuration use-cases.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::{ClusterConfig, apply_config_value, validate_config_key};

/// Load configuration.
pub fn load_config(store: &impl ConfigStore) -> Result<ClusterConfig> {
    store.load()
}

/// Save configuration.
pub fn save_config(store: &impl ConfigStore, config: &ClusterConfig) -> Result<()> {
    store.save(config)
}

/// Validate and persist a single `key = value` setting.
///
/// The file is only rewritten when validation succeeds. Returns the updated
/// configuration.
///
/// # Errors
///
/// Returns a `ConfigError` for an unknown key or invalid value, or an I/O
/// error from the store.
pub fn set_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<ClusterConfig> {
    validate_config_key(key)?;
    let mut config = store.load()?;
    apply_config_value(&mut config, key, value)?;
    store.save(&config)?;
    tracing::debug!(key, value, "configuration updated");
    Ok(config)
}
