//! YAML-file backed `ConfigStore`.
//!
//! The file lives at `~/.clusterboot/config.yaml` unless `CLUSTERBOOT_CONFIG`
//! names another path. A missing file is not an error: every section has
//! serde defaults, so an empty or partial file loads as a full config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::ConfigStore;
use crate::domain::config::ClusterConfig;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "CLUSTERBOOT_CONFIG";

/// `ConfigStore` over a single YAML file, resolved on every call so env
/// overrides set after startup are honoured.
pub struct YamlConfigStore;

fn default_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("cannot determine home directory")?;
    Ok(home.join(".clusterboot").join("config.yaml"))
}

/// Write `content` next to `path`, restrict it to the owner, then rename it
/// into place.
fn write_private(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    let temp = path.with_extension("yaml.tmp");
    std::fs::write(&temp, content).with_context(|| format!("cannot write {}", temp.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("cannot set permissions on {}", temp.display()))?;
    }

    std::fs::rename(&temp, path).with_context(|| format!("cannot replace {}", path.display()))
}

impl ConfigStore for YamlConfigStore {
    fn load(&self) -> Result<ClusterConfig> {
        let path = self.path()?;
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(ClusterConfig::default());
            }
            Err(e) => return Err(e).with_context(|| format!("cannot read {}", path.display())),
        };
        if content.trim().is_empty() {
            return Ok(ClusterConfig::default());
        }
        serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
    }

    fn save(&self, config: &ClusterConfig) -> Result<()> {
        let path = self.path()?;
        let content = serde_yaml::to_string(config).context("cannot serialize config")?;
        write_private(&path, &content)
    }

    fn path(&self) -> Result<PathBuf> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => default_path(),
        }
    }
}
