//! Infrastructure implementation of the `SessionStateStore` port.
//!
//! `SessionStore` provides async load/save using `tokio::task::spawn_blocking`
//! with atomic write (temp file + rename) to prevent state corruption.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::SessionStateStore;
use crate::domain::session::{SessionState, validate_session_id};

/// Environment variable that overrides the session file location.
pub const STATE_ENV: &str = "CLUSTERBOOT_STATE";

/// Session file manager: implements `SessionStateStore` for the infra layer.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Create a store at `$CLUSTERBOOT_STATE`, or `~/.clusterboot/session.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        if let Ok(val) = std::env::var(STATE_ENV) {
            return Ok(Self::with_path(PathBuf::from(val)));
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(Self::with_path(home.join(".clusterboot").join("session.json")))
    }

    /// Create a store with an explicit path (used in tests).
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn load_sync(&self) -> Result<Option<SessionState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading session file {}", self.path.display()))?;
        let state: SessionState = serde_json::from_str(&content)
            .with_context(|| format!("parsing session file {}", self.path.display()))?;
        validate_session_id(&state.session_id)?;
        Ok(Some(state))
    }

    fn save_sync(&self, state: &SessionState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(state).context("serializing session")?;

        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, &content)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
        }

        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("finalizing session file {}", self.path.display()))?;
        Ok(())
    }

    fn clear_sync(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("removing session file {}", self.path.display()))?;
        }
        Ok(())
    }
}

impl SessionStateStore for SessionStore {
    async fn load_async(&self) -> Result<Option<SessionState>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || SessionStore::with_path(path).load_sync())
            .await
            .context("session load task panicked")?
    }

    async fn save_async(&self, state: &SessionState) -> Result<()> {
        let path = self.path.clone();
        let state = state.clone();
        tokio::task::spawn_blocking(move || SessionStore::with_path(path).save_sync(&state))
            .await
            .context("session save task panicked")?
    }

    async fn clear_async(&self) -> Result<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || SessionStore::with_path(path).clear_sync())
            .await
            .context("session clear task panicked")?
    }
}
