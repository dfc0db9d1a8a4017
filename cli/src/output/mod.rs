//! Output formatting module

pub mod human;
pub mod json;
pub mod progress;
pub mod reporter;
pub mod styles;

use std::path::{Path, PathBuf};

use anyhow::Result;
use console::Term;
use owo_colors::OwoColorize as _;
pub use human::HumanRenderer;
pub use json::JsonRenderer;
pub use reporter::TerminalReporter;
pub use styles::Styles;

use crate::domain::{ClusterConfig, InstanceRef};

/// Whether `NO_COLOR` is set to a non-empty value (see no-color.org).
#[must_use]
pub fn no_color_env() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty())
}

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let styles = if !no_color && is_tty && !no_color_env() {
            Styles::colored()
        } else {
            Styles::plain()
        };

        Self {
            styles,
            is_tty,
            quiet,
        }
    }

    /// Check if progress indicators should be shown.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty && !self.quiet
    }

    /// Print a success message prefixed with `✓`. Suppressed when `quiet`.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "✓".style(self.styles.success));
        }
    }

    /// Print a warning message prefixed with `⚠`. Suppressed when `quiet`.
    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "⚠".style(self.styles.warning));
        }
    }

    /// Print an error message prefixed with `✗` to stderr. Never suppressed.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.error));
    }

    /// Print an info message prefixed with `ℹ`. Suppressed when `quiet`.
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "ℹ".style(self.styles.info));
        }
    }

    /// Print a section header. Suppressed when `quiet`.
    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// Print a key-value pair with the key dimmed. Suppressed when `quiet`.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {}  {value}", key.style(self.styles.dim));
        }
    }
}

/// Dispatches command results to the human or JSON renderer.
pub enum Renderer<'a> {
    Human(HumanRenderer<'a>),
    Json(JsonRenderer),
}

impl Renderer<'_> {
    /// Render the public addresses of freshly started workers.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_addresses(&self, session_id: &str, addresses: &[String]) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_addresses(session_id, addresses);
                Ok(())
            }
            Self::Json(r) => r.render_addresses(session_id, addresses),
        }
    }

    /// Render the instances of the persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_instances(&self, session_id: Option<&str>, instances: &[InstanceRef]) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_instances(session_id, instances);
                Ok(())
            }
            Self::Json(r) => r.render_instances(session_id, instances),
        }
    }

    /// Render the outcome of a teardown.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_terminated(&self, ids: &[String]) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_terminated(ids);
                Ok(())
            }
            Self::Json(r) => r.render_terminated(ids),
        }
    }

    /// Render the files a bounded receive stored.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_received(&self, stored: &[PathBuf], forced_close: bool) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_received(stored, forced_close);
                Ok(())
            }
            Self::Json(r) => r.render_received(stored, forced_close),
        }
    }

    /// Render a completed upload.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_sent(&self, url: &str, bytes: usize) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_sent(url, bytes);
                Ok(())
            }
            Self::Json(r) => r.render_sent(url, bytes),
        }
    }

    /// Render the effective configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_config(&self, config: &ClusterConfig, path: &Path) -> Result<()> {
        match self {
            Self::Human(r) => r.render_config(config, path),
            Self::Json(r) => r.render_config(config, path),
        }
    }

    /// Render the CLI version.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_version(version);
                Ok(())
            }
            Self::Json(r) => r.render_version(version),
        }
    }
}
