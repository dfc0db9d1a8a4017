//! Human-readable terminal renderer.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use owo_colors::OwoColorize as _;

use crate::domain::{ClusterConfig, InstanceRef, InstanceState};
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        if self.ctx.quiet {
            return;
        }
        println!("clusterboot {version}");
    }

    /// Print one address per line so the output can be piped.
    ///
    /// Addresses are printed even in quiet mode.
    pub fn render_addresses(&self, session_id: &str, addresses: &[String]) {
        self.ctx.kv("Session:", session_id);
        for addr in addresses {
            println!("{addr}");
        }
    }

    /// Render a status table for the session's instances.
    pub fn render_instances(&self, session_id: Option<&str>, instances: &[InstanceRef]) {
        let Some(session_id) = session_id else {
            self.ctx.info("No active session. Start one: clusterboot up --count <N>");
            return;
        };
        self.ctx.kv("Session:", session_id);
        if self.ctx.quiet {
            return;
        }
        println!();
        for instance in instances {
            let state = instance.state.to_string();
            let styled = match instance.state {
                InstanceState::Running => state.style(self.ctx.styles.success).to_string(),
                InstanceState::Pending => state.style(self.ctx.styles.warning).to_string(),
                InstanceState::Terminated => state.style(self.ctx.styles.dim).to_string(),
                InstanceState::Unknown => state.style(self.ctx.styles.error).to_string(),
            };
            let addr = instance.public_address.as_deref().unwrap_or("-");
            println!("  {:<20} {styled:<12} {addr}", instance.id);
        }
    }

    /// Render the outcome of a teardown.
    pub fn render_terminated(&self, ids: &[String]) {
        if ids.is_empty() {
            self.ctx.info("No instances to terminate");
        } else {
            self.ctx
                .success(&format!("Termination requested for {} instances", ids.len()));
        }
    }

    /// Render the files a bounded receive stored.
    pub fn render_received(&self, stored: &[PathBuf], forced_close: bool) {
        self.ctx.success(&format!("Received {} files", stored.len()));
        for path in stored {
            self.ctx.kv("  stored", &path.display().to_string());
        }
        if forced_close {
            self.ctx
                .warn("Some connections were still open after the grace period and were closed");
        }
    }

    /// Render a completed upload.
    pub fn render_sent(&self, url: &str, bytes: usize) {
        self.ctx.success(&format!("Sent {bytes} bytes to {url}"));
    }

    /// Render the effective configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized.
    pub fn render_config(&self, config: &ClusterConfig, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(config).context("cannot serialize config")?;
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        for line in yaml.lines() {
            println!("  {line}");
        }
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        for var in ["CLUSTERBOOT_CONFIG", "CLUSTERBOOT_STATE", "NO_COLOR"] {
            println!(
                "    {:<20} {}",
                format!("{var}:"),
                std::env::var(var).unwrap_or_else(|_| "(not set)".to_string())
            );
        }
        println!();
        Ok(())
    }
}
