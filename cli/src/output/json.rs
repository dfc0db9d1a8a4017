//! JSON output helpers.
//!
//! `--json` mode prints exactly one pretty-printed object per command on
//! stdout. Failures use the error object from [`format_error`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::json;

use crate::domain::{ClusterConfig, InstanceRef};

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

fn print(value: &serde_json::Value) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("JSON serialization failed")?
    );
    Ok(())
}

/// Renders command results as JSON on stdout.
pub struct JsonRenderer;

impl JsonRenderer {
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_addresses(&self, session_id: &str, addresses: &[String]) -> Result<()> {
        print(&json!({ "session_id": session_id, "addresses": addresses }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_instances(&self, session_id: Option<&str>, instances: &[InstanceRef]) -> Result<()> {
        print(&json!({ "session_id": session_id, "instances": instances }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_terminated(&self, ids: &[String]) -> Result<()> {
        print(&json!({ "terminated": ids }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_received(&self, stored: &[PathBuf], forced_close: bool) -> Result<()> {
        print(&json!({ "stored": stored, "forced_close": forced_close }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_sent(&self, url: &str, bytes: usize) -> Result<()> {
        print(&json!({ "url": url, "bytes": bytes }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config(&self, config: &ClusterConfig, path: &Path) -> Result<()> {
        print(&json!({ "path": path, "config": config }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        print(&json!({ "version": version }))
    }
}
