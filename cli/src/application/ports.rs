//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::PathBuf;
use std::process::Output;

use anyhow::Result;

use crate::domain::{ClusterConfig, InstanceRef, Reservation, SessionState};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Fixed launch parameters shared by every instance in a reservation.
#[derive(Debug, Clone, Copy)]
pub struct LaunchSpec<'a> {
    /// Machine image the workers boot from, e.g. `"ami-130bdd69"`.
    pub image_id: &'a str,
    /// Instance size, e.g. `"t2.micro"`.
    pub instance_type: &'a str,
    /// Key pair installed on the instances.
    pub key_name: &'a str,
    /// Subnet the instances join; must auto-assign public addresses.
    pub subnet_id: &'a str,
}

impl<'a> LaunchSpec<'a> {
    /// Borrow the launch parameters out of the loaded configuration.
    #[must_use]
    pub fn from_config(config: &'a ClusterConfig) -> Self {
        Self {
            image_id: &config.provider.image_id,
            instance_type: &config.provider.instance_type,
            key_name: &config.provider.key_name,
            subnet_id: &config.provider.subnet_id,
        }
    }
}

// ── Compute Provider Port ─────────────────────────────────────────────────────

/// The three compute API calls the cluster lifecycle needs.
///
/// Implementations report failures as `ClusterError::Provider` (or
/// `ClusterError::InstanceNotFound`) at the root of the returned error.
#[allow(async_fn_in_trait)]
pub trait ComputeProvider {
    /// Launch exactly `count` instances in one call.
    async fn run_instances(&self, spec: &LaunchSpec<'_>, count: usize) -> Result<Reservation>;

    /// Fresh status snapshot for `ids`.
    ///
    /// The contract is a single response covering every requested ID. Any
    /// ID missing from the result is treated as not ready by callers.
    async fn describe_instances(&self, ids: &[String]) -> Result<Vec<InstanceRef>>;

    /// Begin terminating `ids`. Returns once the provider acknowledged the
    /// request; teardown itself is asynchronous.
    async fn terminate_instances(&self, ids: &[String]) -> Result<()>;
}

impl<T: ComputeProvider> ComputeProvider for &T {
    async fn run_instances(&self, spec: &LaunchSpec<'_>, count: usize) -> Result<Reservation> {
        (**self).run_instances(spec, count).await
    }

    async fn describe_instances(&self, ids: &[String]) -> Result<Vec<InstanceRef>> {
        (**self).describe_instances(ids).await
    }

    async fn terminate_instances(&self, ids: &[String]) -> Result<()> {
        (**self).terminate_instances(ids).await
    }
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: std::time::Duration,
    ) -> Result<Output>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── State and Config Ports ────────────────────────────────────────────────────

/// Abstracts session state persistence (load/save/clear).
#[allow(async_fn_in_trait)]
pub trait SessionStateStore {
    /// Load the current session, returning `None` if no state exists.
    async fn load_async(&self) -> Result<Option<SessionState>>;
    /// Persist the given session.
    async fn save_async(&self, state: &SessionState) -> Result<()>;
    /// Forget the persisted session.
    async fn clear_async(&self) -> Result<()>;
}

/// Abstracts loading and saving the configuration file.
pub trait ConfigStore {
    /// Load configuration, falling back to defaults when no file exists.
    fn load(&self) -> Result<ClusterConfig>;
    /// Persist configuration.
    fn save(&self, config: &ClusterConfig) -> Result<()>;
    /// Location of the configuration file.
    fn path(&self) -> Result<PathBuf>;
}
