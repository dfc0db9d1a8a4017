//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator. Callers recover the typed value with
//! `anyhow::Error::downcast_ref` or [`classify`].

use std::path::PathBuf;

use thiserror::Error;

// ── Error kinds ───────────────────────────────────────────────────────────────

/// Coarse failure category, used for exit reporting and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A compute provider call (launch, describe, terminate) failed.
    Provider,
    /// An HTTP upload could not be delivered.
    Transfer,
    /// A local file could not be read or written.
    Storage,
    /// Invalid configuration or arguments.
    Config,
}

impl ErrorKind {
    /// Stable machine-readable code used in `--json` error objects.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Provider => "provider_error",
            Self::Transfer => "transfer_error",
            Self::Storage => "storage_error",
            Self::Config => "config_error",
        }
    }
}

// ── Cluster errors ────────────────────────────────────────────────────────────

/// Errors raised while provisioning, reaping, or moving files.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("{operation} failed: {message}")]
    Provider {
        operation: &'static str,
        message: String,
    },

    #[error("instance not found: {message}")]
    InstanceNotFound { message: String },

    #[error("only {ready} of {requested} instances were running when the wait deadline expired")]
    ReadyTimeout { ready: usize, requested: usize },

    #[error("transfer failed: {message}")]
    Transfer { message: String },

    #[error("cannot access {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("count must be at least 1")]
    InvalidCount,
}

impl ClusterError {
    /// The coarse category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Provider { .. } | Self::InstanceNotFound { .. } | Self::ReadyTimeout { .. } => {
                ErrorKind::Provider
            }
            Self::Transfer { .. } => ErrorKind::Transfer,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::InvalidCount => ErrorKind::Config,
        }
    }

    /// Whether repeating the same call could plausibly succeed.
    ///
    /// Nothing in this crate retries; the flag is for callers that do.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Provider { .. } | Self::Transfer { .. } | Self::ReadyTimeout { .. }
        )
    }
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nExpected: {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },
}

/// Find the error kind anywhere in an `anyhow` chain.
///
/// Returns `None` for errors that did not originate in this crate's typed
/// enums (for example a bare `anyhow!` message).
#[must_use]
pub fn classify(err: &anyhow::Error) -> Option<ErrorKind> {
    err.chain().find_map(|e| {
        if let Some(cluster) = e.downcast_ref::<ClusterError>() {
            Some(cluster.kind())
        } else if e.downcast_ref::<ConfigError>().is_some() {
            Some(ErrorKind::Config)
        } else {
            None
        }
    })
}
