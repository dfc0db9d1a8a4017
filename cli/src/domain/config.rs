//! Domain types and validators for clusterboot configuration.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "provider.region",
    "provider.image_id",
    "provider.instance_type",
    "provider.key_name",
    "provider.subnet_id",
    "provisioning.poll_interval_secs",
    "provisioning.max_wait_secs",
    "transfer.port",
    "transfer.endpoint",
    "transfer.form_field",
    "transfer.storage_root",
    "transfer.monitor_interval_ms",
    "transfer.shutdown_grace_secs",
    "transfer.max_body_bytes",
];

static REGION_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[a-z]{2}(-[a-z]+)+-[0-9]$").expect("valid regex")
});

static IMAGE_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^ami-[0-9a-f]{8,17}$").expect("valid regex")
});

static SUBNET_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^subnet-[0-9a-f]{8,17}$").expect("valid regex")
});

static INSTANCE_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[a-z][a-z0-9-]*\.[a-z0-9]+$").expect("valid regex")
});

static FORM_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z0-9_.-]{1,64}$").expect("valid regex")
});

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.clusterboot/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ClusterConfig {
    pub provider: ProviderConfig,
    pub provisioning: ProvisioningConfig,
    pub transfer: TransferConfig,
}

/// Fixed launch parameters for worker instances.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProviderConfig {
    pub region: String,
    /// Image the workers boot; it must start the file receiver on boot.
    pub image_id: String,
    pub instance_type: String,
    pub key_name: String,
    /// Subnet must auto-assign public IP addresses.
    pub subnet_id: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            image_id: "ami-130bdd69".to_string(),
            instance_type: "t2.micro".to_string(),
            key_name: "autodeploy-keypair".to_string(),
            subnet_id: "subnet-c8221ac4".to_string(),
        }
    }
}

/// Provisioning wait-loop settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProvisioningConfig {
    pub poll_interval_secs: u64,
    /// `None` waits until every instance is running, however long that takes.
    pub max_wait_secs: Option<u64>,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            max_wait_secs: None,
        }
    }
}

impl ProvisioningConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    #[must_use]
    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_secs.map(Duration::from_secs)
    }
}

/// Upload endpoint settings shared by `receive` and `send`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransferConfig {
    pub port: u16,
    pub endpoint: String,
    pub form_field: String,
    pub storage_root: PathBuf,
    pub monitor_interval_ms: u64,
    pub shutdown_grace_secs: u64,
    pub max_body_bytes: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            port: 59385,
            endpoint: "/upload".to_string(),
            form_field: "file".to_string(),
            storage_root: PathBuf::from("results"),
            monitor_interval_ms: 5_000,
            shutdown_grace_secs: 10,
            max_body_bytes: 100_000_000,
        }
    }
}

impl TransferConfig {
    #[must_use]
    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }

    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

fn invalid(key: &str, value: &str, expected: &str) -> anyhow::Error {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    }
    .into()
}

fn positive<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(invalid(key, value, "a positive integer")),
    }
}

fn matching(re: &Regex, key: &str, value: &str, expected: &str) -> Result<()> {
    if re.is_match(value) {
        Ok(())
    } else {
        Err(invalid(key, value, expected))
    }
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the key is unknown or the value is not valid for it.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    validate_config_key(key)?;
    match key {
        "provider.region" => matching(&REGION_RE, key, value, "a region such as us-east-1"),
        "provider.image_id" => matching(&IMAGE_ID_RE, key, value, "an image ID (ami-...)"),
        "provider.subnet_id" => matching(&SUBNET_ID_RE, key, value, "a subnet ID (subnet-...)"),
        "provider.instance_type" => {
            matching(&INSTANCE_TYPE_RE, key, value, "an instance type such as t2.micro")
        }
        "provider.key_name" if value.trim().is_empty() => {
            Err(invalid(key, value, "a non-empty key pair name"))
        }
        "provisioning.poll_interval_secs"
        | "transfer.monitor_interval_ms"
        | "transfer.shutdown_grace_secs" => positive::<u64>(key, value).map(drop),
        "provisioning.max_wait_secs" if value == "none" => Ok(()),
        "provisioning.max_wait_secs" => positive::<u64>(key, value)
            .map(drop)
            .map_err(|_| invalid(key, value, "a positive integer or 'none'")),
        "transfer.port" => positive::<u16>(key, value).map(drop),
        "transfer.max_body_bytes" => positive::<usize>(key, value).map(drop),
        "transfer.endpoint" if !value.starts_with('/') || value.contains(char::is_whitespace) => {
            Err(invalid(key, value, "a path starting with '/'"))
        }
        "transfer.form_field" => matching(&FORM_FIELD_RE, key, value, "[A-Za-z0-9_.-]{1,64}"),
        "transfer.storage_root" if value.is_empty() => {
            Err(invalid(key, value, "a non-empty directory path"))
        }
        _ => Ok(()),
    }
}

/// Validate `value` for `key` and write it into `config`.
///
/// # Errors
///
/// Returns an error if the key or value is invalid.
pub fn apply_config_value(config: &mut ClusterConfig, key: &str, value: &str) -> Result<()> {
    validate_config_value(key, value)?;
    match key {
        "provider.region" => config.provider.region = value.to_string(),
        "provider.image_id" => config.provider.image_id = value.to_string(),
        "provider.instance_type" => config.provider.instance_type = value.to_string(),
        "provider.key_name" => config.provider.key_name = value.to_string(),
        "provider.subnet_id" => config.provider.subnet_id = value.to_string(),
        "provisioning.poll_interval_secs" => {
            config.provisioning.poll_interval_secs = positive(key, value)?;
        }
        "provisioning.max_wait_secs" => {
            config.provisioning.max_wait_secs = if value == "none" {
                None
            } else {
                Some(positive(key, value)?)
            };
        }
        "transfer.port" => config.transfer.port = positive(key, value)?,
        "transfer.endpoint" => config.transfer.endpoint = value.to_string(),
        "transfer.form_field" => config.transfer.form_field = value.to_string(),
        "transfer.storage_root" => config.transfer.storage_root = PathBuf::from(value),
        "transfer.monitor_interval_ms" => {
            config.transfer.monitor_interval_ms = positive(key, value)?;
        }
        "transfer.shutdown_grace_secs" => {
            config.transfer.shutdown_grace_secs = positive(key, value)?;
        }
        "transfer.max_body_bytes" => config.transfer.max_body_bytes = positive(key, value)?,
        other => anyhow::bail!("setting {other} cannot be changed"),
    }
    Ok(())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
