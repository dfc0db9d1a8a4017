//! Infrastructure implementation of the `ComputeProvider` port.
//!
//! `AwsCliProvider<R>` drives the `aws ec2` command line through a
//! `CommandRunner` and parses its `--output json` responses. Credentials and
//! pagination are handled by the CLI itself.

use std::process::Output;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::application::ports::{CommandRunner, ComputeProvider, LaunchSpec};
use crate::domain::error::ClusterError;
use crate::domain::instance::{InstanceRef, InstanceState, Reservation};
use crate::infra::command_runner::TokioCommandRunner;

const AWS: &str = "aws";
const NOT_FOUND_CODE: &str = "InvalidInstanceID.NotFound";

// ── Response shapes ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RunInstancesOutput {
    #[serde(default)]
    reservation_id: Option<String>,
    #[serde(default)]
    instances: Vec<Ec2Instance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeInstancesOutput {
    #[serde(default)]
    reservations: Vec<Ec2Reservation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Ec2Reservation {
    #[serde(default)]
    instances: Vec<Ec2Instance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Ec2Instance {
    instance_id: String,
    #[serde(default)]
    state: Option<Ec2State>,
    #[serde(default)]
    public_ip_address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Ec2State {
    name: String,
}

impl From<Ec2Instance> for InstanceRef {
    fn from(i: Ec2Instance) -> Self {
        Self {
            id: i.instance_id,
            state: i
                .state
                .map_or(InstanceState::Unknown, |s| InstanceState::from_provider(&s.name)),
            public_address: i.public_ip_address.filter(|a| !a.is_empty()),
        }
    }
}

// ── Provider ──────────────────────────────────────────────────────────────────

/// Compute provider backed by the `aws` CLI.
///
/// Generic over `R: CommandRunner` so that tests can inject a mock runner
/// without spawning real processes.
pub struct AwsCliProvider<R: CommandRunner> {
    runner: R,
    region: String,
}

impl<R: CommandRunner> AwsCliProvider<R> {
    pub fn new(runner: R, region: impl Into<String>) -> Self {
        Self {
            runner,
            region: region.into(),
        }
    }

    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Run `aws ec2 <operation> --region R <args> --output json` and return
    /// stdout on success.
    async fn ec2(&self, operation: &'static str, args: &[&str]) -> Result<Vec<u8>> {
        let mut full = vec!["ec2", operation, "--region", self.region.as_str()];
        full.extend_from_slice(args);
        full.extend_from_slice(&["--output", "json"]);

        let output = self
            .runner
            .run(AWS, &full)
            .await
            .map_err(|e| ClusterError::Provider {
                operation,
                message: format!("{e:#}"),
            })?;
        check(operation, output)
    }
}

impl AwsCliProvider<TokioCommandRunner> {
    /// Convenience constructor for production use.
    #[must_use]
    pub fn default_runner(region: impl Into<String>) -> Self {
        Self::new(TokioCommandRunner::default(), region)
    }
}

/// Turn a non-zero exit into a typed error carrying the CLI's stderr.
fn check(operation: &'static str, output: Output) -> Result<Vec<u8>> {
    if output.status.success() {
        return Ok(output.stdout);
    }
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let message = if stderr.is_empty() {
        format!("aws exited with {}", output.status)
    } else {
        stderr
    };
    if message.contains(NOT_FOUND_CODE) {
        return Err(ClusterError::InstanceNotFound { message }.into());
    }
    Err(ClusterError::Provider { operation, message }.into())
}

fn parse<T: serde::de::DeserializeOwned>(operation: &'static str, stdout: &[u8]) -> Result<T> {
    serde_json::from_slice(stdout)
        .map_err(|e| ClusterError::Provider {
            operation,
            message: format!("unexpected response: {e}"),
        })
        .with_context(|| format!("parsing {operation} output"))
}

impl<R: CommandRunner> ComputeProvider for AwsCliProvider<R> {
    async fn run_instances(&self, spec: &LaunchSpec<'_>, count: usize) -> Result<Reservation> {
        let count = count.to_string();
        let stdout = self
            .ec2(
                "run-instances",
                &[
                    "--image-id",
                    spec.image_id,
                    "--instance-type",
                    spec.instance_type,
                    "--key-name",
                    spec.key_name,
                    "--subnet-id",
                    spec.subnet_id,
                    "--count",
                    &count,
                ],
            )
            .await?;
        let out: RunInstancesOutput = parse("run-instances", &stdout)?;
        Ok(Reservation {
            id: out.reservation_id,
            instances: out.instances.into_iter().map(InstanceRef::from).collect(),
        })
    }

    async fn describe_instances(&self, ids: &[String]) -> Result<Vec<InstanceRef>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut args = vec!["--instance-ids"];
        args.extend(ids.iter().map(String::as_str));
        let stdout = self.ec2("describe-instances", &args).await?;
        let out: DescribeInstancesOutput = parse("describe-instances", &stdout)?;
        Ok(out
            .reservations
            .into_iter()
            .flat_map(|r| r.instances)
            .map(InstanceRef::from)
            .collect())
    }

    async fn terminate_instances(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut args = vec!["--instance-ids"];
        args.extend(ids.iter().map(String::as_str));
        self.ec2("terminate-instances", &args).await?;
        Ok(())
    }
}
