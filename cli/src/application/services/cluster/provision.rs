//! Instance provisioning: launch a reservation, then poll until every
//! instance in it is running with a public address.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::{Instant, MissedTickBehavior};

use crate::application::ports::{ComputeProvider, LaunchSpec, ProgressReporter};
use crate::application::services::cluster::session::CloudSession;
use crate::domain::error::ClusterError;
use crate::domain::instance::{Readiness, classify_poll};

/// Interval between status polls when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Wait-loop tuning.
#[derive(Debug, Clone, Copy)]
pub struct ProvisionOptions {
    /// Time between status polls. The first poll happens one interval
    /// after launch.
    pub poll_interval: Duration,
    /// Give up after this long. `None` waits indefinitely: an instance that
    /// is terminated out-of-band never becomes ready, so the loop then only
    /// ends when the process is interrupted.
    pub max_wait: Option<Duration>,
}

impl Default for ProvisionOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: None,
        }
    }
}

/// Launch `count` instances, record the reservation in `session`, and wait
/// until all of them are reachable.
///
/// Returns the public addresses in the order the final poll listed them.
/// `count == 0` is a no-op.
///
/// # Errors
///
/// Returns an error if the launch or any status poll fails, or if
/// `opts.max_wait` expires first.
pub async fn launch<P: ComputeProvider>(
    session: &mut CloudSession<P>,
    spec: &LaunchSpec<'_>,
    count: usize,
    opts: &ProvisionOptions,
    reporter: &impl ProgressReporter,
) -> Result<Vec<String>> {
    let ids = start_instances(session, spec, count).await?;
    wait_until_ready(session.provider(), &ids, opts, reporter).await
}

/// Issue the launch call and record the resulting reservation.
///
/// Returns the launched instance IDs.
///
/// # Errors
///
/// Returns an error if the provider rejects the launch.
pub async fn start_instances<P: ComputeProvider>(
    session: &mut CloudSession<P>,
    spec: &LaunchSpec<'_>,
    count: usize,
) -> Result<Vec<String>> {
    if count == 0 {
        return Ok(Vec::new());
    }

    tracing::info!(
        count,
        image_id = spec.image_id,
        instance_type = spec.instance_type,
        "launching instances"
    );
    let reservation = session
        .provider()
        .run_instances(spec, count)
        .await
        .context("launching instances")?;

    let ids: Vec<String> = reservation.instance_ids().map(str::to_owned).collect();
    tracing::info!(reservation = ?reservation.id, ids = ?ids, "reservation created");
    session.record(reservation);
    Ok(ids)
}

fn instances(n: usize) -> String {
    if n == 1 {
        "1 instance".to_string()
    } else {
        format!("{n} instances")
    }
}

/// Poll `ids` at `opts.poll_interval` until all are running.
///
/// # Errors
///
/// Returns the first failing poll's error unchanged in kind, or
/// `ClusterError::ReadyTimeout` once `opts.max_wait` elapses.
pub async fn wait_until_ready(
    provider: &impl ComputeProvider,
    ids: &[String],
    opts: &ProvisionOptions,
    reporter: &impl ProgressReporter,
) -> Result<Vec<String>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let period = opts.poll_interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let deadline = opts.max_wait.map(|d| Instant::now() + d);

    let requested = ids.len();
    let mut last_ready = None;
    reporter.step(&format!("waiting for {} to start...", instances(requested)));

    loop {
        match deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = ticker.tick() => {}
                    () = tokio::time::sleep_until(deadline) => {
                        return Err(ClusterError::ReadyTimeout {
                            ready: last_ready.unwrap_or(0),
                            requested,
                        }
                        .into());
                    }
                }
            }
            None => {
                ticker.tick().await;
            }
        }

        let observed = provider
            .describe_instances(ids)
            .await
            .context("polling instance status")?;

        match classify_poll(ids, &observed) {
            Readiness::AllReady(addresses) => {
                tracing::info!(addresses = ?addresses, "all instances running");
                reporter.success(&format!("{} running", instances(requested)));
                return Ok(addresses);
            }
            Readiness::Waiting { ready, requested } => {
                tracing::debug!(ready, requested, "instances not ready yet");
                if last_ready != Some(ready) {
                    reporter.step(&format!("{ready}/{requested} running"));
                    last_ready = Some(ready);
                }
            }
        }
    }
}
