//! Instance reaping: terminate everything a session launched.

use anyhow::{Context, Result};

use crate::application::ports::ComputeProvider;
use crate::application::services::cluster::session::CloudSession;

/// Request termination of every instance recorded in `session`.
///
/// IDs are de-duplicated and sent in a single call. An empty session makes
/// no provider call. Returns the number of instances submitted.
///
/// The session is left untouched, so a failed or repeated call can simply
/// be retried; terminating an already-terminated instance is harmless.
///
/// # Errors
///
/// Returns an error if the provider rejects the request. Unknown IDs come
/// back as `ClusterError::InstanceNotFound`.
pub async fn terminate_all<P: ComputeProvider>(session: &CloudSession<P>) -> Result<usize> {
    let ids = session.instance_ids();
    if ids.is_empty() {
        tracing::debug!("no instances to terminate");
        return Ok(0);
    }

    tracing::info!(ids = ?ids, "terminating instances");
    session
        .provider()
        .terminate_instances(&ids)
        .await
        .context("terminating instances")?;
    Ok(ids.len())
}
