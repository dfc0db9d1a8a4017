//! `clusterboot up`: launch workers and wait until they are reachable.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::{LaunchSpec, SessionStateStore};
use crate::application::services::cluster::{
    CloudSession, ProvisionOptions, start_instances, wait_until_ready,
};
use crate::domain::SessionState;

/// Arguments for the up command.
#[derive(Args)]
pub struct UpArgs {
    /// Number of instances to launch
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub count: u32,

    /// Give up waiting after this many seconds (default: wait forever)
    #[arg(long, value_name = "SECS")]
    pub max_wait: Option<u64>,

    /// Seconds between status polls
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval: Option<u64>,
}

/// Run `clusterboot up`.
///
/// The reservation is persisted before waiting so an interrupted run still
/// leaves a record `clusterboot down` can reap.
///
/// # Errors
///
/// Returns an error if the launch, a status poll, or the session write fails.
pub async fn run(app: &AppContext, args: UpArgs) -> Result<ExitCode> {
    let config = app.load_config()?;
    let region = config.provider.region.as_str();

    let mut state = match app.session_store.load_async().await? {
        Some(state) if state.region != region => anyhow::bail!(
            "session {} was started in {}; run `clusterboot down` before launching in {region}",
            state.session_id,
            state.region
        ),
        Some(state) => state,
        None => SessionState::new(region),
    };

    let opts = ProvisionOptions {
        poll_interval: args
            .poll_interval
            .map_or_else(|| config.provisioning.poll_interval(), Duration::from_secs),
        max_wait: args
            .max_wait
            .map(Duration::from_secs)
            .or_else(|| config.provisioning.max_wait()),
    };

    let provider = app.provider(region);
    let mut session = CloudSession::with_reservations(&provider, state.to_reservations());
    let spec = LaunchSpec::from_config(&config);

    app.output.info(&format!(
        "Launching {} {} instances in {region}",
        args.count, spec.instance_type
    ));
    let ids = start_instances(&mut session, &spec, args.count as usize).await?;
    if let Some(reservation) = session.reservations().last() {
        state.record(reservation);
        app.session_store.save_async(&state).await?;
    }

    let reporter = app.reporter("waiting for instances...");
    let addresses = tokio::select! {
        result = wait_until_ready(session.provider(), &ids, &opts, &reporter) => result?,
        _ = tokio::signal::ctrl_c() => {
            reporter.finish();
            app.output.warn("Interrupted. Instances keep running; reap them with: clusterboot down");
            return Ok(ExitCode::from(130));
        }
    };

    app.renderer().render_addresses(&state.session_id, &addresses)?;
    Ok(ExitCode::SUCCESS)
}
