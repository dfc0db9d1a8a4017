//! `clusterboot down`: terminate every instance of the persisted session.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::SessionStateStore;
use crate::application::services::cluster::{CloudSession, terminate_all};
use crate::domain::ClusterError;

/// Arguments for the down command.
#[derive(Args)]
pub struct DownArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Run `clusterboot down`.
///
/// The session file is cleared once the provider accepted the request, or
/// when it reports the instances as already gone.
///
/// # Errors
///
/// Returns an error if the prompt, the terminate call, or the session file
/// operation fails.
pub async fn run(app: &AppContext, args: &DownArgs) -> Result<ExitCode> {
    let Some(state) = app.session_store.load_async().await? else {
        app.renderer().render_terminated(&[])?;
        return Ok(ExitCode::SUCCESS);
    };

    let ids = state.instance_ids();
    if !ids.is_empty()
        && !args.yes
        && !app.confirm(&format!("Terminate {} instances?", ids.len()), true)?
    {
        app.output.info("Cancelled.");
        return Ok(ExitCode::SUCCESS);
    }

    let provider = app.provider(&state.region);
    let session = CloudSession::with_reservations(&provider, state.to_reservations());
    match terminate_all(&session).await {
        Ok(_) => {}
        Err(e)
            if matches!(
                e.downcast_ref::<ClusterError>(),
                Some(ClusterError::InstanceNotFound { .. })
            ) =>
        {
            tracing::warn!(error = %format!("{e:#}"), "instances already gone");
            app.output.warn(&format!("{e:#}"));
        }
        Err(e) => return Err(e),
    }

    app.session_store.clear_async().await?;
    app.renderer().render_terminated(&ids)?;
    Ok(ExitCode::SUCCESS)
}
