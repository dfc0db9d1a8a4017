//! `clusterboot status`: describe the instances of the persisted session.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::ports::SessionStateStore;
use crate::application::services::cluster::CloudSession;

/// Run `clusterboot status`.
///
/// # Errors
///
/// Returns an error if the session file is unreadable or the describe call
/// fails.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let Some(state) = app.session_store.load_async().await? else {
        app.renderer().render_instances(None, &[])?;
        return Ok(ExitCode::SUCCESS);
    };

    let provider = app.provider(&state.region);
    let session = CloudSession::with_reservations(&provider, state.to_reservations());
    let instances = session.describe().await?;

    app.renderer()
        .render_instances(Some(&state.session_id), &instances)?;
    Ok(ExitCode::SUCCESS)
}
