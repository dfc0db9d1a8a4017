//! `clusterboot send`: upload one file to a receiving coordinator.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::domain::TransferTarget;
use crate::infra::file_sender;

/// Arguments for the send command.
#[derive(Args)]
pub struct SendArgs {
    /// Address of the receiving host
    #[arg(short, long)]
    pub address: String,

    /// File to upload
    #[arg(short, long)]
    pub file: PathBuf,

    /// Receiver port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Upload path
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Multipart form field carrying the file
    #[arg(long)]
    pub field: Option<String>,
}

/// Run `clusterboot send`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the upload fails.
pub async fn run(app: &AppContext, args: SendArgs) -> Result<ExitCode> {
    let config = app.load_config()?;
    let target = TransferTarget {
        address: args.address,
        port: args.port.unwrap_or(config.transfer.port),
        endpoint: args.endpoint.unwrap_or(config.transfer.endpoint),
        form_field: args.field.unwrap_or(config.transfer.form_field),
        file_path: args.file,
    };

    let bytes = file_sender::send(&target).await?;
    app.renderer().render_sent(&target.url(), bytes)?;
    Ok(ExitCode::SUCCESS)
}
