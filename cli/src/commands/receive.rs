//! `clusterboot receive`: accept a fixed number of uploads, then exit.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::infra::upload_server::{BoundedFileServer, UploadServerConfig};

/// Arguments for the receive command.
#[derive(Args)]
pub struct ReceiveArgs {
    /// Number of uploads to accept
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub count: u32,

    /// Port to listen on (0 picks a free one)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Upload path
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Multipart form field carrying the file
    #[arg(long)]
    pub field: Option<String>,

    /// Directory uploads are written to
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

/// Run `clusterboot receive`.
///
/// # Errors
///
/// Returns an error if the server cannot start or stops unexpectedly.
pub async fn run(app: &AppContext, args: ReceiveArgs) -> Result<ExitCode> {
    let config = app.load_config()?;
    let mut server_config = UploadServerConfig::from_transfer(&config.transfer, args.count as usize);
    if let Some(endpoint) = args.endpoint {
        server_config.endpoint = endpoint;
    }
    if let Some(field) = args.field {
        server_config.form_field = field;
    }
    if let Some(dir) = args.dir {
        server_config.storage_root = dir;
    }
    let port = args.port.unwrap_or(config.transfer.port);

    let server =
        BoundedFileServer::bind(SocketAddr::from(([0, 0, 0, 0], port)), server_config).await?;
    app.output.info(&format!(
        "Waiting for {} uploads on {}",
        args.count,
        server.local_addr()?
    ));

    let report = tokio::select! {
        report = server.serve() => report?,
        _ = tokio::signal::ctrl_c() => {
            app.output.warn("Interrupted before all uploads arrived");
            return Ok(ExitCode::from(130));
        }
    };

    app.renderer()
        .render_received(&report.stored, report.forced_close)?;
    Ok(ExitCode::SUCCESS)
}
