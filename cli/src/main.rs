//! clusterboot - launch short-lived compute clusters and collect their results

#![cfg_attr(test, allow(clippy::expect_used))]

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use clusterboot_cli::cli::Cli;
use clusterboot_cli::domain::error::classify;
use clusterboot_cli::output::json::format_error;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let json = cli.json;

    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            let message = format!("{e:#}");
            let rendered = json
                .then(|| {
                    let code = classify(&e).map_or("error", |kind| kind.code());
                    format_error(&message, code).ok()
                })
                .flatten();
            match rendered {
                Some(obj) => println!("{obj}"),
                None => eprintln!("Error: {message}"),
            }
            ExitCode::FAILURE
        }
    }
}
