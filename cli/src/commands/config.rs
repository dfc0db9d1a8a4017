//! `clusterboot config`: show and set configuration values.

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::application::services::config_service;

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Set configuration value
    Set {
        /// Configuration key, e.g. provider.region
        key: String,
        /// Configuration value
        value: String,
    },
}

/// Run the config command.
///
/// # Errors
///
/// Returns an error if the key or value is invalid or the file cannot be
/// read or written.
pub fn run(app: &AppContext, cmd: ConfigCommand) -> Result<ExitCode> {
    match cmd {
        ConfigCommand::Show => {
            let config = config_service::load_config(&app.config_store)?;
            let path = app.config_store.path()?;
            app.renderer().render_config(&config, &path)?;
        }
        ConfigCommand::Set { key, value } => {
            let config = config_service::set_value(&app.config_store, &key, &value)?;
            if app.is_json() {
                app.renderer()
                    .render_config(&config, &app.config_store.path()?)?;
            } else {
                app.output.success(&format!("Set {key} = {value}"));
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
