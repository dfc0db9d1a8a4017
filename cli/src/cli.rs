//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::commands;

/// Launch short-lived compute clusters and collect their results
#[derive(Parser)]
#[command(
    name = "clusterboot",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output (also set by a non-empty NO_COLOR)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Launch instances and wait until they are running
    Up(commands::up::UpArgs),

    /// Show the instances of the current session
    Status,

    /// Terminate every instance of the current session
    Down(commands::down::DownArgs),

    /// Accept a fixed number of file uploads, then exit
    Receive(commands::receive::ReceiveArgs),

    /// Upload one file to a receiver
    Send(commands::send::SendArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            verbose: _,
            command,
        } = self;
        let yes = matches!(&command, Command::Down(args) if args.yes);
        let app = AppContext::new(&AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            behaviour: BehaviourFlags { yes },
        })?;

        match command {
            Command::Up(args) => commands::up::run(&app, args).await,
            Command::Status => commands::status::run(&app).await,
            Command::Down(args) => commands::down::run(&app, &args).await,
            Command::Receive(args) => commands::receive::run(&app, args).await,
            Command::Send(args) => commands::send::run(&app, args).await,
            Command::Config(cmd) => commands::config::run(&app, cmd),
            Command::Version => commands::version::run(&app),
        }
    }
}
