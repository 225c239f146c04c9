use clap::{Parser, Subcommand};

use crate::common::{CliError, LogArgs};

/// Main command of the devchain CLI tool
#[derive(Parser, Debug)]
#[command(name = "devchain", infer_subcommands = true, version = "0.1")]
pub struct MainCmd {
    /// Logging configuration
    #[command(flatten)]
    pub log_args: LogArgs,

    /// Sub-command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Sub-commands of the devchain CLI tool
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show chain id, dialect, fees and accounts of a node
    Info(crate::info::Cmd),
    /// Execute a call without submitting a transaction
    Call(crate::call::Cmd),
    /// Build, submit and wait for a transaction
    Send(crate::send::Cmd),
}

/// Error types for the main command system
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error of a sub-command
    #[error("{0}")]
    Cli(#[from] CliError),
}

impl MainCmd {
    /// Execute the main command
    pub async fn run(&self) -> Result<(), Error> {
        match &self.command {
            Command::Info(cmd) => cmd.run().await?,
            Command::Call(cmd) => cmd.run().await?,
            Command::Send(cmd) => cmd.run().await?,
        }
        Ok(())
    }
}
