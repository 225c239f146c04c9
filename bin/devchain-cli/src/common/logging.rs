//! Tracing output of the CLI. Silent unless `-v` or `RUST_LOG` asks for it.

use std::path::PathBuf;

use clap::Args;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use super::Result;

/// Where session and JSON-RPC events are reported.
#[derive(Debug, Clone, Default, Args)]
pub struct LogArgs {
    /// Session log level: -v errors, -vv warnings, -vvv connects and submissions, -vvvv
    /// JSON-RPC exchanges, -vvvvv everything
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write the session log to this file rather than stderr
    #[arg(long = "log.file", visible_aliases = ["log-file"], global = true)]
    pub log_file: Option<PathBuf>,

    /// Plain stderr output without ANSI colors
    #[arg(long = "log.no-color", visible_aliases = ["log-no-color"], global = true)]
    pub log_no_color: bool,
}

impl LogArgs {
    /// The filter directive for the configured verbosity, `None` when logging is off.
    pub fn directive(&self) -> Option<String> {
        let level = match self.verbose {
            0 => return None,
            1 => Level::ERROR,
            2 => Level::WARN,
            3 => Level::INFO,
            4 => Level::DEBUG,
            _ => Level::TRACE,
        };
        Some(format!("devchain={level},devchain_cli={level}"))
    }

    /// Installs the global subscriber. `RUST_LOG` overrides `-v`.
    pub fn init(&self) -> Result<()> {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(self.directive().unwrap_or_else(|| "off".to_string()))
        };
        // targets tell rpc traffic apart from session events
        let show_target = self.verbose >= 4;

        if let Some(ref log_file) = self.log_file {
            let file = std::fs::File::create(log_file)?;
            fmt()
                .with_env_filter(filter)
                .with_target(show_target)
                .with_writer(file)
                .with_ansi(false)
                .init();
        } else {
            fmt()
                .with_env_filter(filter)
                .with_target(show_target)
                .with_writer(std::io::stderr)
                .with_ansi(!self.log_no_color)
                .init();
        }
        Ok(())
    }
}
