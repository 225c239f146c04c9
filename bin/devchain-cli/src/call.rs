use alloy_eips::BlockNumberOrTag;
use clap::Parser;
use devchain::SessionRegistry;
use tracing::debug;

use crate::common::{ConnectArgs, Result, TxArgs};

/// Execute a call without submitting a transaction
#[derive(Parser, Debug)]
pub struct Cmd {
    /// Connection configuration
    #[command(flatten)]
    pub connect_args: ConnectArgs,

    /// Transaction configuration
    #[command(flatten)]
    pub tx_args: TxArgs,

    /// Block to execute the call at (number, `latest`, `pending`, ...)
    #[arg(long = "block", default_value = "latest")]
    pub block: BlockNumberOrTag,

    /// Print the gas estimate instead of the call output
    #[arg(long = "estimate")]
    pub estimate: bool,
}

impl Cmd {
    /// Execute the call command
    pub async fn run(&self) -> Result<()> {
        let request = self.tx_args.to_request()?;
        let registry = SessionRegistry::new();
        let mut session = self.connect_args.connect(&registry).await?;

        if self.estimate {
            let gas = session.estimate_gas(&request, &[], None).await?;
            println!("{gas}");
        } else {
            let output = session.call(&request, &[], None, self.block).await?;
            debug!(len = output.len(), "Call returned");
            println!("{output}");
        }
        Ok(())
    }
}
