use clap::Parser;
use devchain::{SessionRegistry, TransactionStatus};
use tracing::{info, warn};

use crate::common::{ConnectArgs, Result, TxArgs};

/// Build, submit and wait for a transaction
#[derive(Parser, Debug)]
pub struct Cmd {
    /// Connection configuration
    #[command(flatten)]
    pub connect_args: ConnectArgs,

    /// Transaction configuration
    #[command(flatten)]
    pub tx_args: TxArgs,

    /// Number of confirmations to wait for; 0 returns right after submission
    #[arg(long = "confirmations", visible_aliases = ["confirm"], default_value_t = 1)]
    pub confirmations: u64,
}

impl Cmd {
    /// Execute the send command
    pub async fn run(&self) -> Result<()> {
        let request = self.tx_args.to_request()?;
        let registry = SessionRegistry::new();
        let mut session = self.connect_args.connect(&registry).await?;

        let submitted = session.build_and_send(&request, &[], None).await?;
        println!("{}", submitted.hash());

        let record = session.wait(&submitted, Some(self.confirmations)).await?;
        match record.status() {
            TransactionStatus::Pending => return Ok(()),
            TransactionStatus::Success => info!(hash = %record.hash(), "Transaction succeeded"),
            TransactionStatus::Reverted => warn!(hash = %record.hash(), "Transaction reverted"),
        }

        if let Some(receipt) = record.receipt() {
            println!();
            println!("=== Receipt ===");
            println!("{}", serde_json::to_string_pretty(receipt)?);
        }
        Ok(())
    }
}
