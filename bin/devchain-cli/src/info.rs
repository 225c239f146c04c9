use clap::Parser;
use devchain::SessionRegistry;
use tracing::info;

use crate::common::{ConnectArgs, Result};

/// Show chain id, dialect, fees and accounts of a node
#[derive(Parser, Debug)]
pub struct Cmd {
    /// Connection configuration
    #[command(flatten)]
    pub connect_args: ConnectArgs,

    /// Also print the balance of every account
    #[arg(long = "balances")]
    pub balances: bool,
}

impl Cmd {
    /// Execute the info command
    pub async fn run(&self) -> Result<()> {
        let registry = SessionRegistry::new();
        let session = self.connect_args.connect(&registry).await?;
        info!(uri = %self.connect_args.rpc_url, "Connected");

        println!("chain id:        {}", session.chain_id());
        println!("dialect:         {}", session.dialect());
        println!("mode:            {:?}", session.mode());
        println!("block gas limit: {}", session.block_gas_limit().await?);
        println!("gas price:       {}", session.gas_price().await?);

        println!();
        println!("=== Accounts ===");
        for address in session.accounts() {
            if self.balances {
                println!("{address} {}", session.balance(address).await?);
            } else {
                println!("{address}");
            }
        }

        session.disconnect();
        Ok(())
    }
}
