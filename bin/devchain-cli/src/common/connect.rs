//! Connection configuration for devchain

use std::{sync::Arc, time::Duration};

use clap::Args;
use devchain::{
    ChainSession, ConnectOptions, KeySigner, NodeDialect, RequestKind, SessionMode,
    SessionRegistry,
};
use tracing::debug;

use super::{CliError, Result};

/// Default JSON-RPC endpoint of a local development node.
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Connection configuration arguments
#[derive(Args, Debug, Clone)]
#[command(next_help_heading = "Connection Options")]
pub struct ConnectArgs {
    /// JSON-RPC endpoint of the node
    #[arg(
        long = "rpc-url",
        visible_aliases = ["rpc", "url"],
        env = "DEVCHAIN_RPC_URL",
        default_value = DEFAULT_RPC_URL
    )]
    pub rpc_url: String,

    /// Node dialect (anvil, hardhat, ganache, generic). Detected from `web3_clientVersion` when
    /// unset
    #[arg(long = "dialect")]
    pub dialect: Option<NodeDialect>,

    /// Connect in deployment mode: live fees, no dev-node setup, locally signed transactions
    #[arg(long = "deploy", visible_aliases = ["deployment"])]
    pub deploy: bool,

    /// Keep the node's gas price and base fee instead of zeroing them at connect time
    #[arg(long = "node-fees", conflicts_with = "deploy")]
    pub node_fees: bool,

    /// Expected chain id; connecting fails if the node reports another one
    #[arg(long = "chain-id", visible_aliases = ["chainid"])]
    pub chain_id: Option<u64>,

    /// Private key of the account to sign with. Makes it the default sender of every request
    #[arg(long = "private-key", env = "DEVCHAIN_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Fork the development node from this JSON-RPC endpoint before connecting
    #[arg(long = "fork", value_name = "URL")]
    pub fork: Option<String>,

    /// Block number to fork at [default: latest]
    #[arg(long = "fork.block", visible_aliases = ["fork-block"], requires = "fork")]
    pub fork_block: Option<u64>,

    /// Timeout of a single JSON-RPC request in seconds
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,
}

impl ConnectArgs {
    /// Builds the [`ConnectOptions`] described by the arguments.
    pub fn options(&self) -> ConnectOptions {
        let mut options = if self.deploy {
            ConnectOptions::deployment(&self.rpc_url)
        } else {
            ConnectOptions::new(&self.rpc_url)
        };
        if self.node_fees {
            options = options.with_node_fees();
        }
        if let Some(dialect) = self.dialect {
            options = options.with_dialect(dialect);
        }
        if let Some(chain_id) = self.chain_id {
            options = options.with_chain_id(chain_id);
        }
        if let Some(url) = &self.fork {
            options = options.with_fork(url, self.fork_block);
        }
        if let Some(timeout) = self.timeout {
            options = options.with_request_timeout(Duration::from_secs(timeout));
        }
        options
    }

    /// Connects a session and registers the signing key, if any.
    pub async fn connect(&self, registry: &SessionRegistry) -> Result<ChainSession> {
        let mut session = ChainSession::connect(registry, self.options()).await?;

        if let Some(key) = &self.private_key {
            let signer: KeySigner = key
                .parse()
                .map_err(|e| CliError::InvalidInput(format!("Invalid private key: {e}")))?;
            let address = session.register_signer(Arc::new(signer));
            for kind in RequestKind::ALL {
                session.set_default_signer(kind, Some(address));
            }
            if session.mode() == SessionMode::Development {
                session.set_require_signed_txs(true)?;
            }
            debug!(%address, "Signing locally");
        }

        Ok(session)
    }
}
