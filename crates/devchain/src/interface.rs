//! Dialect-aware access to dev-node extensions.

use core::{fmt, str::FromStr};

use alloy_primitives::{Address, B256, U256};
use serde_json::Value;
use tracing::debug;

use crate::{ChainError, JsonRpcClient, Result};

/// The family of dev-node extension methods a node understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeDialect {
    /// Foundry anvil (`anvil_*`, `evm_*`)
    Anvil,
    /// Hardhat network (`hardhat_*`, `evm_*`)
    Hardhat,
    /// Ganache (`evm_*`)
    Ganache,
    /// Any other node, typically a live network
    Generic,
}

impl NodeDialect {
    /// Detects the dialect from a `web3_clientVersion` string.
    pub fn from_client_version(version: &str) -> Self {
        let version = version.to_ascii_lowercase();
        if version.starts_with("anvil") {
            Self::Anvil
        } else if version.starts_with("hardhatnetwork") {
            Self::Hardhat
        } else if version.starts_with("ganache") || version.starts_with("ethereumjs testrpc") {
            Self::Ganache
        } else {
            Self::Generic
        }
    }

    /// Returns the dialect name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anvil => "anvil",
            Self::Hardhat => "hardhat",
            Self::Ganache => "ganache",
            Self::Generic => "generic",
        }
    }

    /// Whether the node supports `evm_snapshot` style dev-node methods.
    pub const fn is_dev_node(self) -> bool {
        !matches!(self, Self::Generic)
    }
}

impl fmt::Display for NodeDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anvil" => Ok(Self::Anvil),
            "hardhat" => Ok(Self::Hardhat),
            "ganache" => Ok(Self::Ganache),
            "generic" => Ok(Self::Generic),
            other => Err(format!("unknown node dialect: {other}")),
        }
    }
}

/// A [`JsonRpcClient`] paired with the dialect of the node behind it.
///
/// Dev-node operations dispatch to the dialect's method family. Operations the dialect lacks
/// fail with [`ChainError::Unsupported`] without touching the network.
#[derive(Debug)]
pub struct ChainInterface {
    client: JsonRpcClient,
    dialect: NodeDialect,
}

impl ChainInterface {
    /// Wraps `client`, detecting the dialect unless `dialect` is given.
    pub async fn connect(client: JsonRpcClient, dialect: Option<NodeDialect>) -> Result<Self> {
        let dialect = match dialect {
            Some(dialect) => dialect,
            None => {
                let version = client.web3_client_version().await?;
                let dialect = NodeDialect::from_client_version(&version);
                debug!(%version, %dialect, "Detected node dialect");
                dialect
            }
        };
        Ok(Self::new(client, dialect))
    }

    /// Wraps `client` with a known dialect.
    pub const fn new(client: JsonRpcClient, dialect: NodeDialect) -> Self {
        Self { client, dialect }
    }

    /// The underlying client.
    pub const fn client(&self) -> &JsonRpcClient {
        &self.client
    }

    /// The node dialect.
    pub const fn dialect(&self) -> NodeDialect {
        self.dialect
    }

    const fn unsupported(&self, operation: &'static str) -> ChainError {
        ChainError::Unsupported { operation, dialect: self.dialect }
    }

    /// Sets the balance of `address`.
    pub async fn set_balance(&self, address: Address, balance: U256) -> Result<()> {
        match self.dialect {
            NodeDialect::Anvil => self.client.anvil_set_balance(address, balance).await,
            NodeDialect::Hardhat => self.client.hardhat_set_balance(address, balance).await,
            NodeDialect::Ganache => self.client.evm_set_account_balance(address, balance).await,
            NodeDialect::Generic => Err(self.unsupported("set_balance")),
        }
    }

    /// Lets the node sign transactions from `address` without its key.
    pub async fn impersonate(&self, address: Address) -> Result<()> {
        match self.dialect {
            NodeDialect::Anvil => self.client.anvil_impersonate_account(address).await,
            NodeDialect::Hardhat => self.client.hardhat_impersonate_account(address).await,
            NodeDialect::Ganache => {
                self.client.evm_add_account(address, "").await?;
                self.client.personal_unlock_account(address, "", 0).await.map(drop)
            }
            NodeDialect::Generic => Err(self.unsupported("impersonate")),
        }
    }

    /// Reverses [`Self::impersonate`]. Ganache has no counterpart and does nothing.
    pub async fn stop_impersonating(&self, address: Address) -> Result<()> {
        match self.dialect {
            NodeDialect::Anvil => self.client.anvil_stop_impersonating_account(address).await,
            NodeDialect::Hardhat => self.client.hardhat_stop_impersonating_account(address).await,
            NodeDialect::Ganache => Ok(()),
            NodeDialect::Generic => Err(self.unsupported("stop_impersonating")),
        }
    }

    /// Resets the chain, optionally to a new fork described by `options`.
    pub async fn reset(&self, options: Option<Value>) -> Result<()> {
        match self.dialect {
            NodeDialect::Anvil => self.client.anvil_reset(options).await,
            NodeDialect::Hardhat => self.client.hardhat_reset(options).await,
            NodeDialect::Ganache | NodeDialect::Generic => Err(self.unsupported("reset")),
        }
    }

    /// Sets the minimum gas price the node accepts.
    pub async fn set_min_gas_price(&self, price: u128) -> Result<()> {
        match self.dialect {
            NodeDialect::Anvil => self.client.anvil_set_min_gas_price(price).await,
            NodeDialect::Hardhat => self.client.hardhat_set_min_gas_price(price).await,
            NodeDialect::Ganache | NodeDialect::Generic => {
                Err(self.unsupported("set_min_gas_price"))
            }
        }
    }

    /// Sets the base fee of the next mined block.
    pub async fn set_next_block_base_fee(&self, fee: u128) -> Result<()> {
        match self.dialect {
            NodeDialect::Anvil => self.client.anvil_set_next_block_base_fee_per_gas(fee).await,
            NodeDialect::Hardhat => self.client.hardhat_set_next_block_base_fee_per_gas(fee).await,
            NodeDialect::Ganache | NodeDialect::Generic => {
                Err(self.unsupported("set_next_block_base_fee"))
            }
        }
    }

    /// Takes a node-side snapshot and returns its id.
    pub async fn snapshot(&self) -> Result<String> {
        if !self.dialect.is_dev_node() {
            return Err(self.unsupported("snapshot"));
        }
        self.client.evm_snapshot().await
    }

    /// Reverts the node to a snapshot; `false` if the node refused.
    pub async fn revert(&self, snapshot_id: &str) -> Result<bool> {
        if !self.dialect.is_dev_node() {
            return Err(self.unsupported("revert"));
        }
        self.client.evm_revert(snapshot_id).await
    }

    /// Sets the block gas limit of subsequent blocks.
    pub async fn set_block_gas_limit(&self, limit: u64) -> Result<()> {
        if !self.dialect.is_dev_node() {
            return Err(self.unsupported("set_block_gas_limit"));
        }
        self.client.evm_set_block_gas_limit(limit).await
    }

    /// Returns the execution trace of a mined transaction.
    pub async fn trace_transaction(&self, hash: B256, options: Option<Value>) -> Result<Value> {
        self.client.debug_trace_transaction(hash, options).await
    }
}
