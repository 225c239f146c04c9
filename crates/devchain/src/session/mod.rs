//! Chain sessions: connection lifecycle, local chain state, transaction building and tracking.
//!
//! A [`ChainSession`] owns the connection to one node together with the state the library keeps
//! about that node: known accounts, a nonce cache, default signers per request kind, fee and gas
//! settings, and registries of submitted transactions and fetched blocks. Everything in
//! [`LocalState`] is captured by [`ChainSession::snapshot`] and restored by
//! [`ChainSession::revert`].

use core::fmt;
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use alloy_eips::BlockNumberOrTag;
use alloy_primitives::{Address, B256, U256};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    Block, ChainError, ChainInterface, ConfigError, JsonRpcClient, NodeDialect, Result,
    TransactionSigner, TxType,
};

mod builder;
mod connect;
mod registry;
mod snapshot;
mod submit;
mod wait;

pub use connect::*;
pub use registry::*;
pub use wait::*;

use registry::Registration;

/// What a transaction is being built for. Each kind has its own default sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// `eth_call`
    Call,
    /// A state-changing submission
    Tx,
    /// `eth_estimateGas`
    Estimate,
    /// `eth_createAccessList`
    AccessList,
}

impl RequestKind {
    /// All request kinds.
    pub const ALL: [Self; 4] = [Self::Call, Self::Tx, Self::Estimate, Self::AccessList];

    /// Returns the kind name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Tx => "tx",
            Self::Estimate => "estimate",
            Self::AccessList => "access_list",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default sender for each [`RequestKind`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultSigners([Option<Address>; 4]);

impl DefaultSigners {
    /// Returns the default sender for `kind`.
    pub const fn get(&self, kind: RequestKind) -> Option<Address> {
        self.0[kind as usize]
    }

    /// Sets or clears the default sender for `kind`.
    pub const fn set(&mut self, kind: RequestKind, account: Option<Address>) {
        self.0[kind as usize] = account;
    }
}

/// Whether the session drives a development node or a deployment target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionMode {
    /// Local dev node or fork; fees and limits are session settings
    #[default]
    Development,
    /// Live network; transactions are signed locally and fees are read from the node
    Deployment,
}

/// An account known to a session.
#[derive(Debug, Clone)]
pub struct Account {
    address: Address,
    signer: Option<Arc<dyn TransactionSigner>>,
}

impl Account {
    fn new(address: Address) -> Self {
        Self { address, signer: None }
    }

    /// The account address.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// The local signer for this account, if one was registered.
    pub fn signer(&self) -> Option<&Arc<dyn TransactionSigner>> {
        self.signer.as_ref()
    }
}

/// Session state that snapshots capture and reverts restore.
#[derive(Debug, Clone, Default)]
pub(crate) struct LocalState {
    pub(crate) nonces: HashMap<Address, u64>,
    pub(crate) accounts: BTreeMap<Address, Account>,
    pub(crate) default_signers: DefaultSigners,
    pub(crate) block_gas_limit: u64,
    pub(crate) txs: HashMap<B256, TransactionRecord>,
    pub(crate) blocks: BTreeMap<u64, Block>,
}

/// A connection to one node plus the state kept about it.
///
/// The session is registered in its [`SessionRegistry`] for as long as it lives; dropping it
/// (or calling [`ChainSession::disconnect`]) closes the connection and deregisters it.
#[derive(Debug)]
pub struct ChainSession {
    interface: ChainInterface,
    registration: Registration,
    mode: SessionMode,
    chain_id: u64,
    tx_type: TxType,
    require_signed_txs: bool,
    gas_price: u128,
    max_priority_fee_per_gas: u128,
    wait_options: WaitOptions,
    state: LocalState,
    snapshots: HashMap<String, LocalState>,
}

impl ChainSession {
    /// The RPC client of this session.
    pub const fn client(&self) -> &JsonRpcClient {
        self.interface.client()
    }

    /// The dialect-aware interface of this session.
    pub const fn interface(&self) -> &ChainInterface {
        &self.interface
    }

    /// Id of this session in its registry.
    pub const fn id(&self) -> u64 {
        self.registration.id()
    }

    /// The node dialect.
    pub const fn dialect(&self) -> NodeDialect {
        self.interface.dialect()
    }

    /// The session mode.
    pub const fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Chain id reported by the node at connect time.
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Closes the connection and removes the session from its registry.
    pub fn disconnect(self) {
        info!(session = self.id(), "Disconnecting");
    }

    /// Addresses of all known accounts, in address order.
    pub fn accounts(&self) -> Vec<Address> {
        self.state.accounts.keys().copied().collect()
    }

    /// Returns the account for `address`, adding it to the session on first reference.
    pub fn account(&mut self, address: Address) -> &Account {
        self.state.accounts.entry(address).or_insert_with(|| Account::new(address))
    }

    /// Registers a local signer and returns the address it signs for.
    pub fn register_signer(&mut self, signer: Arc<dyn TransactionSigner>) -> Address {
        let address = signer.address();
        self.state.accounts.insert(address, Account { address, signer: Some(signer) });
        debug!(%address, "Registered signer");
        address
    }

    /// The default sender for `kind`.
    pub const fn default_signer(&self, kind: RequestKind) -> Option<Address> {
        self.state.default_signers.get(kind)
    }

    /// Sets or clears the default sender for `kind`.
    pub fn set_default_signer(&mut self, kind: RequestKind, account: Option<Address>) {
        if let Some(address) = account {
            self.account(address);
        }
        self.state.default_signers.set(kind, account);
    }

    /// The default transaction type.
    pub const fn tx_type(&self) -> TxType {
        self.tx_type
    }

    /// Sets the default transaction type.
    pub const fn set_tx_type(&mut self, tx_type: TxType) {
        self.tx_type = tx_type;
    }

    /// Whether transactions are signed locally and sent raw.
    pub const fn require_signed_txs(&self) -> bool {
        self.require_signed_txs
    }

    /// Switches between node signing and local signing. Deployment sessions always sign locally.
    pub fn set_require_signed_txs(&mut self, required: bool) -> Result<()> {
        self.ensure_development("require_signed_txs")?;
        self.require_signed_txs = required;
        Ok(())
    }

    /// The gas price used for type 0 and 1 transactions without an explicit one.
    pub async fn gas_price(&self) -> Result<u128> {
        match self.mode {
            SessionMode::Development => Ok(self.gas_price),
            SessionMode::Deployment => self.client().eth_gas_price().await,
        }
    }

    /// Sets the session gas price.
    pub fn set_gas_price(&mut self, gas_price: u128) -> Result<()> {
        self.ensure_development("gas price")?;
        self.gas_price = gas_price;
        Ok(())
    }

    /// The priority fee used for type 2 transactions without an explicit one.
    pub async fn max_priority_fee_per_gas(&self) -> Result<u128> {
        match self.mode {
            SessionMode::Development => Ok(self.max_priority_fee_per_gas),
            SessionMode::Deployment => self.client().eth_max_priority_fee_per_gas().await,
        }
    }

    /// Sets the session priority fee.
    pub fn set_max_priority_fee_per_gas(&mut self, fee: u128) -> Result<()> {
        self.ensure_development("max priority fee")?;
        self.max_priority_fee_per_gas = fee;
        Ok(())
    }

    /// The block gas limit, used as the gas limit when none is given in development mode.
    pub async fn block_gas_limit(&self) -> Result<u64> {
        match self.mode {
            SessionMode::Development => Ok(self.state.block_gas_limit),
            SessionMode::Deployment => Ok(self.pending_block().await?.header.gas_limit),
        }
    }

    /// Sets the block gas limit on the node and in the session.
    pub async fn set_block_gas_limit(&mut self, limit: u64) -> Result<()> {
        self.ensure_development("block gas limit")?;
        self.interface.set_block_gas_limit(limit).await?;
        self.state.block_gas_limit = limit;
        Ok(())
    }

    /// Balance of `address` at the latest block.
    pub async fn balance(&self, address: Address) -> Result<U256> {
        self.client().eth_get_balance(address, BlockNumberOrTag::Latest).await
    }

    /// Sets the balance of `address`.
    pub async fn set_balance(&mut self, address: Address, balance: U256) -> Result<()> {
        self.interface.set_balance(address, balance).await?;
        self.account(address);
        Ok(())
    }

    /// The nonce the next transaction from `address` will use.
    ///
    /// Node-signing sessions answer from the nonce cache, filling it from the node on first
    /// use. Locally signing sessions always ask the node for the pending nonce.
    pub async fn nonce(&mut self, address: Address) -> Result<u64> {
        if self.require_signed_txs {
            return self.client().eth_get_transaction_count(address, BlockNumberOrTag::Pending).await;
        }
        if let Some(nonce) = self.state.nonces.get(&address) {
            return Ok(*nonce);
        }
        let nonce = self.client().eth_get_transaction_count(address, BlockNumberOrTag::Latest).await?;
        self.state.nonces.insert(address, nonce);
        self.account(address);
        Ok(nonce)
    }

    /// Lets the node sign for `address` without its key.
    pub async fn impersonate(&mut self, address: Address) -> Result<()> {
        self.interface.impersonate(address).await?;
        self.account(address);
        Ok(())
    }

    /// Stops impersonating `address`.
    pub async fn stop_impersonating(&self, address: Address) -> Result<()> {
        self.interface.stop_impersonating(address).await
    }

    /// Resets the node, optionally to a new fork, and forgets chain-derived local state.
    pub async fn reset(&mut self, options: Option<Value>) -> Result<()> {
        self.interface.reset(options).await?;
        self.state.nonces.clear();
        self.state.txs.clear();
        self.state.blocks.clear();
        self.snapshots.clear();
        if self.mode == SessionMode::Development {
            self.state.block_gas_limit = self.pending_block().await?.header.gas_limit;
        }
        info!(session = self.id(), "Chain reset");
        Ok(())
    }

    /// Returns a block, serving numbered blocks from the block registry when possible.
    pub async fn block(&mut self, selector: BlockNumberOrTag) -> Result<Block> {
        if let BlockNumberOrTag::Number(number) = selector {
            if let Some(block) = self.state.blocks.get(&number) {
                return Ok(block.clone());
            }
        }
        let block = self
            .client()
            .eth_get_block_by_number(selector, false)
            .await?
            .ok_or(ChainError::BlockNotFound(selector))?;
        // pending blocks are still changing
        if !selector.is_pending() {
            self.state.blocks.insert(block.header.number, block.clone());
        }
        Ok(block)
    }

    /// A transaction submitted through this session.
    pub fn transaction(&self, hash: &B256) -> Option<&TransactionRecord> {
        self.state.txs.get(hash)
    }

    /// All transactions submitted through this session.
    pub fn transactions(&self) -> impl Iterator<Item = &TransactionRecord> + '_ {
        self.state.txs.values()
    }

    /// Returns the node's execution trace of a mined transaction.
    pub async fn trace_transaction(&self, hash: B256, options: Option<Value>) -> Result<Value> {
        self.interface.trace_transaction(hash, options).await
    }

    pub(crate) async fn pending_block(&self) -> Result<Block> {
        self.client()
            .eth_get_block_by_number(BlockNumberOrTag::Pending, false)
            .await?
            .ok_or(ChainError::BlockNotFound(BlockNumberOrTag::Pending))
    }

    const fn ensure_development(&self, setting: &'static str) -> Result<()> {
        match self.mode {
            SessionMode::Development => Ok(()),
            SessionMode::Deployment => Err(ChainError::Config(ConfigError::ReadOnly(setting))),
        }
    }
}
