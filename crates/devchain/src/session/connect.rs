use std::{collections::HashMap, sync::Arc, time::Duration};

use alloy_primitives::{Address, U256};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::{ChainSession, LocalState, RequestKind, SessionMode, SessionRegistry, WaitOptions};
use crate::{
    ChainError, ChainInterface, ConfigError, JsonRpcClient, NodeDialect, Result, RpcObserver,
    TxType,
};

/// Upstream chain to fork from when connecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkOptions {
    /// JSON-RPC URL of the upstream chain
    pub url: String,
    /// Block to fork at, latest when unset
    pub block_number: Option<u64>,
}

impl ForkOptions {
    fn reset_params(&self) -> Value {
        let mut forking = json!({ "jsonRpcUrl": self.url });
        if let Some(block_number) = self.block_number {
            forking["blockNumber"] = json!(block_number);
        }
        json!({ "forking": forking })
    }
}

/// How to connect a [`ChainSession`].
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Node URL
    pub uri: String,
    /// Development or deployment session
    pub mode: SessionMode,
    /// Skip dialect detection and assume this dialect
    pub dialect: Option<NodeDialect>,
    /// Expected chain id; connecting fails if the node reports another
    pub chain_id: Option<u64>,
    /// Load at most this many of the node's accounts
    pub accounts: Option<usize>,
    /// Re-fork the node from an upstream chain before use
    pub fork: Option<ForkOptions>,
    /// Minimum gas price to configure on the node, `0` by default in development sessions
    pub min_gas_price: Option<u128>,
    /// Base fee of the next block to configure on the node, `0` by default in development
    /// sessions
    pub block_base_fee_per_gas: Option<u128>,
    /// Accounts to fund at connect time
    pub funded_accounts: Vec<(Address, U256)>,
    /// Default transaction type
    pub tx_type: TxType,
    /// Per-request HTTP timeout
    pub request_timeout: Option<Duration>,
    /// Confirmation polling settings
    pub wait: WaitOptions,
    /// Diagnostic sink for all RPC traffic
    pub observer: Option<Arc<dyn RpcObserver>>,
}

impl ConnectOptions {
    /// Options for a development session against `uri`.
    ///
    /// The node is asked for a zero minimum gas price and a zero next-block base fee, so
    /// transactions are free unless configured otherwise.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            mode: SessionMode::Development,
            dialect: None,
            chain_id: None,
            accounts: None,
            fork: None,
            min_gas_price: Some(0),
            block_base_fee_per_gas: Some(0),
            funded_accounts: Vec::new(),
            tx_type: TxType::Legacy,
            request_timeout: None,
            wait: WaitOptions::default(),
            observer: None,
        }
    }

    /// Options for a deployment session against `uri`.
    pub fn deployment(uri: impl Into<String>) -> Self {
        Self {
            mode: SessionMode::Deployment,
            min_gas_price: None,
            block_base_fee_per_gas: None,
            ..Self::new(uri)
        }
    }

    /// Assumes `dialect` instead of detecting it.
    pub const fn with_dialect(mut self, dialect: NodeDialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Requires the node to run chain `chain_id`.
    pub const fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// Loads at most `accounts` node accounts.
    pub const fn with_accounts(mut self, accounts: usize) -> Self {
        self.accounts = Some(accounts);
        self
    }

    /// Forks from `url`, optionally at `block_number`.
    pub fn with_fork(mut self, url: impl Into<String>, block_number: Option<u64>) -> Self {
        self.fork = Some(ForkOptions { url: url.into(), block_number });
        self
    }

    /// Configures a minimum gas price on the node.
    pub const fn with_min_gas_price(mut self, price: u128) -> Self {
        self.min_gas_price = Some(price);
        self
    }

    /// Configures the base fee of the next block.
    pub const fn with_block_base_fee_per_gas(mut self, fee: u128) -> Self {
        self.block_base_fee_per_gas = Some(fee);
        self
    }

    /// Leaves the node's minimum gas price and base fee alone; the session then uses the
    /// node's `eth_gasPrice`.
    pub const fn with_node_fees(mut self) -> Self {
        self.min_gas_price = None;
        self.block_base_fee_per_gas = None;
        self
    }

    /// Funds `address` with `balance` at connect time.
    pub fn with_funded_account(mut self, address: Address, balance: U256) -> Self {
        self.funded_accounts.push((address, balance));
        self
    }

    /// Sets the default transaction type.
    pub const fn with_tx_type(mut self, tx_type: TxType) -> Self {
        self.tx_type = tx_type;
        self
    }

    /// Sets a per-request HTTP timeout.
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets confirmation polling options.
    pub const fn with_wait_options(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Attaches a diagnostic sink to the RPC client.
    pub fn with_observer(mut self, observer: Arc<dyn RpcObserver>) -> Self {
        self.observer = Some(observer);
        self
    }
}

impl ChainSession {
    /// Connects to the node described by `options` and registers the session in `registry`.
    ///
    /// The session is registered before setup starts, so a failed setup deregisters it again
    /// when the partially built session is dropped.
    pub async fn connect(registry: &SessionRegistry, options: ConnectOptions) -> Result<Self> {
        let registration = registry.register(&options.uri, options.mode);
        info!(session = registration.id(), uri = %options.uri, mode = ?options.mode, "Connecting");

        let mut client = JsonRpcClient::with_timeout(&options.uri, options.request_timeout)?;
        if let Some(observer) = options.observer.clone() {
            client = client.with_observer(observer);
        }
        let interface = ChainInterface::connect(client, options.dialect).await?;

        if let Some(fork) = &options.fork {
            interface.reset(Some(fork.reset_params())).await?;
            debug!(url = %fork.url, block = ?fork.block_number, "Forked");
        }

        let chain_id = interface.client().eth_chain_id().await?;
        if let Some(expected) = options.chain_id.filter(|expected| *expected != chain_id) {
            return Err(ConfigError::ChainIdMismatch { expected, actual: chain_id }.into());
        }
        registration.set_chain_id(chain_id);

        let mut session = Self {
            interface,
            registration,
            mode: options.mode,
            chain_id,
            tx_type: options.tx_type,
            require_signed_txs: options.mode == SessionMode::Deployment,
            gas_price: 0,
            max_priority_fee_per_gas: 0,
            wait_options: options.wait,
            state: LocalState::default(),
            snapshots: HashMap::new(),
        };
        session.load_node_accounts(options.accounts).await?;

        match options.mode {
            SessionMode::Development => session.setup_development(&options).await?,
            SessionMode::Deployment => {
                session.try_set_min_gas_price(options.min_gas_price).await?;
            }
        }

        info!(
            session = session.id(),
            chain_id,
            dialect = %session.dialect(),
            accounts = session.state.accounts.len(),
            "Connected"
        );
        Ok(session)
    }

    async fn load_node_accounts(&mut self, limit: Option<usize>) -> Result<()> {
        let accounts = self.client().eth_accounts().await?;
        let accounts: Vec<_> = accounts.into_iter().take(limit.unwrap_or(usize::MAX)).collect();
        for address in &accounts {
            self.account(*address);
        }
        if let Some(first) = accounts.first() {
            for kind in [RequestKind::Call, RequestKind::Estimate, RequestKind::AccessList] {
                self.state.default_signers.set(kind, Some(*first));
            }
        }
        Ok(())
    }

    async fn setup_development(&mut self, options: &ConnectOptions) -> Result<()> {
        for (address, balance) in &options.funded_accounts {
            self.set_balance(*address, *balance).await?;
        }

        if let Some(fee) = options.block_base_fee_per_gas {
            let result = self.interface.set_next_block_base_fee(fee).await;
            tolerate(result, "set next block base fee")?;
        }

        self.state.block_gas_limit = self.pending_block().await?.header.gas_limit;

        self.gas_price = match self.try_set_min_gas_price(options.min_gas_price).await? {
            Some(price) => price,
            None => self.client().eth_gas_price().await?,
        };
        self.max_priority_fee_per_gas = 0;
        Ok(())
    }

    /// Sets the node's minimum gas price if `price` is given; `Some(price)` on success.
    async fn try_set_min_gas_price(&self, price: Option<u128>) -> Result<Option<u128>> {
        let Some(price) = price else { return Ok(None) };
        let result = self.interface.set_min_gas_price(price).await;
        Ok(tolerate(result, "set min gas price")?.then_some(price))
    }
}

/// Swallows unsupported-operation and node errors of optional setup steps.
fn tolerate(result: Result<()>, operation: &str) -> Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(err @ (ChainError::Unsupported { .. } | ChainError::Protocol(_))) => {
            warn!(%err, "Failed to {operation}, continuing");
            Ok(false)
        }
        Err(err) => Err(err),
    }
}
