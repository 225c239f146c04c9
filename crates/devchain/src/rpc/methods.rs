//! Typed wrappers, one per node method.

use alloy_eips::BlockNumberOrTag;
use alloy_primitives::{Address, Bytes, B256, U128, U256, U64};
use serde_json::{json, Value};

use super::{quantity, AccessListResult, Block, JsonRpcClient, TransactionReceipt};
use crate::{Result, TxParams};

impl JsonRpcClient {
    async fn request_u64(&self, method: &str, params: Vec<Value>) -> Result<u64> {
        Ok(self.request::<U64>(method, params).await?.to())
    }

    async fn request_u128(&self, method: &str, params: Vec<Value>) -> Result<u128> {
        Ok(self.request::<U128>(method, params).await?.to())
    }

    /// `eth_getBlockByNumber`; `None` when the node has no such block.
    pub async fn eth_get_block_by_number(
        &self,
        block: BlockNumberOrTag,
        include_transactions: bool,
    ) -> Result<Option<Block>> {
        self.request("eth_getBlockByNumber", vec![json!(block), json!(include_transactions)]).await
    }

    /// `eth_blockNumber`
    pub async fn eth_block_number(&self) -> Result<u64> {
        self.request_u64("eth_blockNumber", vec![]).await
    }

    /// `eth_chainId`
    pub async fn eth_chain_id(&self) -> Result<u64> {
        self.request_u64("eth_chainId", vec![]).await
    }

    /// `eth_accounts`
    pub async fn eth_accounts(&self) -> Result<Vec<Address>> {
        self.request("eth_accounts", vec![]).await
    }

    /// `eth_call`
    pub async fn eth_call(&self, tx: &TxParams, block: BlockNumberOrTag) -> Result<Bytes> {
        self.request("eth_call", vec![json!(tx), json!(block)]).await
    }

    /// `eth_estimateGas`
    pub async fn eth_estimate_gas(&self, tx: &TxParams, block: BlockNumberOrTag) -> Result<u64> {
        self.request_u64("eth_estimateGas", vec![json!(tx), json!(block)]).await
    }

    /// `eth_createAccessList`
    pub async fn eth_create_access_list(
        &self,
        tx: &TxParams,
        block: BlockNumberOrTag,
    ) -> Result<AccessListResult> {
        self.request("eth_createAccessList", vec![json!(tx), json!(block)]).await
    }

    /// `eth_gasPrice`
    pub async fn eth_gas_price(&self) -> Result<u128> {
        self.request_u128("eth_gasPrice", vec![]).await
    }

    /// `eth_maxPriorityFeePerGas`
    pub async fn eth_max_priority_fee_per_gas(&self) -> Result<u128> {
        self.request_u128("eth_maxPriorityFeePerGas", vec![]).await
    }

    /// `eth_getBalance`
    pub async fn eth_get_balance(&self, address: Address, block: BlockNumberOrTag) -> Result<U256> {
        self.request("eth_getBalance", vec![json!(address), json!(block)]).await
    }

    /// `eth_getTransactionCount`
    pub async fn eth_get_transaction_count(
        &self,
        address: Address,
        block: BlockNumberOrTag,
    ) -> Result<u64> {
        self.request_u64("eth_getTransactionCount", vec![json!(address), json!(block)]).await
    }

    /// `eth_sendTransaction`
    pub async fn eth_send_transaction(&self, tx: &TxParams) -> Result<B256> {
        self.request("eth_sendTransaction", vec![json!(tx)]).await
    }

    /// `eth_sendRawTransaction`
    pub async fn eth_send_raw_transaction(&self, raw: &Bytes) -> Result<B256> {
        self.request("eth_sendRawTransaction", vec![json!(raw)]).await
    }

    /// `eth_getTransactionReceipt`; `None` while the transaction is pending.
    pub async fn eth_get_transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>> {
        self.request("eth_getTransactionReceipt", vec![json!(hash)]).await
    }

    /// `hardhat_setBalance`
    pub async fn hardhat_set_balance(&self, address: Address, balance: U256) -> Result<()> {
        self.call("hardhat_setBalance", vec![json!(address), json!(balance)]).await.map(drop)
    }

    /// `hardhat_impersonateAccount`
    pub async fn hardhat_impersonate_account(&self, address: Address) -> Result<()> {
        self.call("hardhat_impersonateAccount", vec![json!(address)]).await.map(drop)
    }

    /// `hardhat_stopImpersonatingAccount`
    pub async fn hardhat_stop_impersonating_account(&self, address: Address) -> Result<()> {
        self.call("hardhat_stopImpersonatingAccount", vec![json!(address)]).await.map(drop)
    }

    /// `hardhat_reset`, optionally re-forking with `options`.
    pub async fn hardhat_reset(&self, options: Option<Value>) -> Result<()> {
        self.call("hardhat_reset", options.into_iter().collect()).await.map(drop)
    }

    /// `hardhat_setMinGasPrice`
    pub async fn hardhat_set_min_gas_price(&self, price: u128) -> Result<()> {
        self.call("hardhat_setMinGasPrice", vec![quantity(price)]).await.map(drop)
    }

    /// `hardhat_setNextBlockBaseFeePerGas`
    pub async fn hardhat_set_next_block_base_fee_per_gas(&self, fee: u128) -> Result<()> {
        self.call("hardhat_setNextBlockBaseFeePerGas", vec![quantity(fee)]).await.map(drop)
    }

    /// `anvil_setBalance`
    pub async fn anvil_set_balance(&self, address: Address, balance: U256) -> Result<()> {
        self.call("anvil_setBalance", vec![json!(address), json!(balance)]).await.map(drop)
    }

    /// `anvil_impersonateAccount`
    pub async fn anvil_impersonate_account(&self, address: Address) -> Result<()> {
        self.call("anvil_impersonateAccount", vec![json!(address)]).await.map(drop)
    }

    /// `anvil_stopImpersonatingAccount`
    pub async fn anvil_stop_impersonating_account(&self, address: Address) -> Result<()> {
        self.call("anvil_stopImpersonatingAccount", vec![json!(address)]).await.map(drop)
    }

    /// `anvil_reset`, optionally re-forking with `options`.
    pub async fn anvil_reset(&self, options: Option<Value>) -> Result<()> {
        self.call("anvil_reset", options.into_iter().collect()).await.map(drop)
    }

    /// `anvil_setMinGasPrice`
    pub async fn anvil_set_min_gas_price(&self, price: u128) -> Result<()> {
        self.call("anvil_setMinGasPrice", vec![quantity(price)]).await.map(drop)
    }

    /// `anvil_setNextBlockBaseFeePerGas`
    pub async fn anvil_set_next_block_base_fee_per_gas(&self, fee: u128) -> Result<()> {
        self.call("anvil_setNextBlockBaseFeePerGas", vec![quantity(fee)]).await.map(drop)
    }

    /// `evm_setAccountBalance` (ganache)
    pub async fn evm_set_account_balance(&self, address: Address, balance: U256) -> Result<()> {
        self.call("evm_setAccountBalance", vec![json!(address), json!(balance)]).await.map(drop)
    }

    /// `evm_setBlockGasLimit`
    pub async fn evm_set_block_gas_limit(&self, limit: u64) -> Result<()> {
        self.call("evm_setBlockGasLimit", vec![quantity(limit)]).await.map(drop)
    }

    /// `evm_addAccount` (ganache)
    pub async fn evm_add_account(&self, address: Address, passphrase: &str) -> Result<bool> {
        self.request("evm_addAccount", vec![json!(address), json!(passphrase)]).await
    }

    /// `evm_snapshot`; the id is opaque and returned as the node formats it.
    pub async fn evm_snapshot(&self) -> Result<String> {
        Ok(match self.call("evm_snapshot", vec![]).await? {
            Value::String(id) => id,
            other => other.to_string(),
        })
    }

    /// `evm_revert`; `false` when the node did not revert.
    pub async fn evm_revert(&self, snapshot_id: &str) -> Result<bool> {
        self.request("evm_revert", vec![json!(snapshot_id)]).await
    }

    /// `web3_clientVersion`
    pub async fn web3_client_version(&self) -> Result<String> {
        self.request("web3_clientVersion", vec![]).await
    }

    /// `debug_traceTransaction`
    pub async fn debug_trace_transaction(&self, hash: B256, options: Option<Value>) -> Result<Value> {
        let mut params = vec![json!(hash)];
        params.extend(options);
        self.call("debug_traceTransaction", params).await
    }

    /// `trace_transaction`
    pub async fn trace_transaction(&self, hash: B256) -> Result<Value> {
        self.call("trace_transaction", vec![json!(hash)]).await
    }

    /// `personal_unlockAccount`
    pub async fn personal_unlock_account(
        &self,
        address: Address,
        passphrase: &str,
        duration: u64,
    ) -> Result<bool> {
        self.request(
            "personal_unlockAccount",
            vec![json!(address), json!(passphrase), json!(duration)],
        )
        .await
    }
}
