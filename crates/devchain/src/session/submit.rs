use alloy_dyn_abi::DynSolValue;
use alloy_eips::BlockNumberOrTag;
use alloy_json_abi::Param;
use alloy_primitives::Bytes;
use tracing::info;

use super::{ChainSession, RequestKind, TransactionRecord};
use crate::{
    AccessListResult, ChainError, ConfigError, Result, RevertError, TransactionRequest, TxParams,
};

impl ChainSession {
    /// Builds `request` as a transaction and submits it.
    pub async fn build_and_send(
        &mut self,
        request: &TransactionRequest,
        arguments: &[DynSolValue],
        abi: Option<&[Param]>,
    ) -> Result<TransactionRecord> {
        let tx = self.build_transaction(RequestKind::Tx, request, arguments, abi).await?;
        self.send_transaction(tx).await
    }

    /// Submits an already built transaction.
    ///
    /// The node signs unless the session requires signed transactions, in which case the
    /// sender's registered [`TransactionSigner`](crate::TransactionSigner) produces a raw
    /// transaction. Node-signed submissions advance the sender's cached nonce.
    pub async fn send_transaction(&mut self, tx: TxParams) -> Result<TransactionRecord> {
        let sender = tx.from.ok_or(ConfigError::NoSender(RequestKind::Tx))?;
        let nonce = tx.nonce.ok_or(ConfigError::NoNonce(sender))?;

        let hash = if self.require_signed_txs {
            let signer = self
                .state
                .accounts
                .get(&sender)
                .and_then(|account| account.signer().cloned())
                .ok_or(ConfigError::NoSigner(sender))?;
            let raw = signer.sign_transaction(&tx, self.chain_id)?;
            self.client().eth_send_raw_transaction(&raw).await
        } else {
            self.client().eth_send_transaction(&tx).await
        }
        .map_err(ChainError::decode_revert)?;

        if !self.require_signed_txs {
            self.state.nonces.insert(sender, nonce.saturating_add(1));
        }
        self.account(sender);

        info!(%hash, from = %sender, nonce, "Transaction submitted");
        let record = TransactionRecord::new(hash, tx);
        self.state.txs.insert(hash, record.clone());
        Ok(record)
    }

    /// Executes `request` with `eth_call` at `block` and returns the output.
    pub async fn call(
        &mut self,
        request: &TransactionRequest,
        arguments: &[DynSolValue],
        abi: Option<&[Param]>,
        block: BlockNumberOrTag,
    ) -> Result<Bytes> {
        let tx = self.build_transaction(RequestKind::Call, request, arguments, abi).await?;
        self.client().eth_call(&tx, block).await.map_err(ChainError::decode_revert)
    }

    /// Estimates the gas `request` would use.
    pub async fn estimate_gas(
        &mut self,
        request: &TransactionRequest,
        arguments: &[DynSolValue],
        abi: Option<&[Param]>,
    ) -> Result<u64> {
        let tx = self.build_transaction(RequestKind::Estimate, request, arguments, abi).await?;
        self.client()
            .eth_estimate_gas(&tx, BlockNumberOrTag::Latest)
            .await
            .map_err(ChainError::decode_revert)
    }

    /// Generates the access list `request` would touch.
    pub async fn create_access_list(
        &mut self,
        request: &TransactionRequest,
        arguments: &[DynSolValue],
        abi: Option<&[Param]>,
    ) -> Result<AccessListResult> {
        let tx = self.build_transaction(RequestKind::AccessList, request, arguments, abi).await?;
        let result = self
            .client()
            .eth_create_access_list(&tx, BlockNumberOrTag::Latest)
            .await
            .map_err(ChainError::decode_revert)?;
        match result.error {
            Some(error) => Err(RevertError::from_message(error).into()),
            None => Ok(result),
        }
    }
}
