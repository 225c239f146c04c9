use std::time::Duration;

use alloy_primitives::B256;
use tokio::time::sleep;
use tracing::{debug, trace};

use super::ChainSession;
use crate::{Result, TransactionReceipt, TxParams};

/// Confirmation polling settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Delay between two receipt or block number polls
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self { poll_interval: Duration::from_millis(100) }
    }
}

/// Execution status of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// No receipt observed yet
    Pending,
    /// Mined and executed successfully
    Success,
    /// Mined and reverted
    Reverted,
}

/// A submitted transaction and, once mined, its receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    hash: B256,
    params: TxParams,
    receipt: Option<TransactionReceipt>,
}

impl TransactionRecord {
    /// A record for a just submitted transaction.
    pub const fn new(hash: B256, params: TxParams) -> Self {
        Self { hash, params, receipt: None }
    }

    /// Transaction hash.
    pub const fn hash(&self) -> B256 {
        self.hash
    }

    /// The parameters the transaction was submitted with.
    pub const fn params(&self) -> &TxParams {
        &self.params
    }

    /// The receipt, once observed.
    pub const fn receipt(&self) -> Option<&TransactionReceipt> {
        self.receipt.as_ref()
    }

    /// Status derived from the receipt.
    pub fn status(&self) -> TransactionStatus {
        match &self.receipt {
            None => TransactionStatus::Pending,
            Some(receipt) if receipt.status() => TransactionStatus::Success,
            Some(_) => TransactionStatus::Reverted,
        }
    }

    /// Attaches `receipt` unless one is already attached.
    fn attach_receipt(&mut self, receipt: TransactionReceipt) {
        if self.receipt.is_none() {
            self.receipt = Some(receipt);
        }
    }
}

impl ChainSession {
    /// Blocks until `tx` is mined and has `confirmations` confirmations.
    ///
    /// `None` means one confirmation; `Some(0)` returns immediately without contacting the node.
    /// There is no timeout; wrap the future in [`tokio::time::timeout`] to bound it.
    pub async fn wait(
        &mut self,
        tx: &TransactionRecord,
        confirmations: Option<u64>,
    ) -> Result<TransactionRecord> {
        let confirmations = confirmations.unwrap_or(1);
        let mut record = self.state.txs.get(&tx.hash).cloned().unwrap_or_else(|| tx.clone());
        if confirmations == 0 {
            return Ok(record);
        }

        let poll_interval = self.wait_options.poll_interval;
        while record.receipt.is_none() {
            match self.client().eth_get_transaction_receipt(record.hash).await? {
                Some(receipt) => {
                    debug!(hash = %record.hash, block = ?receipt.block_number, "Transaction mined");
                    record.attach_receipt(receipt);
                    self.state.txs.insert(record.hash, record.clone());
                }
                None => {
                    trace!(hash = %record.hash, "Transaction pending");
                    sleep(poll_interval).await;
                }
            }
        }

        if confirmations > 1 {
            let mined_in =
                record.receipt.as_ref().and_then(|receipt| receipt.block_number).unwrap_or_default();
            loop {
                let latest = self.client().eth_block_number().await?;
                if latest.saturating_sub(mined_in) >= confirmations - 1 {
                    break;
                }
                sleep(poll_interval).await;
            }
        }

        Ok(record)
    }

    /// The confirmation polling settings.
    pub const fn wait_options(&self) -> WaitOptions {
        self.wait_options
    }

    /// Changes the confirmation polling settings.
    pub const fn set_wait_options(&mut self, options: WaitOptions) {
        self.wait_options = options;
    }
}
