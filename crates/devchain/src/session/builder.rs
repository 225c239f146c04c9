use alloy_dyn_abi::DynSolValue;
use alloy_eips::{eip2930::AccessList, BlockNumberOrTag};
use alloy_json_abi::Param;
use alloy_primitives::Address;
use tracing::debug;

use super::{ChainSession, RequestKind, SessionMode};
use crate::{
    abi::encode_arguments, resolve_tx_type, AccessListSetting, ChainError, ConfigError,
    GasSetting, Result, RevertError, TransactionRequest, TxParams, TxType,
};

impl ChainSession {
    /// Turns `request` into a fully specified transaction for `kind`.
    ///
    /// `arguments` are ABI-encoded against `abi` and appended to the request's `data`. Unset
    /// fields are filled from session settings or node round-trips:
    ///
    /// - the sender from the default signer of `kind`,
    /// - the nonce from the session (see [`ChainSession::nonce`]),
    /// - fees from the session, with `maxFeePerGas` derived from the pending base fee only when
    ///   transactions are signed locally,
    /// - the access list from `eth_createAccessList` when set to [`AccessListSetting::Auto`],
    /// - gas from an estimate when [`GasSetting::Auto`], or when unset from the block gas limit
    ///   (development) or an estimate (deployment).
    pub async fn build_transaction(
        &mut self,
        kind: RequestKind,
        request: &TransactionRequest,
        arguments: &[DynSolValue],
        abi: Option<&[Param]>,
    ) -> Result<TxParams> {
        let tx_type = resolve_tx_type(request, self.tx_type)?;
        let sender = self.sender(kind, request.from)?;

        let mut data = request.data.clone().unwrap_or_default().to_vec();
        data.extend_from_slice(&encode_arguments(abi, arguments)?);

        let nonce = match request.nonce {
            Some(nonce) => nonce,
            None => self.nonce(sender).await?,
        };

        let mut tx = TxParams {
            tx_type: (tx_type != TxType::Legacy).then_some(tx_type),
            nonce: Some(nonce),
            from: Some(sender),
            to: request.to,
            value: Some(request.value.unwrap_or_default()),
            data: Some(data.into()),
            chain_id: request.chain_id,
            ..Default::default()
        };

        match tx_type {
            TxType::Legacy => {
                tx.gas_price = Some(self.resolve_gas_price(request).await?);
            }
            TxType::AccessList => {
                tx.gas_price = Some(self.resolve_gas_price(request).await?);
                self.set_typed_fields(&mut tx, request);
            }
            TxType::DynamicFee => {
                let priority_fee = match request.max_priority_fee_per_gas {
                    Some(fee) => fee,
                    None => self.max_priority_fee_per_gas().await?,
                };
                tx.max_priority_fee_per_gas = Some(priority_fee);
                tx.max_fee_per_gas = match request.max_fee_per_gas {
                    Some(fee) => Some(fee),
                    None if self.require_signed_txs => {
                        let base_fee = self.pending_base_fee().await?;
                        let max_fee = priority_fee
                            .checked_add(base_fee)
                            .ok_or(ConfigError::FeeOverflow { priority_fee, base_fee })?;
                        Some(max_fee)
                    }
                    None => None,
                };
                self.set_typed_fields(&mut tx, request);
            }
        }

        let auto_access_list = matches!(request.access_list, Some(AccessListSetting::Auto));
        let auto_gas = matches!(request.gas, Some(GasSetting::Auto));

        tx.gas = match request.gas {
            Some(GasSetting::Limit(limit)) => Some(limit),
            // filled from the access list round-trip below
            Some(GasSetting::Auto) if auto_access_list => None,
            Some(GasSetting::Auto) => Some(
                self.client()
                    .eth_estimate_gas(&tx, BlockNumberOrTag::Latest)
                    .await
                    .map_err(ChainError::decode_revert)?,
            ),
            None => Some(match self.mode {
                SessionMode::Development => self.block_gas_limit().await?,
                SessionMode::Deployment => self.estimate_unset_gas(&tx).await?,
            }),
        };

        if auto_access_list {
            let result = self
                .client()
                .eth_create_access_list(&tx, BlockNumberOrTag::Latest)
                .await
                .map_err(ChainError::decode_revert)?;
            if let Some(error) = result.error {
                return Err(RevertError::from_message(error).into());
            }
            tx.access_list = Some(result.access_list);
            if auto_gas {
                tx.gas = Some(u64::try_from(result.gas_used).map_err(|_| {
                    ChainError::MalformedResponse(format!(
                        "access list gas {} does not fit in 64 bits",
                        result.gas_used
                    ))
                })?);
            }
        }

        debug!(%kind, ?tx, "Built transaction");
        Ok(tx)
    }

    fn sender(&self, kind: RequestKind, from: Option<Address>) -> Result<Address> {
        from.or_else(|| self.default_signer(kind)).ok_or_else(|| ConfigError::NoSender(kind).into())
    }

    async fn resolve_gas_price(&self, request: &TransactionRequest) -> Result<u128> {
        match request.gas_price {
            Some(price) => Ok(price),
            None => self.gas_price().await,
        }
    }

    /// Chain id and access list, which every typed transaction carries.
    fn set_typed_fields(&self, tx: &mut TxParams, request: &TransactionRequest) {
        tx.chain_id = Some(request.chain_id.unwrap_or(self.chain_id));
        tx.access_list = Some(match &request.access_list {
            Some(AccessListSetting::List(list)) => list.clone(),
            Some(AccessListSetting::Auto) | None => AccessList::default(),
        });
    }

    async fn pending_base_fee(&self) -> Result<u128> {
        let base_fee = self.pending_block().await?.header.base_fee_per_gas.ok_or_else(|| {
            ChainError::MalformedResponse("pending block has no baseFeePerGas".to_string())
        })?;
        Ok(base_fee.into())
    }

    /// Estimates gas for a request that left it unset; node errors become configuration errors.
    async fn estimate_unset_gas(&self, tx: &TxParams) -> Result<u64> {
        match self.client().eth_estimate_gas(tx, BlockNumberOrTag::Latest).await {
            Ok(gas) => Ok(gas),
            Err(err) => match err.decode_revert() {
                ChainError::Protocol(err) => Err(ConfigError::GasUnresolved(err).into()),
                other => Err(other),
            },
        }
    }
}
