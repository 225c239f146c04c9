//! Local transaction signing.

use core::{fmt, str::FromStr};

use alloy_consensus::{SignableTransaction, Signed, TxEip1559, TxEip2930, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_network::TxSignerSync;
use alloy_primitives::{Address, Bytes, Signature, TxKind};
use alloy_signer_local::PrivateKeySigner;

use crate::{Result, TxParams, TxType};

/// Produces signed raw transactions for one account.
pub trait TransactionSigner: Send + Sync + fmt::Debug {
    /// The account this signer signs for.
    fn address(&self) -> Address;

    /// Signs `tx` and returns the EIP-2718 encoded envelope.
    ///
    /// `chain_id` is used when `tx` does not carry one.
    fn sign_transaction(&self, tx: &TxParams, chain_id: u64) -> Result<Bytes>;
}

/// A [`TransactionSigner`] holding a secp256k1 private key in memory.
#[derive(Debug, Clone)]
pub struct KeySigner {
    inner: PrivateKeySigner,
}

impl KeySigner {
    /// Wraps an existing local signer.
    pub const fn new(inner: PrivateKeySigner) -> Self {
        Self { inner }
    }

    fn sign_into<T>(&self, mut tx: T) -> Result<TxEnvelope>
    where
        T: SignableTransaction<Signature>,
        Signed<T>: Into<TxEnvelope>,
    {
        let signature = self.inner.sign_transaction_sync(&mut tx)?;
        Ok(tx.into_signed(signature).into())
    }
}

impl FromStr for KeySigner {
    type Err = alloy_signer::Error;

    /// Parses a hex private key, with or without `0x`.
    fn from_str(key: &str) -> Result<Self, Self::Err> {
        PrivateKeySigner::from_str(key.trim()).map(Self::new).map_err(alloy_signer::Error::other)
    }
}

impl TransactionSigner for KeySigner {
    fn address(&self) -> Address {
        self.inner.address()
    }

    fn sign_transaction(&self, tx: &TxParams, chain_id: u64) -> Result<Bytes> {
        let chain_id = tx.chain_id.unwrap_or(chain_id);
        let to = tx.to.map_or(TxKind::Create, TxKind::Call);
        let nonce = tx.nonce.unwrap_or_default();
        let gas_limit = tx.gas.unwrap_or_default();
        let value = tx.value.unwrap_or_default();
        let input = tx.data.clone().unwrap_or_default();
        let access_list = tx.access_list.clone().unwrap_or_default();

        let envelope = match tx.tx_type() {
            TxType::Legacy => self.sign_into(TxLegacy {
                chain_id: Some(chain_id),
                nonce,
                gas_price: tx.gas_price.unwrap_or_default(),
                gas_limit,
                to,
                value,
                input,
            })?,
            TxType::AccessList => self.sign_into(TxEip2930 {
                chain_id,
                nonce,
                gas_price: tx.gas_price.unwrap_or_default(),
                gas_limit,
                to,
                value,
                access_list,
                input,
            })?,
            TxType::DynamicFee => self.sign_into(TxEip1559 {
                chain_id,
                nonce,
                gas_limit,
                max_fee_per_gas: tx.max_fee_per_gas.unwrap_or_default(),
                max_priority_fee_per_gas: tx.max_priority_fee_per_gas.unwrap_or_default(),
                to,
                value,
                access_list,
                input,
            })?,
        };

        Ok(envelope.encoded_2718().into())
    }
}

#[cfg(test)]
mod tests {
    use alloy_eips::eip2718::{Decodable2718, Typed2718};
    use alloy_primitives::{address, U256};

    use super::*;

    // anvil / hardhat account #0
    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn signer() -> KeySigner {
        KEY.parse().unwrap()
    }

    #[test]
    fn derives_address() {
        assert_eq!(signer().address(), address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266"));
        assert!("0x1234".parse::<KeySigner>().is_err());
    }

    #[test]
    fn signs_every_type() {
        let signer = signer();
        for tx_type in [TxType::Legacy, TxType::AccessList, TxType::DynamicFee] {
            let tx = TxParams {
                tx_type: (tx_type != TxType::Legacy).then_some(tx_type),
                nonce: Some(7),
                to: Some(Address::repeat_byte(0x11)),
                gas: Some(21_000),
                value: Some(U256::from(1000)),
                gas_price: (tx_type != TxType::DynamicFee).then_some(1_000_000_000),
                max_fee_per_gas: (tx_type == TxType::DynamicFee).then_some(2_000_000_000),
                max_priority_fee_per_gas: (tx_type == TxType::DynamicFee).then_some(1),
                ..Default::default()
            };
            let raw = signer.sign_transaction(&tx, 31337).unwrap();
            let envelope = TxEnvelope::decode_2718(&mut raw.as_ref()).unwrap();
            assert_eq!(envelope.ty(), u8::from(tx_type));
            match tx_type {
                TxType::Legacy => assert!(raw[0] >= 0xc0),
                _ => assert_eq!(raw[0], u8::from(tx_type)),
            }
        }
    }
}
