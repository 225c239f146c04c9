use alloy_eips::eip2930::AccessList;
use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use super::TxType;

/// A fully built transaction as sent over the wire.
///
/// Integer quantities serialise as unpadded `0x` hex; absent fields are omitted rather than
/// sent as `null`. `tx_type` is left unset for legacy transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxParams {
    /// Envelope type, omitted for legacy
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<TxType>,
    /// Sender nonce
    #[serde(default, with = "alloy_serde::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    /// Sender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// Recipient, absent for contract creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    /// Gas limit
    #[serde(default, with = "alloy_serde::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub gas: Option<u64>,
    /// Transferred value in wei
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    /// Call data or init code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    /// Gas price for type 0 and 1
    #[serde(default, with = "alloy_serde::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<u128>,
    /// Priority fee for type 2
    #[serde(default, with = "alloy_serde::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<u128>,
    /// Fee cap for type 2
    #[serde(default, with = "alloy_serde::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<u128>,
    /// Access list for type 1 and 2
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_list: Option<AccessList>,
    /// Chain id, always present for type 1 and 2
    #[serde(default, with = "alloy_serde::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
}

impl TxParams {
    /// The envelope type, legacy when unset.
    pub fn tx_type(&self) -> TxType {
        self.tx_type.unwrap_or_default()
    }
}
