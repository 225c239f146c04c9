//! Transaction requests, wire parameters and type resolution.

use core::{fmt, str::FromStr};

use alloy_eips::eip2930::AccessList;
use alloy_primitives::{Address, Bytes, U256, U64};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ConfigError;

mod params;
mod resolve;
pub use params::*;
pub use resolve::*;

/// Transaction envelope type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TxType {
    /// Type 0, legacy `gasPrice` transaction
    #[default]
    Legacy = 0,
    /// Type 1, EIP-2930 access-list transaction
    AccessList = 1,
    /// Type 2, EIP-1559 dynamic-fee transaction
    DynamicFee = 2,
}

impl TryFrom<u64> for TxType {
    type Error = ConfigError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Legacy),
            1 => Ok(Self::AccessList),
            2 => Ok(Self::DynamicFee),
            other => Err(ConfigError::InvalidTxType(other)),
        }
    }
}

impl From<TxType> for u8 {
    fn from(value: TxType) -> Self {
        value as Self
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

impl Serialize for TxType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        U64::from(*self as u8).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TxType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = U64::deserialize(deserializer)?;
        Self::try_from(value.to::<u64>()).map_err(serde::de::Error::custom)
    }
}

/// Gas limit of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasSetting {
    /// Ask the node for an estimate
    Auto,
    /// Use this limit verbatim
    Limit(u64),
}

impl From<u64> for GasSetting {
    fn from(limit: u64) -> Self {
        Self::Limit(limit)
    }
}

impl FromStr for GasSetting {
    type Err = ConfigError;

    /// Parses `auto`, a decimal integer, or a `0x` hex integer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        let parsed = match s.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => s.parse(),
        };
        parsed.map(Self::Limit).map_err(|_| ConfigError::InvalidGas(s.to_string()))
    }
}

/// Access list of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessListSetting {
    /// Generate it with `eth_createAccessList`
    Auto,
    /// Use this list verbatim
    List(AccessList),
}

impl From<AccessList> for AccessListSetting {
    fn from(list: AccessList) -> Self {
        Self::List(list)
    }
}

/// A high-level transaction description. Every unset field is filled in by the builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionRequest {
    /// Explicit envelope type
    pub tx_type: Option<TxType>,
    /// Explicit nonce
    pub nonce: Option<u64>,
    /// Recipient, `None` for contract creation
    pub to: Option<Address>,
    /// Sender
    pub from: Option<Address>,
    /// Gas limit
    pub gas: Option<GasSetting>,
    /// Transferred value in wei
    pub value: Option<U256>,
    /// Call data prefix (bytecode for deployments, selector for calls)
    pub data: Option<Bytes>,
    /// Legacy gas price
    pub gas_price: Option<u128>,
    /// EIP-1559 priority fee
    pub max_priority_fee_per_gas: Option<u128>,
    /// EIP-1559 fee cap
    pub max_fee_per_gas: Option<u128>,
    /// Access list
    pub access_list: Option<AccessListSetting>,
    /// Chain id
    pub chain_id: Option<u64>,
}

impl TransactionRequest {
    /// Sets the envelope type.
    pub const fn with_tx_type(mut self, tx_type: TxType) -> Self {
        self.tx_type = Some(tx_type);
        self
    }

    /// Sets the nonce.
    pub const fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Sets the recipient.
    pub const fn with_to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    /// Sets the sender.
    pub const fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    /// Sets the gas limit or [`GasSetting::Auto`].
    pub fn with_gas(mut self, gas: impl Into<GasSetting>) -> Self {
        self.gas = Some(gas.into());
        self
    }

    /// Sets the transferred value.
    pub const fn with_value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    /// Sets the call data prefix.
    pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Sets the legacy gas price.
    pub const fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    /// Sets the priority fee.
    pub const fn with_max_priority_fee_per_gas(mut self, fee: u128) -> Self {
        self.max_priority_fee_per_gas = Some(fee);
        self
    }

    /// Sets the fee cap.
    pub const fn with_max_fee_per_gas(mut self, fee: u128) -> Self {
        self.max_fee_per_gas = Some(fee);
        self
    }

    /// Sets the access list or [`AccessListSetting::Auto`].
    pub fn with_access_list(mut self, access_list: impl Into<AccessListSetting>) -> Self {
        self.access_list = Some(access_list.into());
        self
    }

    /// Sets the chain id.
    pub const fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// Whether any EIP-1559 fee field is present.
    pub const fn has_dynamic_fee(&self) -> bool {
        self.max_fee_per_gas.is_some() || self.max_priority_fee_per_gas.is_some()
    }
}
