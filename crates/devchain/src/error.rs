//! Error types for devchain.

use core::fmt;

use alloy_eips::BlockNumberOrTag;
use alloy_primitives::{hex, Address, Bytes};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{NodeDialect, RequestKind, TxType};

/// The `error` member of a JSON-RPC response, kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("node error {code}: {message}")]
pub struct NodeProtocolError {
    /// JSON-RPC error code
    pub code: i64,
    /// Human readable message reported by the node
    pub message: String,
    /// Optional error data (revert data for reverted calls)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Any non-standard members the node attached to the error object
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeProtocolError {
    /// Returns the EVM return data if this error reports a reverted execution.
    ///
    /// Nodes disagree on the shape: anvil and geth put a hex string in `data`, hardhat nests it
    /// as `data.data`, ganache uses `data.result`.
    pub fn revert_data(&self) -> Option<Bytes> {
        let raw = match self.data.as_ref()? {
            Value::String(s) => s.as_str(),
            Value::Object(obj) => {
                obj.get("data").or_else(|| obj.get("result")).and_then(Value::as_str)?
            }
            _ => return None,
        };
        if !raw.starts_with("0x") {
            return None;
        }
        hex::decode(raw).ok().map(Bytes::from)
    }
}

/// A reverted call, estimate or submission.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub struct RevertError {
    /// Raw return data of the reverted execution
    pub data: Bytes,
    /// Decoded `Error(string)` / `Panic(uint256)` reason, if any
    pub reason: Option<String>,
    /// The node error this revert was decoded from, if it came from one
    pub payload: Option<NodeProtocolError>,
}

impl RevertError {
    /// Decodes a revert from raw return data.
    pub fn from_data(data: Bytes, payload: Option<NodeProtocolError>) -> Self {
        let reason = crate::abi::decode_revert_reason(&data);
        Self { data, reason, payload }
    }

    /// A revert reported only as a message (e.g. the `error` member of `eth_createAccessList`).
    pub fn from_message(message: impl Into<String>) -> Self {
        Self { data: Bytes::new(), reason: Some(message.into()), payload: None }
    }
}

impl fmt::Display for RevertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "execution reverted: {reason}"),
            None if self.data.is_empty() => f.write_str("execution reverted"),
            None => write!(f, "execution reverted with data {}", self.data),
        }
    }
}

/// The caller's request or configuration is invalid.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Legacy and dynamic fee fields were mixed
    #[error("cannot specify both gasPrice and maxFeePerGas/maxPriorityFeePerGas")]
    MixedFeeFields,
    /// A field that the resolved transaction type cannot carry
    #[error("cannot specify {field} for a type {tx_type} transaction")]
    FieldNotAllowed {
        /// Wire name of the offending field
        field: &'static str,
        /// The resolved transaction type
        tx_type: TxType,
    },
    /// Unknown transaction type
    #[error("invalid transaction type: {0}")]
    InvalidTxType(u64),
    /// Gas value that is neither a number nor `auto`
    #[error("invalid gas value: {0}")]
    InvalidGas(String),
    /// Malformed node URL
    #[error("invalid node URL '{url}': {reason}")]
    InvalidUrl {
        /// The URL as given
        url: String,
        /// Parser message
        reason: String,
    },
    /// No `from` and no default account for the request kind
    #[error("no sender specified and no default {0} account set")]
    NoSender(RequestKind),
    /// Locally signed submission from an account without a signer
    #[error("no signer registered for account {0}")]
    NoSigner(Address),
    /// Submission of a transaction whose nonce was never resolved
    #[error("transaction from {0} has no nonce")]
    NoNonce(Address),
    /// `maxPriorityFeePerGas` plus the pending base fee does not fit in 128 bits
    #[error("max fee per gas overflows: priority fee {priority_fee} + base fee {base_fee}")]
    FeeOverflow {
        /// Requested priority fee
        priority_fee: u128,
        /// Base fee of the pending block
        base_fee: u128,
    },
    /// The node runs a different chain than requested
    #[error("chain id mismatch: expected {expected}, node reports {actual}")]
    ChainIdMismatch {
        /// Requested chain id
        expected: u64,
        /// Chain id reported by the node
        actual: u64,
    },
    /// Gas was left unset and the node could not estimate it
    #[error("gas limit not set and estimation failed: {0}")]
    GasUnresolved(NodeProtocolError),
    /// Wrong number of arguments for the ABI
    #[error("expected {expected} arguments, got {actual}")]
    ArgumentCount {
        /// Number of ABI inputs
        expected: usize,
        /// Number of supplied arguments
        actual: usize,
    },
    /// An argument does not fit the ABI input type
    #[error("argument {index} does not match ABI type {ty}")]
    ArgumentType {
        /// Position of the argument
        index: usize,
        /// Canonical ABI type of the input
        ty: String,
    },
    /// Setting that a deployment session reads from the node
    #[error("{0} cannot be changed in a deployment session")]
    ReadOnly(&'static str),
}

/// Snapshot bookkeeping failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    /// The id was never taken in this session or was already reverted to
    #[error("snapshot {0} does not exist or was already reverted")]
    Unknown(String),
    /// The node refused to revert
    #[error("node failed to revert to snapshot {0}")]
    RevertFailed(String),
}

/// Any error produced by a chain session.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// JSON-RPC error returned by the node
    #[error(transparent)]
    Protocol(#[from] NodeProtocolError),

    /// Reverted execution
    #[error(transparent)]
    Revert(#[from] RevertError),

    /// Invalid request or configuration
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Snapshot failure
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Connection-level failure
    #[error("RPC transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The node answered with something that is not a valid JSON-RPC response
    #[error("malformed RPC response: {0}")]
    MalformedResponse(String),

    /// Block not found
    #[error("block not found: {0}")]
    BlockNotFound(BlockNumberOrTag),

    /// The connected node does not offer the operation
    #[error("{operation} is not supported by {dialect} nodes")]
    Unsupported {
        /// The dev-node operation
        operation: &'static str,
        /// Detected dialect of the node
        dialect: NodeDialect,
    },

    /// ABI type parsing or encoding failed
    #[error("ABI error: {0}")]
    Abi(#[from] alloy_dyn_abi::Error),

    /// Signing failed
    #[error("signer error: {0}")]
    Signer(#[from] alloy_signer::Error),
}

impl ChainError {
    /// Turns a node error carrying return data into [`ChainError::Revert`].
    pub fn decode_revert(self) -> Self {
        match self {
            Self::Protocol(err) => match err.revert_data() {
                Some(data) => Self::Revert(RevertError::from_data(data, Some(err))),
                None => Self::Protocol(err),
            },
            other => other,
        }
    }

    /// Returns the node error object, if the failure originated at the node.
    pub const fn node_error(&self) -> Option<&NodeProtocolError> {
        match self {
            Self::Protocol(err) | Self::Config(ConfigError::GasUnresolved(err)) => Some(err),
            Self::Revert(RevertError { payload: Some(err), .. }) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

/// Result type for devchain operations
pub type Result<T, E = ChainError> = std::result::Result<T, E>;
