//! Transaction building, submission and snapshot management for Ethereum development chains.
//!
//! Connect a [`ChainSession`] to a node, describe transactions as [`TransactionRequest`]s and let
//! the session fill in sender, nonce, fees, gas and access list before submitting them over
//! JSON-RPC. Development sessions additionally expose dev-node extensions (balances,
//! impersonation, snapshots) through a dialect-aware [`ChainInterface`].
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod abi;

mod error;
pub use error::*;

mod interface;
pub use interface::*;

pub mod rpc;
pub use rpc::{AccessListResult, Block, JsonRpcClient, RpcObserver, TransactionReceipt};

mod session;
pub use session::*;

mod signer;
pub use signer::*;

mod tx;
pub use tx::*;
