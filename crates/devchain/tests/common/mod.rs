//! A scriptable JSON-RPC node on top of wiremock.

#![allow(dead_code, unreachable_pub)]

use std::time::Duration;

use alloy_primitives::{address, Address};
use devchain::{ChainSession, ConnectOptions, SessionRegistry, WaitOptions};
use serde_json::{json, Value};
use wiremock::{
    matchers::{body_partial_json, method},
    Mock, MockServer, ResponseTemplate,
};

pub const ACCOUNT_0: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");
pub const ACCOUNT_1: Address = address!("70997970c51812dc3a010c7d01b50e0d17dc79c8");
pub const RECIPIENT: Address = address!("5fbdb2315678afecb367f032d93f642f64180aa3");

pub const CHAIN_ID: u64 = 31337;
pub const BLOCK_GAS_LIMIT: u64 = 30_000_000;
pub const BASE_FEE: u128 = 1_000_000_000;
pub const GAS_PRICE: u128 = 2_000_000_000;

pub const TX_HASH: &str = "0x2b3c1ab1e0b1f0d3a4d9ef8b5f7c4e1d2a3b4c5d6e7f80910111213141516171";

/// JSON-RPC success envelope.
pub fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 0, "result": result}))
}

/// JSON-RPC error envelope.
pub fn rpc_error(error: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 0, "error": error}))
}

const ZERO_HASH: &str = "0x0000000000000000000000000000000000000000000000000000000000000000";
const EMPTY_ROOT: &str = "0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421";

fn empty_bloom() -> String {
    format!("0x{}", "0".repeat(512))
}

/// An empty anvil block as returned by `eth_getBlockByNumber`.
pub fn block(number: u64) -> Value {
    json!({
        "number": format!("{number:#x}"),
        "hash": format!("0x{number:064x}"),
        "parentHash": format!("0x{:064x}", number.saturating_sub(1)),
        "sha3Uncles": "0x1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347",
        "miner": Address::ZERO,
        "stateRoot": ZERO_HASH,
        "transactionsRoot": EMPTY_ROOT,
        "receiptsRoot": EMPTY_ROOT,
        "logsBloom": empty_bloom(),
        "difficulty": "0x0",
        "gasLimit": format!("{BLOCK_GAS_LIMIT:#x}"),
        "gasUsed": "0x0",
        "timestamp": "0x6553f100",
        "extraData": "0x",
        "mixHash": ZERO_HASH,
        "nonce": "0x0000000000000000",
        "baseFeePerGas": format!("{BASE_FEE:#x}"),
        "totalDifficulty": "0x0",
        "size": "0x200",
        "uncles": [],
        "transactions": []
    })
}

/// Receipt of a legacy transfer from `ACCOUNT_0` to `RECIPIENT`.
pub fn receipt(block_number: u64, status: u64) -> Value {
    json!({
        "type": "0x0",
        "status": format!("{status:#x}"),
        "cumulativeGasUsed": "0x5208",
        "logs": [],
        "logsBloom": empty_bloom(),
        "transactionHash": TX_HASH,
        "transactionIndex": "0x0",
        "blockHash": format!("0x{block_number:064x}"),
        "blockNumber": format!("{block_number:#x}"),
        "gasUsed": "0x5208",
        "effectiveGasPrice": "0x0",
        "from": ACCOUNT_0,
        "to": RECIPIENT,
        "contractAddress": null
    })
}

pub struct MockNode {
    pub server: MockServer,
}

impl MockNode {
    pub async fn start() -> Self {
        Self { server: MockServer::start().await }
    }

    /// A node answering the calls an anvil session makes while connecting.
    pub async fn anvil() -> Self {
        let node = Self::start().await;
        node.mock("web3_clientVersion", json!("anvil/v0.2.0")).await;
        node.mock("eth_chainId", json!(format!("{CHAIN_ID:#x}"))).await;
        node.mock("eth_accounts", json!([ACCOUNT_0, ACCOUNT_1])).await;
        node.mock_params("eth_getBlockByNumber", json!(["pending", false]), block(1)).await;
        node.mock("anvil_setNextBlockBaseFeePerGas", Value::Null).await;
        node.mock("anvil_setMinGasPrice", Value::Null).await;
        node.mock("eth_gasPrice", json!(format!("{GAS_PRICE:#x}"))).await;
        node
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Connects a development session with fast polling.
    pub async fn connect(&self, registry: &SessionRegistry) -> ChainSession {
        ChainSession::connect(registry, self.options()).await.unwrap()
    }

    pub fn options(&self) -> ConnectOptions {
        ConnectOptions::new(self.uri())
            .with_wait_options(WaitOptions { poll_interval: Duration::from_millis(5) })
    }

    /// Answers every `method` request with `result`.
    pub async fn mock(&self, rpc_method: &str, result: Value) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": rpc_method })))
            .respond_with(rpc_result(result))
            .mount(&self.server)
            .await;
    }

    /// Answers `method` requests whose params start with `params`.
    pub async fn mock_params(&self, rpc_method: &str, params: Value, result: Value) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": rpc_method, "params": params })))
            .respond_with(rpc_result(result))
            .mount(&self.server)
            .await;
    }

    /// Answers the next `times` `method` requests with `result`, ahead of other mocks.
    pub async fn mock_times(&self, rpc_method: &str, result: Value, times: u64) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": rpc_method })))
            .respond_with(rpc_result(result))
            .up_to_n_times(times)
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Answers every `method` request with a JSON-RPC error, ahead of other mocks.
    pub async fn mock_error(&self, rpc_method: &str, error: Value) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": rpc_method })))
            .respond_with(rpc_error(error))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Bodies of all requests received so far.
    pub async fn requests(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| request.body_json().unwrap())
            .collect()
    }

    /// Names of all methods called so far, in order.
    pub async fn methods(&self) -> Vec<String> {
        self.requests()
            .await
            .iter()
            .map(|request| request["method"].as_str().unwrap().to_string())
            .collect()
    }

    /// Params of every `method` request received so far.
    pub async fn params_of(&self, rpc_method: &str) -> Vec<Value> {
        self.requests()
            .await
            .into_iter()
            .filter(|request| request["method"] == rpc_method)
            .map(|request| request["params"].clone())
            .collect()
    }

    pub async fn count(&self, rpc_method: &str) -> usize {
        self.params_of(rpc_method).await.len()
    }
}
