//! Connecting, registry membership and session settings.

mod common;

use alloy_primitives::U256;
use common::*;
use devchain::{
    ChainError, ChainSession, ConfigError, ConnectOptions, NodeDialect, RequestKind,
    SessionMode, SessionRegistry,
};
use serde_json::{json, Value};

#[tokio::test]
async fn connect_loads_accounts_and_defaults() {
    let node = MockNode::anvil().await;
    let registry = SessionRegistry::new();
    let session = node.connect(&registry).await;

    assert_eq!(session.chain_id(), CHAIN_ID);
    assert_eq!(session.dialect(), NodeDialect::Anvil);
    assert_eq!(session.mode(), SessionMode::Development);
    assert!(!session.require_signed_txs());
    // address order
    assert_eq!(session.accounts(), [ACCOUNT_1, ACCOUNT_0]);
    for kind in [RequestKind::Call, RequestKind::Estimate, RequestKind::AccessList] {
        assert_eq!(session.default_signer(kind), Some(ACCOUNT_0));
    }
    assert_eq!(session.default_signer(RequestKind::Tx), None);
    assert_eq!(session.block_gas_limit().await.unwrap(), BLOCK_GAS_LIMIT);
    assert_eq!(session.gas_price().await.unwrap(), 0);
    assert_eq!(session.max_priority_fee_per_gas().await.unwrap(), 0);
}

#[tokio::test]
async fn development_sessions_zero_node_fees_by_default() {
    let node = MockNode::anvil().await;
    let registry = SessionRegistry::new();
    let session = ChainSession::connect(&registry, ConnectOptions::new(node.uri())).await.unwrap();

    assert_eq!(node.params_of("anvil_setNextBlockBaseFeePerGas").await, [json!(["0x0"])]);
    assert_eq!(node.params_of("anvil_setMinGasPrice").await, [json!(["0x0"])]);
    assert_eq!(session.gas_price().await.unwrap(), 0);
    assert_eq!(node.count("eth_gasPrice").await, 0);
}

#[tokio::test]
async fn node_fees_leave_the_node_untouched() {
    let node = MockNode::anvil().await;
    let registry = SessionRegistry::new();
    let session =
        ChainSession::connect(&registry, node.options().with_node_fees()).await.unwrap();

    assert_eq!(session.gas_price().await.unwrap(), GAS_PRICE);
    assert_eq!(node.count("anvil_setNextBlockBaseFeePerGas").await, 0);
    assert_eq!(node.count("anvil_setMinGasPrice").await, 0);

    // deployment sessions never configure fees
    let options = ConnectOptions::deployment(node.uri());
    assert_eq!((options.min_gas_price, options.block_base_fee_per_gas), (None, None));
}

#[tokio::test]
async fn registry_tracks_live_sessions() {
    let first = MockNode::anvil().await;
    let second = MockNode::anvil().await;
    let registry = SessionRegistry::new();

    let a = first.connect(&registry).await;
    let b = second.connect(&registry).await;
    let sessions = registry.list_connected_sessions();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].uri, first.uri());
    assert_eq!(sessions[1].chain_id, Some(CHAIN_ID));

    a.disconnect();
    assert_eq!(registry.list_connected_sessions()[0].id, b.id());

    drop(b);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn failed_connect_deregisters() {
    let node = MockNode::anvil().await;
    let registry = SessionRegistry::new();

    let err = ChainSession::connect(&registry, node.options().with_chain_id(1)).await.unwrap_err();
    assert!(matches!(
        err,
        ChainError::Config(ConfigError::ChainIdMismatch { expected: 1, actual: CHAIN_ID })
    ));
    assert!(registry.is_empty());
}

#[tokio::test]
async fn min_gas_price_is_used_when_the_node_accepts_it() {
    let node = MockNode::anvil().await;
    let registry = SessionRegistry::new();

    let session =
        ChainSession::connect(&registry, node.options().with_min_gas_price(7)).await.unwrap();

    assert_eq!(session.gas_price().await.unwrap(), 7);
    assert_eq!(node.params_of("anvil_setMinGasPrice").await, [json!(["0x7"])]);
    assert_eq!(node.count("eth_gasPrice").await, 0);
}

#[tokio::test]
async fn rejected_setup_conveniences_are_tolerated() {
    let node = MockNode::anvil().await;
    node.mock_error(
        "anvil_setMinGasPrice",
        json!({"code": -32602, "message": "min gas price not supported with EIP-1559"}),
    )
    .await;
    node.mock_error("anvil_setNextBlockBaseFeePerGas", json!({"code": -32601, "message": "nope"}))
        .await;
    let registry = SessionRegistry::new();

    let options = node.options().with_min_gas_price(7).with_block_base_fee_per_gas(0);
    let session = ChainSession::connect(&registry, options).await.unwrap();

    assert_eq!(session.gas_price().await.unwrap(), GAS_PRICE);
    assert_eq!(node.count("anvil_setNextBlockBaseFeePerGas").await, 1);
}

#[tokio::test]
async fn funded_accounts_are_provisioned() {
    let node = MockNode::anvil().await;
    node.mock("anvil_setBalance", Value::Null).await;
    let registry = SessionRegistry::new();

    let options = node.options().with_funded_account(RECIPIENT, U256::from(1000));
    let session = ChainSession::connect(&registry, options).await.unwrap();

    assert!(session.accounts().contains(&RECIPIENT));
    assert_eq!(
        node.params_of("anvil_setBalance").await,
        [json!([RECIPIENT, "0x3e8"])]
    );
}

#[tokio::test]
async fn fork_resets_before_reading_chain_id() {
    let node = MockNode::anvil().await;
    node.mock("anvil_reset", Value::Null).await;
    let registry = SessionRegistry::new();

    let options = node.options().with_fork("https://rpc.example", Some(100));
    ChainSession::connect(&registry, options).await.unwrap();

    let methods = node.methods().await;
    let reset = methods.iter().position(|m| m == "anvil_reset").unwrap();
    let chain_id = methods.iter().position(|m| m == "eth_chainId").unwrap();
    assert!(reset < chain_id);
    assert_eq!(
        node.params_of("anvil_reset").await,
        [json!([{"forking": {"jsonRpcUrl": "https://rpc.example", "blockNumber": 100}}])]
    );
}

#[tokio::test]
async fn generic_nodes_reject_dev_operations() {
    let node = MockNode::start().await;
    node.mock("web3_clientVersion", json!("Geth/v1.13.14-stable")).await;
    node.mock("eth_chainId", json!("0x1")).await;
    node.mock("eth_accounts", json!([])).await;
    let registry = SessionRegistry::new();

    let mut session =
        ChainSession::connect(&registry, ConnectOptions::deployment(node.uri())).await.unwrap();
    assert_eq!(session.dialect(), NodeDialect::Generic);
    assert!(session.require_signed_txs());
    assert_eq!(session.default_signer(RequestKind::Call), None);

    let before = node.requests().await.len();
    assert!(matches!(session.snapshot().await, Err(ChainError::Unsupported { .. })));
    assert!(matches!(
        session.set_balance(ACCOUNT_0, U256::from(1)).await,
        Err(ChainError::Unsupported { operation: "set_balance", dialect: NodeDialect::Generic })
    ));
    assert_eq!(node.requests().await.len(), before);
}

#[tokio::test]
async fn deployment_settings_are_read_only_and_live() {
    let node = MockNode::anvil().await;
    node.mock("eth_maxPriorityFeePerGas", json!("0x3")).await;
    let registry = SessionRegistry::new();

    let mut session =
        ChainSession::connect(&registry, ConnectOptions::deployment(node.uri())).await.unwrap();

    assert!(matches!(
        session.set_gas_price(1),
        Err(ChainError::Config(ConfigError::ReadOnly(_)))
    ));
    assert!(matches!(
        session.set_max_priority_fee_per_gas(1),
        Err(ChainError::Config(ConfigError::ReadOnly(_)))
    ));
    assert!(matches!(
        session.set_require_signed_txs(false),
        Err(ChainError::Config(ConfigError::ReadOnly(_)))
    ));

    assert_eq!(session.gas_price().await.unwrap(), GAS_PRICE);
    assert_eq!(session.gas_price().await.unwrap(), GAS_PRICE);
    assert_eq!(session.max_priority_fee_per_gas().await.unwrap(), 3);
    assert_eq!(session.block_gas_limit().await.unwrap(), BLOCK_GAS_LIMIT);
    assert_eq!(node.count("eth_gasPrice").await, 2);
}

#[tokio::test]
async fn blocks_are_cached_by_number() {
    let node = MockNode::anvil().await;
    node.mock_params("eth_getBlockByNumber", json!(["0x5", false]), block(5)).await;
    let registry = SessionRegistry::new();
    let mut session = node.connect(&registry).await;

    let first = session.block(5.into()).await.unwrap();
    let second = session.block(5.into()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.header.number, 5);
    assert_eq!(node.params_of("eth_getBlockByNumber").await.len(), 2);
}
