//! Snapshots restore both the node and the session's local view of it.

mod common;

use common::*;
use devchain::{ChainError, RequestKind, SessionRegistry, SnapshotError, TxParams};
use serde_json::{json, Value};

async fn send_from(session: &mut devchain::ChainSession, nonce: u64) {
    let tx = TxParams {
        nonce: Some(nonce),
        from: Some(ACCOUNT_0),
        to: Some(RECIPIENT),
        gas: Some(21_000),
        gas_price: Some(GAS_PRICE),
        ..Default::default()
    };
    session.send_transaction(tx).await.unwrap();
}

#[tokio::test]
async fn revert_restores_local_state() {
    let node = MockNode::anvil().await;
    node.mock("evm_snapshot", json!("0x1")).await;
    node.mock("evm_revert", json!(true)).await;
    node.mock("evm_setBlockGasLimit", Value::Null).await;
    node.mock("eth_getTransactionCount", json!("0x4")).await;
    node.mock("eth_sendTransaction", json!(TX_HASH)).await;
    let registry = SessionRegistry::new();
    let mut session = node.connect(&registry).await;

    assert_eq!(session.nonce(ACCOUNT_0).await.unwrap(), 4);
    let id = session.snapshot().await.unwrap();
    assert_eq!(id, "0x1");

    send_from(&mut session, 4).await;
    session.set_default_signer(RequestKind::Tx, Some(ACCOUNT_1));
    session.set_block_gas_limit(1_000_000).await.unwrap();
    assert_eq!(session.nonce(ACCOUNT_0).await.unwrap(), 5);
    assert_eq!(session.transactions().count(), 1);

    session.revert(&id).await.unwrap();

    assert_eq!(session.nonce(ACCOUNT_0).await.unwrap(), 4);
    assert_eq!(session.default_signer(RequestKind::Tx), None);
    assert_eq!(session.block_gas_limit().await.unwrap(), BLOCK_GAS_LIMIT);
    assert_eq!(session.transactions().count(), 0);
    assert_eq!(session.snapshot_ids().count(), 0);
    // cached nonce answered after the revert
    assert_eq!(node.count("eth_getTransactionCount").await, 1);
    assert_eq!(node.params_of("evm_revert").await, [json!(["0x1"])]);
}

#[tokio::test]
async fn snapshots_are_consumed_by_revert() {
    let node = MockNode::anvil().await;
    node.mock("evm_snapshot", json!("0x1")).await;
    node.mock("evm_revert", json!(true)).await;
    let registry = SessionRegistry::new();
    let mut session = node.connect(&registry).await;

    let id = session.snapshot().await.unwrap();
    session.revert(&id).await.unwrap();
    let before = node.requests().await.len();

    match session.revert(&id).await {
        Err(ChainError::Snapshot(SnapshotError::Unknown(unknown))) => assert_eq!(unknown, id),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(node.requests().await.len(), before);
}

#[tokio::test]
async fn refused_revert_keeps_local_state() {
    let node = MockNode::anvil().await;
    node.mock("evm_snapshot", json!("0x2")).await;
    node.mock("evm_revert", json!(false)).await;
    let registry = SessionRegistry::new();
    let mut session = node.connect(&registry).await;

    let id = session.snapshot().await.unwrap();
    session.set_default_signer(RequestKind::Tx, Some(ACCOUNT_1));

    assert!(matches!(
        session.revert(&id).await,
        Err(ChainError::Snapshot(SnapshotError::RevertFailed(_)))
    ));
    assert_eq!(session.default_signer(RequestKind::Tx), Some(ACCOUNT_1));
    assert_eq!(session.snapshot_ids().collect::<Vec<_>>(), ["0x2"]);
}

#[tokio::test]
async fn numeric_snapshot_ids_are_kept_as_text() {
    let node = MockNode::start().await;
    node.mock("web3_clientVersion", json!("Ganache/v7.9.1/EthereumJS TestRPC/v7.9.1/ethereum-js"))
        .await;
    node.mock("eth_chainId", json!("0x539")).await;
    node.mock("eth_accounts", json!([ACCOUNT_0])).await;
    node.mock_params("eth_getBlockByNumber", json!(["pending", false]), block(1)).await;
    node.mock("eth_gasPrice", json!("0x1")).await;
    node.mock("evm_snapshot", json!(3)).await;
    let registry = SessionRegistry::new();
    let mut session = node.connect(&registry).await;

    assert_eq!(session.snapshot().await.unwrap(), "3");
}
