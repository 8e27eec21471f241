//! Submission lifecycle against a scripted JSON-RPC node.

mod common;

use std::time::{Duration, Instant};

use chain_analos::{Address, SigningKey};
use launchpad_client::{
    ClientError, Connection, KeypairWallet, Outcome, SubmissionState, Submitter, TransportMode,
    Wallet,
};
use launchpad_core::{CollectionConfig, LaunchpadProgram, LAUNCHPAD_PROGRAM_ID};
use serde_json::{json, Value};

use common::{sent_wire, status, statuses, FakeNode, NoPush, Reply};

fn wallet() -> KeypairWallet {
    KeypairWallet::new(SigningKey::from_bytes(&[1; 32]))
}

fn pause_ix(wallet: &KeypairWallet) -> chain_analos::Instruction {
    LaunchpadProgram::new(LAUNCHPAD_PROGRAM_ID)
        .set_pause(&wallet.address(), true)
        .unwrap()
}

async fn connect(node: &FakeNode) -> Connection {
    let conn = Connection::connect_with_probe(&node.config(), &NoPush)
        .await
        .unwrap();
    assert_eq!(conn.mode(), TransportMode::HttpOnly);
    conn
}

fn fast<'a>(conn: &'a Connection, node: &FakeNode, timeout_ms: u64) -> Submitter<'a> {
    Submitter::new(conn, &node.config())
        .with_timing(Duration::from_millis(timeout_ms), Duration::from_millis(10))
}

#[tokio::test]
async fn confirmed_after_pending_polls() {
    let node = FakeNode::start().await;
    node.with_chain_tip(1_000, 10)
        .push("getSignatureStatuses", statuses(Value::Null))
        .push("getSignatureStatuses", status(5, "processed", Value::Null))
        .always("getSignatureStatuses", status(6, "confirmed", Value::Null));

    let conn = connect(&node).await;
    let wallet = wallet();
    let outcome = fast(&conn, &node, 5_000)
        .submit(&[pause_ix(&wallet)], &wallet)
        .await
        .unwrap();

    match &outcome {
        Outcome::Confirmed { slot, .. } => assert_eq!(*slot, 6),
        other => panic!("expected confirmed, got {other:?}"),
    }
    assert_eq!(outcome.state(), SubmissionState::Confirmed);
    assert_eq!(node.count("getSignatureStatuses"), 3);

    let methods = node.methods();
    assert_eq!(methods[0], "getLatestBlockhash");
    assert_eq!(methods[1], "sendTransaction");

    // The signature the node echoed is the one the outcome reports.
    let wire = sent_wire(&node);
    assert_eq!(wire[0], 1);
    assert_eq!(&wire[1..65], &outcome.signature().as_bytes()[..]);
}

#[tokio::test]
async fn send_uses_preflight_at_configured_commitment() {
    let node = FakeNode::start().await;
    node.with_chain_tip(1_000, 10)
        .always("getSignatureStatuses", status(6, "finalized", Value::Null));

    let conn = connect(&node).await;
    let wallet = wallet();
    fast(&conn, &node, 1_000)
        .submit(&[pause_ix(&wallet)], &wallet)
        .await
        .unwrap();

    let params = node.params("sendTransaction").unwrap();
    assert_eq!(params[1]["encoding"], "base64");
    assert_eq!(params[1]["skipPreflight"], false);
    assert_eq!(params[1]["preflightCommitment"], "confirmed");
}

#[tokio::test]
async fn preflight_failure_is_rejected_without_polling() {
    let node = FakeNode::start().await;
    node.with_chain_tip(1_000, 10).always(
        "sendTransaction",
        Reply::Error {
            code: -32002,
            message: "Transaction simulation failed: Error processing Instruction 0".into(),
            data: Some(json!({
                "err": { "InstructionError": [0, { "Custom": 6000 }] },
                "logs": ["Program log: Instruction: SetPause", "Program log: Unauthorized"],
            })),
        },
    );

    let conn = connect(&node).await;
    let wallet = wallet();
    let outcome = fast(&conn, &node, 1_000)
        .submit(&[pause_ix(&wallet)], &wallet)
        .await
        .unwrap();

    match outcome {
        Outcome::RejectedOnChain { error, .. } => {
            assert!(error.contains("simulation failed"), "{error}");
            assert!(error.contains("Unauthorized"), "{error}");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(node.count("getSignatureStatuses"), 0);
}

#[tokio::test]
async fn other_send_errors_are_returned() {
    let node = FakeNode::start().await;
    node.with_chain_tip(1_000, 10).always(
        "sendTransaction",
        Reply::Error {
            code: -32005,
            message: "Node is unhealthy".into(),
            data: None,
        },
    );

    let conn = connect(&node).await;
    let wallet = wallet();
    let err = fast(&conn, &node, 1_000)
        .submit(&[pause_ix(&wallet)], &wallet)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Rpc { code: -32005, .. }));
}

#[tokio::test]
async fn on_chain_error_is_rejected() {
    let node = FakeNode::start().await;
    node.with_chain_tip(1_000, 10).always(
        "getSignatureStatuses",
        status(7, "confirmed", json!({ "InstructionError": [0, { "Custom": 6001 }] })),
    );

    let conn = connect(&node).await;
    let wallet = wallet();
    let outcome = fast(&conn, &node, 1_000)
        .submit(&[pause_ix(&wallet)], &wallet)
        .await
        .unwrap();

    assert_eq!(outcome.state(), SubmissionState::RejectedOnChain);
    match outcome {
        Outcome::RejectedOnChain { error, .. } => assert!(error.contains("6001"), "{error}"),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn unseen_signature_times_out() {
    let node = FakeNode::start().await;
    node.with_chain_tip(1_000, 10)
        .always("getSignatureStatuses", statuses(Value::Null));

    let conn = connect(&node).await;
    let wallet = wallet();
    let outcome = fast(&conn, &node, 150)
        .submit(&[pause_ix(&wallet)], &wallet)
        .await
        .unwrap();

    assert_eq!(outcome.state(), SubmissionState::TimedOut);
    assert!(node.count("getSignatureStatuses") >= 2);
}

#[tokio::test]
async fn slow_status_poll_is_cut_off_at_the_deadline() {
    let node = FakeNode::start().await;
    // Each status answer takes longer than the whole confirmation window
    // but stays inside the 2 s HTTP request timeout.
    node.with_chain_tip(1_000, 10).always(
        "getSignatureStatuses",
        Reply::Delayed {
            ms: 1_500,
            result: json!({ "context": { "slot": 100 }, "value": [null] }),
        },
    );

    let conn = connect(&node).await;
    let wallet = wallet();
    let started = Instant::now();
    let outcome = fast(&conn, &node, 200)
        .submit(&[pause_ix(&wallet)], &wallet)
        .await
        .unwrap();

    assert_eq!(outcome.state(), SubmissionState::TimedOut);
    assert!(
        started.elapsed() < Duration::from_millis(1_200),
        "confirmation overran its window: {:?}",
        started.elapsed()
    );
    assert_eq!(node.count("getSignatureStatuses"), 1);
}

#[tokio::test]
async fn expired_blockhash_ends_polling_early() {
    let node = FakeNode::start().await;
    node.with_chain_tip(1_000, 1_001)
        .always("getSignatureStatuses", statuses(Value::Null));

    let conn = connect(&node).await;
    let wallet = wallet();
    let started = Instant::now();
    let outcome = fast(&conn, &node, 30_000)
        .submit(&[pause_ix(&wallet)], &wallet)
        .await
        .unwrap();

    assert_eq!(outcome.state(), SubmissionState::TimedOut);
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(node.count("getSignatureStatuses"), 1);
}

#[tokio::test]
async fn transient_poll_failures_keep_polling() {
    let node = FakeNode::start().await;
    node.with_chain_tip(1_000, 10)
        .push("getSignatureStatuses", Reply::Status(500))
        .push(
            "getSignatureStatuses",
            Reply::Error {
                code: -32603,
                message: "Internal error".into(),
                data: None,
            },
        )
        .always("getSignatureStatuses", status(9, "confirmed", Value::Null));

    let conn = connect(&node).await;
    let wallet = wallet();
    let outcome = fast(&conn, &node, 5_000)
        .submit(&[pause_ix(&wallet)], &wallet)
        .await
        .unwrap();

    assert!(outcome.is_confirmed());
    assert_eq!(node.count("getSignatureStatuses"), 3);
}

#[tokio::test]
async fn disconnected_wallet_never_reaches_the_node() {
    struct Disconnected;

    #[async_trait::async_trait]
    impl Wallet for Disconnected {
        fn public_key(&self) -> Option<Address> {
            None
        }

        async fn sign_message(&self, _message: &[u8]) -> Result<chain_analos::Signature, ClientError> {
            Err(ClientError::WalletNotConnected)
        }
    }

    let node = FakeNode::start().await;
    node.with_chain_tip(1_000, 10);
    let conn = connect(&node).await;

    let err = fast(&conn, &node, 1_000)
        .submit(&[pause_ix(&wallet())], &Disconnected)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::WalletNotConnected));
    assert!(node.methods().is_empty());
}

#[tokio::test]
async fn fresh_mint_co_signs() {
    let node = FakeNode::start().await;
    node.with_chain_tip(1_000, 10)
        .always("getSignatureStatuses", status(3, "confirmed", Value::Null));

    let conn = connect(&node).await;
    let payer = wallet();
    let nft_mint = SigningKey::from_bytes(&[2; 32]);
    let mint_address = Address::new(nft_mint.verifying_key().to_bytes());
    let ix = LaunchpadProgram::new(LAUNCHPAD_PROGRAM_ID)
        .mint_placeholder(&Address::new([0x42; 32]), &mint_address, &payer.address())
        .unwrap();

    let submitter = fast(&conn, &node, 1_000);
    let err = submitter.submit(&[ix.clone()], &payer).await.unwrap_err();
    assert!(matches!(err, ClientError::WalletRejected(_)));
    assert_eq!(node.count("sendTransaction"), 0);

    let outcome = submitter
        .submit_with_signers(&[ix], &payer, &[&nft_mint])
        .await
        .unwrap();
    assert!(outcome.is_confirmed());

    let wire = sent_wire(&node);
    assert_eq!(wire[0], 2);
}

#[tokio::test]
async fn collection_account_decodes_from_rpc() {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;

    let mut data = launchpad_core::accounts::COLLECTION_CONFIG_DISCRIMINATOR.to_vec();
    data.extend_from_slice(&[0x42; 32]);
    for v in [500u64, 500, 2_500_000_000, 250] {
        data.extend_from_slice(&v.to_le_bytes());
    }
    data.extend_from_slice(&[0, 0]);
    data.extend_from_slice(&[0xAB; 32]);
    data.extend_from_slice(&[0x09; 32]);
    for s in ["Los Bros", "LOSB", "https://x/p.json"] {
        data.extend_from_slice(&(s.len() as u32).to_le_bytes());
        data.extend_from_slice(s.as_bytes());
    }

    let node = FakeNode::start().await;
    node.always(
        "getAccountInfo",
        Reply::Result(json!({
            "context": { "slot": 1 },
            "value": {
                "lamports": 2_000_000,
                "owner": LAUNCHPAD_PROGRAM_ID.to_string(),
                "executable": false,
                "data": [BASE64.encode(&data), "base64"],
                "rentEpoch": 0,
            }
        })),
    );
    let conn = connect(&node).await;

    let address = LaunchpadProgram::new(LAUNCHPAD_PROGRAM_ID)
        .collection_config(&Address::new([0x42; 32]))
        .unwrap()
        .address;
    let info = conn.rpc().get_account_info(&address).await.unwrap().unwrap();
    assert_eq!(info.owner, LAUNCHPAD_PROGRAM_ID);

    let config = CollectionConfig::decode(&info.data).unwrap();
    assert_eq!(config.collection_name, "Los Bros");
    assert_eq!(config.price_los(), 2.5);
    assert_eq!(config.remaining_supply(), 0);
    assert!(config.can_mint().is_err());
}

#[tokio::test]
async fn missing_account_is_none() {
    let node = FakeNode::start().await;
    node.always(
        "getAccountInfo",
        Reply::Result(json!({ "context": { "slot": 1 }, "value": null })),
    );
    let conn = connect(&node).await;
    assert!(conn
        .rpc()
        .get_account_info(&Address::new([5; 32]))
        .await
        .unwrap()
        .is_none());
}
