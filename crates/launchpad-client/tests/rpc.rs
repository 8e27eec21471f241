//! Read-side JSON-RPC methods against a scripted node.

mod common;

use chain_analos::{Address, TOKEN_PROGRAM_ID};
use launchpad_client::{ClientError, RpcClient};
use serde_json::{json, Value};

use common::{FakeNode, Reply};

fn wallet() -> Address {
    Address::new([0x42; 32])
}

fn parsed_token_account(pubkey: Address, mint: Address, amount: &str, decimals: u8, ui: Value) -> Value {
    json!({
        "pubkey": pubkey.to_string(),
        "account": {
            "data": {
                "program": "spl-token",
                "parsed": {
                    "info": {
                        "isNative": false,
                        "mint": mint.to_string(),
                        "owner": wallet().to_string(),
                        "state": "initialized",
                        "tokenAmount": {
                            "amount": amount,
                            "decimals": decimals,
                            "uiAmount": ui,
                            "uiAmountString": "0",
                        }
                    },
                    "type": "account"
                },
                "space": 165
            },
            "executable": false,
            "lamports": 2_039_280,
            "owner": TOKEN_PROGRAM_ID.to_string(),
            "rentEpoch": 18_446_744_073_709_551_615u64
        }
    })
}

#[tokio::test]
async fn token_accounts_decode_parsed_balances() {
    let node = FakeNode::start().await;
    let nft_mint = Address::new([0x07; 32]);
    let los_mint = Address::new([0x08; 32]);
    node.always(
        "getTokenAccountsByOwner",
        Reply::Result(json!({
            "context": { "slot": 77 },
            "value": [
                parsed_token_account(Address::new([0x11; 32]), nft_mint, "1", 0, json!(1.0)),
                parsed_token_account(Address::new([0x12; 32]), los_mint, "0", 9, Value::Null),
            ]
        })),
    );

    let rpc = RpcClient::from_config(&node.config()).unwrap();
    let accounts = rpc.get_token_accounts_by_owner(&wallet(), None).await.unwrap();

    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0].address, Address::new([0x11; 32]));
    assert_eq!(accounts[0].mint, nft_mint);
    assert_eq!(accounts[0].amount, "1");
    assert_eq!(accounts[0].decimals, 0);
    assert_eq!(accounts[0].ui_amount, Some(1.0));

    assert_eq!(accounts[1].mint, los_mint);
    assert_eq!(accounts[1].amount, "0");
    assert_eq!(accounts[1].decimals, 9);
    assert_eq!(accounts[1].ui_amount, None);

    let params = node.params("getTokenAccountsByOwner").unwrap();
    assert_eq!(params[0], json!(wallet().to_string()));
    assert_eq!(params[1], json!({ "programId": TOKEN_PROGRAM_ID.to_string() }));
    assert_eq!(params[2]["encoding"], "jsonParsed");
    assert_eq!(params[2]["commitment"], rpc.commitment().as_str());
}

#[tokio::test]
async fn token_accounts_filter_by_mint() {
    let node = FakeNode::start().await;
    let mint = Address::new([0x07; 32]);
    node.always(
        "getTokenAccountsByOwner",
        Reply::Result(json!({ "context": { "slot": 1 }, "value": [] })),
    );

    let rpc = RpcClient::from_config(&node.config()).unwrap();
    let accounts = rpc.get_token_accounts_by_owner(&wallet(), Some(&mint)).await.unwrap();

    assert!(accounts.is_empty());
    let params = node.params("getTokenAccountsByOwner").unwrap();
    assert_eq!(params[1], json!({ "mint": mint.to_string() }));
    assert!(params[1].get("programId").is_none());
}

#[tokio::test]
async fn balance_reads_context_value() {
    let node = FakeNode::start().await;
    node.always(
        "getBalance",
        Reply::Result(json!({ "context": { "slot": 9 }, "value": 1_500_000_000u64 })),
    );

    let rpc = RpcClient::from_config(&node.config()).unwrap();
    assert_eq!(rpc.get_balance(&wallet()).await.unwrap(), 1_500_000_000);

    let params = node.params("getBalance").unwrap();
    assert_eq!(params[0], json!(wallet().to_string()));
    assert_eq!(params[1]["commitment"], rpc.commitment().as_str());
}

#[tokio::test]
async fn balance_surfaces_invalid_param_errors() {
    let node = FakeNode::start().await;
    node.always(
        "getBalance",
        Reply::Error {
            code: -32602,
            message: "Invalid param: WrongSize".into(),
            data: None,
        },
    );

    let rpc = RpcClient::from_config(&node.config()).unwrap();
    match rpc.get_balance(&wallet()).await {
        Err(ClientError::Rpc { code, message }) => {
            assert_eq!(code, -32602);
            assert!(message.contains("WrongSize"));
        }
        other => panic!("expected rpc error, got {other:?}"),
    }
}
