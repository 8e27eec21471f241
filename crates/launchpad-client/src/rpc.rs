//! JSON-RPC 2.0 client for an Analos node.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chain_analos::{Address, Blockhash, Signature, SignedTransaction, TOKEN_PROGRAM_ID};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::{ClientConfig, Commitment};
use crate::error::ClientError;

/// Returned by `sendTransaction` when preflight simulation fails.
pub const SEND_TRANSACTION_PREFLIGHT_FAILURE: i64 = -32002;

#[derive(Debug)]
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    commitment: Commitment,
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

/// Most methods wrap their value as `{ context: { slot }, value }`.
#[derive(Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatestBlockhash {
    pub blockhash: Blockhash,
    pub last_valid_block_height: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBlockhash {
    blockhash: Blockhash,
    last_valid_block_height: u64,
}

/// One entry of `getSignatureStatuses`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureStatus {
    pub slot: u64,
    pub confirmations: Option<u64>,
    /// Program-level failure, kept opaque.
    pub err: Option<Value>,
    pub confirmation_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountInfo {
    pub lamports: u64,
    pub owner: Address,
    pub executable: bool,
    #[serde(serialize_with = "serialize_hex")]
    pub data: Vec<u8>,
}

fn serialize_hex<S: serde::Serializer>(data: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(data))
}

#[derive(Deserialize)]
struct RawAccountInfo {
    lamports: u64,
    owner: Address,
    executable: bool,
    data: (String, String),
}

/// A parsed SPL token account owned by a wallet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenAccountBalance {
    pub address: Address,
    pub mint: Address,
    /// Raw amount as a decimal string, exactly as the node reports it.
    pub amount: String,
    pub decimals: u8,
    pub ui_amount: Option<f64>,
}

#[derive(Deserialize)]
struct RawKeyedAccount {
    pubkey: Address,
    account: RawParsedAccount,
}

#[derive(Deserialize)]
struct RawParsedAccount {
    data: RawParsedData,
}

#[derive(Deserialize)]
struct RawParsedData {
    parsed: RawParsed,
}

#[derive(Deserialize)]
struct RawParsed {
    info: RawTokenInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTokenInfo {
    mint: Address,
    token_amount: RawTokenAmount,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTokenAmount {
    amount: String,
    decimals: u8,
    ui_amount: Option<f64>,
}

impl RpcClient {
    pub fn new(
        url: impl Into<String>,
        commitment: Commitment,
        request_timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("HTTP client error: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
            commitment,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(config.rpc_url()?, config.commitment, config.request_timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn commitment(&self) -> Commitment {
        self.commitment
    }

    /// Issue one JSON-RPC call and deserialize its `result`.
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        debug!(method, id, "rpc request");

        let response = self.http.post(&self.url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Network(format!("{method}: HTTP {status}")));
        }

        let parsed: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| ClientError::Network(format!("{method}: malformed response: {e}")))?;

        if let Some(err) = parsed.error {
            return Err(ClientError::Rpc {
                code: err.code,
                message: rpc_error_message(err.message, err.data.as_ref()),
            });
        }
        parsed
            .result
            .ok_or_else(|| ClientError::Network(format!("{method}: response has no result")))
    }

    pub async fn get_latest_blockhash(&self) -> Result<LatestBlockhash, ClientError> {
        let raw: WithContext<RawBlockhash> = self
            .call("getLatestBlockhash", json!([{ "commitment": self.commitment.as_str() }]))
            .await?;
        Ok(LatestBlockhash {
            blockhash: raw.value.blockhash,
            last_valid_block_height: raw.value.last_valid_block_height,
        })
    }

    /// Submit with preflight simulation at the configured commitment.
    pub async fn send_transaction(&self, tx: &SignedTransaction) -> Result<Signature, ClientError> {
        let wire = BASE64.encode(tx.to_wire()?);
        self.call(
            "sendTransaction",
            json!([
                wire,
                {
                    "encoding": "base64",
                    "skipPreflight": false,
                    "preflightCommitment": self.commitment.as_str(),
                }
            ]),
        )
        .await
    }

    pub async fn get_signature_statuses(
        &self,
        signatures: &[Signature],
    ) -> Result<Vec<Option<SignatureStatus>>, ClientError> {
        let encoded: Vec<String> = signatures.iter().map(ToString::to_string).collect();
        let raw: WithContext<Vec<Option<SignatureStatus>>> = self
            .call("getSignatureStatuses", json!([encoded]))
            .await?;
        Ok(raw.value)
    }

    /// `None` when the account does not exist.
    pub async fn get_account_info(&self, address: &Address) -> Result<Option<AccountInfo>, ClientError> {
        let raw: WithContext<Option<RawAccountInfo>> = self
            .call(
                "getAccountInfo",
                json!([
                    address.to_string(),
                    { "encoding": "base64", "commitment": self.commitment.as_str() }
                ]),
            )
            .await?;

        raw.value
            .map(|info| {
                let (data, encoding) = info.data;
                if encoding != "base64" {
                    return Err(ClientError::Network(format!(
                        "getAccountInfo: unexpected encoding {encoding}"
                    )));
                }
                let data = BASE64
                    .decode(data)
                    .map_err(|e| ClientError::Network(format!("getAccountInfo: bad base64: {e}")))?;
                Ok(AccountInfo {
                    lamports: info.lamports,
                    owner: info.owner,
                    executable: info.executable,
                    data,
                })
            })
            .transpose()
    }

    pub async fn get_balance(&self, address: &Address) -> Result<u64, ClientError> {
        let raw: WithContext<u64> = self
            .call(
                "getBalance",
                json!([address.to_string(), { "commitment": self.commitment.as_str() }]),
            )
            .await?;
        Ok(raw.value)
    }

    pub async fn get_block_height(&self) -> Result<u64, ClientError> {
        self.call("getBlockHeight", json!([{ "commitment": self.commitment.as_str() }]))
            .await
    }

    /// Token accounts owned by `owner`, optionally restricted to one mint.
    pub async fn get_token_accounts_by_owner(
        &self,
        owner: &Address,
        mint: Option<&Address>,
    ) -> Result<Vec<TokenAccountBalance>, ClientError> {
        let filter = match mint {
            Some(mint) => json!({ "mint": mint.to_string() }),
            None => json!({ "programId": TOKEN_PROGRAM_ID.to_string() }),
        };
        let raw: WithContext<Vec<RawKeyedAccount>> = self
            .call(
                "getTokenAccountsByOwner",
                json!([
                    owner.to_string(),
                    filter,
                    { "encoding": "jsonParsed", "commitment": self.commitment.as_str() }
                ]),
            )
            .await?;

        Ok(raw
            .value
            .into_iter()
            .map(|keyed| {
                let info = keyed.account.data.parsed.info;
                TokenAccountBalance {
                    address: keyed.pubkey,
                    mint: info.mint,
                    amount: info.token_amount.amount,
                    decimals: info.token_amount.decimals,
                    ui_amount: info.token_amount.ui_amount,
                }
            })
            .collect())
    }

    /// `Ok(())` when the node reports `"ok"`.
    pub async fn get_health(&self) -> Result<(), ClientError> {
        let status: String = self.call("getHealth", json!([])).await?;
        if status == "ok" {
            Ok(())
        } else {
            Err(ClientError::Rpc {
                code: 0,
                message: format!("node unhealthy: {status}"),
            })
        }
    }
}

/// Fold the simulation error and the tail of the program logs into the
/// message so preflight failures are readable without `data`.
fn rpc_error_message(message: String, data: Option<&Value>) -> String {
    let Some(data) = data else {
        return message;
    };
    let mut out = message;
    if let Some(err) = data.get("err").filter(|e| !e.is_null()) {
        out.push_str(&format!(" ({err})"));
    }
    if let Some(logs) = data.get("logs").and_then(Value::as_array) {
        let tail: Vec<&str> = logs.iter().rev().take(3).filter_map(Value::as_str).collect();
        for line in tail.into_iter().rev() {
            out.push_str("\n  ");
            out.push_str(line);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_without_data() {
        assert_eq!(rpc_error_message("boom".into(), None), "boom");
    }

    #[test]
    fn error_message_includes_err_and_log_tail() {
        let data = json!({
            "err": { "InstructionError": [0, { "Custom": 6000 }] },
            "logs": ["a", "b", "c", "Program log: Collection is sold out"],
        });
        let msg = rpc_error_message("Transaction simulation failed".into(), Some(&data));
        assert!(msg.starts_with("Transaction simulation failed ("));
        assert!(msg.contains("Custom"));
        assert!(msg.ends_with("Program log: Collection is sold out"));
        assert!(!msg.contains("\n  a"));
    }

    #[test]
    fn signature_status_deserializes() {
        let status: SignatureStatus = serde_json::from_value(json!({
            "slot": 42,
            "confirmations": null,
            "err": null,
            "confirmationStatus": "finalized",
        }))
        .unwrap();
        assert_eq!(status.slot, 42);
        assert_eq!(status.confirmation_status.as_deref(), Some("finalized"));
        assert!(status.err.is_none());
    }
}
