//! In-process fakes: a scripted JSON-RPC node and an HTTP record store.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chain_analos::{decode_compact_u16, Signature};
use launchpad_client::{ClientConfig, ClientError, PushProbe};
use launchpad_core::Network;
use serde_json::{json, Value};

/// What the fake node answers to one call.
#[derive(Debug, Clone)]
pub enum Reply {
    Result(Value),
    Error { code: i64, message: String, data: Option<Value> },
    /// Bare HTTP status with no JSON-RPC body.
    Status(u16),
    /// `sendTransaction` only: answer with the first signature in the wire bytes.
    EchoSignature,
    /// Hold the request for `ms` before answering with `result`.
    Delayed { ms: u64, result: Value },
}

#[derive(Default)]
struct NodeState {
    queued: HashMap<String, VecDeque<Reply>>,
    fallback: HashMap<String, Reply>,
    calls: Vec<(String, Value)>,
}

#[derive(Clone)]
pub struct FakeNode {
    pub url: String,
    state: Arc<Mutex<NodeState>>,
}

impl FakeNode {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(NodeState::default()));
        let app = Router::new().route("/", post(rpc)).with_state(state.clone());
        let url = serve(app).await;
        Self { url, state }
    }

    /// Answer the next call to `method` with `reply`, ahead of the fallback.
    pub fn push(&self, method: &str, reply: Reply) -> &Self {
        self.state
            .lock()
            .unwrap()
            .queued
            .entry(method.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Answer every call to `method` with `reply` once the queue is empty.
    pub fn always(&self, method: &str, reply: Reply) -> &Self {
        self.state
            .lock()
            .unwrap()
            .fallback
            .insert(method.to_string(), reply);
        self
    }

    pub fn methods(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .map(|(m, _)| m.clone())
            .collect()
    }

    pub fn count(&self, method: &str) -> usize {
        self.methods().iter().filter(|m| *m == method).count()
    }

    /// Params of the first call to `method`.
    pub fn params(&self, method: &str) -> Option<Value> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
    }

    /// Standard happy-path answers for blockhash and block height.
    pub fn with_chain_tip(&self, last_valid_block_height: u64, block_height: u64) -> &Self {
        self.always(
            "getLatestBlockhash",
            Reply::Result(json!({
                "context": { "slot": 100 },
                "value": {
                    "blockhash": bs58_blockhash(),
                    "lastValidBlockHeight": last_valid_block_height,
                }
            })),
        )
        .always("getBlockHeight", Reply::Result(json!(block_height)))
        .always("sendTransaction", Reply::EchoSignature)
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            network: Network::Localnet,
            rpc_url: Some(self.url.clone()),
            ws_handshake_timeout_ms: 50,
            request_timeout_ms: 2_000,
            ..ClientConfig::default()
        }
    }
}

pub fn bs58_blockhash() -> String {
    chain_analos::Blockhash::new([0x33; 32]).to_string()
}

pub fn statuses(entry: Value) -> Reply {
    Reply::Result(json!({ "context": { "slot": 100 }, "value": [entry] }))
}

pub fn status(slot: u64, confirmation: &str, err: Value) -> Reply {
    statuses(json!({
        "slot": slot,
        "confirmations": null,
        "err": err,
        "confirmationStatus": confirmation,
    }))
}

type Shared = Arc<Mutex<NodeState>>;

async fn rpc(State(state): State<Shared>, Json(request): Json<Value>) -> Response {
    let method = request["method"].as_str().unwrap_or_default().to_string();
    let params = request["params"].clone();
    let id = request["id"].clone();

    let reply = {
        let mut state = state.lock().unwrap();
        state.calls.push((method.clone(), params.clone()));
        let queued = state.queued.get_mut(&method).and_then(VecDeque::pop_front);
        match queued {
            Some(reply) => Some(reply),
            None => state.fallback.get(&method).cloned(),
        }
    };

    match reply {
        Some(Reply::Result(result)) => {
            Json(json!({ "jsonrpc": "2.0", "id": id, "result": result })).into_response()
        }
        Some(Reply::Error { code, message, data }) => Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": code, "message": message, "data": data },
        }))
        .into_response(),
        Some(Reply::Status(code)) => StatusCode::from_u16(code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
        Some(Reply::Delayed { ms, result }) => {
            tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
            Json(json!({ "jsonrpc": "2.0", "id": id, "result": result })).into_response()
        }
        Some(Reply::EchoSignature) => {
            let signature = first_signature(&params[0]);
            Json(json!({ "jsonrpc": "2.0", "id": id, "result": signature })).into_response()
        }
        None => Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32601, "message": format!("Method not found: {method}") },
        }))
        .into_response(),
    }
}

fn first_signature(wire: &Value) -> String {
    let bytes = BASE64.decode(wire.as_str().unwrap_or_default()).unwrap();
    let (_count, offset) = decode_compact_u16(&bytes).unwrap();
    let sig: [u8; 64] = bytes[offset..offset + 64].try_into().unwrap();
    Signature::new(sig).to_string()
}

/// Decoded wire bytes of the first `sendTransaction` call.
pub fn sent_wire(node: &FakeNode) -> Vec<u8> {
    let params = node.params("sendTransaction").expect("sendTransaction was called");
    BASE64.decode(params[0].as_str().unwrap()).unwrap()
}

/// A push probe that always fails, so tests never touch a socket for it.
pub struct NoPush;

#[async_trait]
impl PushProbe for NoPush {
    async fn handshake(&self, _url: &str) -> Result<(), ClientError> {
        Err(ClientError::Network("push disabled in tests".into()))
    }
}

/// Record store speaking `GET/PUT /{key}`, plus `/down/{key}` that always
/// fails.
#[derive(Clone)]
pub struct FakeRecordServer {
    pub url: String,
    records: Arc<Mutex<HashMap<String, Value>>>,
}

impl FakeRecordServer {
    pub async fn start() -> Self {
        let records: Arc<Mutex<HashMap<String, Value>>> = Arc::default();
        let app = Router::new()
            .route("/records/{key}", get(get_record).put(put_record))
            .route("/down/{key}", any(|| async { StatusCode::SERVICE_UNAVAILABLE }))
            .with_state(records.clone());
        let url = serve(app).await;
        Self { url, records }
    }

    pub fn base(&self) -> String {
        format!("{}/records", self.url)
    }

    pub fn down(&self) -> String {
        format!("{}/down", self.url)
    }

    pub fn stored(&self, key: &str) -> Option<Value> {
        self.records.lock().unwrap().get(key).cloned()
    }

    pub fn insert(&self, key: &str, record: Value) {
        self.records.lock().unwrap().insert(key.to_string(), record);
    }
}

type Records = Arc<Mutex<HashMap<String, Value>>>;

async fn get_record(State(records): State<Records>, Path(key): Path<String>) -> Response {
    match records.lock().unwrap().get(&key) {
        Some(record) => Json(record.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn put_record(
    State(records): State<Records>,
    Path(key): Path<String>,
    Json(record): Json<Value>,
) -> StatusCode {
    records.lock().unwrap().insert(key, record);
    StatusCode::NO_CONTENT
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
