//! Collection metadata store.
//!
//! Records describing collections this client created are cached in an
//! ordered list of backends. Reads try each backend in turn and writes go
//! to all of them. A cached PDA is never trusted over derivation: it is
//! recomputed on every load.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chain_analos::{Address, Signature};
use launchpad_core::{CollectionParams, LaunchpadProgram, Network};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRecord {
    pub network: Network,
    pub program_id: Address,
    pub authority: Address,
    /// Cached `["collection", authority]` PDA.
    pub collection_config: Address,
    pub collection_mint: Option<Address>,
    pub name: String,
    pub symbol: String,
    pub max_supply: u64,
    pub price_lamports: u64,
    pub reveal_threshold: u64,
    pub placeholder_uri: String,
    #[serde(default)]
    pub signature: Option<Signature>,
    /// Unix seconds.
    pub created_at: u64,
}

impl CollectionRecord {
    pub fn new(
        network: Network,
        program: &LaunchpadProgram,
        authority: Address,
        collection_mint: Option<Address>,
        params: &CollectionParams,
    ) -> Result<Self, ClientError> {
        let collection_config = program.collection_config(&authority)?.address;
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Ok(Self {
            network,
            program_id: program.program_id,
            authority,
            collection_config,
            collection_mint,
            name: params.name.clone(),
            symbol: params.symbol.clone(),
            max_supply: params.max_supply,
            price_lamports: params.price_lamports,
            reveal_threshold: params.reveal_threshold,
            placeholder_uri: params.placeholder_uri.clone(),
            signature: None,
            created_at,
        })
    }

    /// Records are keyed by their collection config address.
    pub fn key(&self) -> String {
        self.collection_config.to_string()
    }

    /// Recompute the collection config PDA and overwrite a stale cached
    /// value. Returns `true` if the record was corrected.
    pub fn reconcile(&mut self) -> Result<bool, ClientError> {
        let derived = LaunchpadProgram::new(self.program_id)
            .collection_config(&self.authority)?
            .address;
        if derived == self.collection_config {
            return Ok(false);
        }
        warn!(
            cached = %self.collection_config,
            derived = %derived,
            authority = %self.authority,
            "cached collection address disagrees with derivation, using derived"
        );
        self.collection_config = derived;
        Ok(true)
    }
}

/// One place collection records can live.
#[async_trait]
pub trait MetadataBackend: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` when the backend works but has no record for `key`.
    async fn load(&self, key: &str) -> Result<Option<CollectionRecord>, ClientError>;

    async fn save(&self, record: &CollectionRecord) -> Result<(), ClientError>;
}

/// Only base58 addresses are valid keys, which also keeps keys out of
/// path and URL syntax.
fn check_key(key: &str) -> Result<(), ClientError> {
    key.parse::<Address>()
        .map(|_| ())
        .map_err(|_| ClientError::Store(format!("invalid record key {key:?}")))
}

/// One JSON file per collection under a directory.
#[derive(Debug, Clone)]
pub struct LocalFileBackend {
    dir: PathBuf,
}

impl LocalFileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl MetadataBackend for LocalFileBackend {
    fn name(&self) -> &str {
        "local"
    }

    async fn load(&self, key: &str) -> Result<Option<CollectionRecord>, ClientError> {
        check_key(key)?;
        let path = self.path_for(key);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ClientError::Store(format!("{}: {e}", path.display()))),
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| ClientError::Store(format!("{}: {e}", path.display())))
    }

    async fn save(&self, record: &CollectionRecord) -> Result<(), ClientError> {
        let key = record.key();
        check_key(&key)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ClientError::Store(format!("{}: {e}", self.dir.display())))?;

        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| ClientError::Store(format!("serialize: {e}")))?;
        // Write then rename so readers never see a torn file.
        let path = self.path_for(&key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| ClientError::Store(format!("{}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| ClientError::Store(format!("{}: {e}", path.display())))
    }
}

/// JSON over HTTP: `GET {base}/{key}` and `PUT {base}/{key}`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    name: String,
    base_url: String,
    http: reqwest::Client,
}

impl HttpBackend {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Store(format!("HTTP client error: {e}")))?;
        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{key}", self.base_url)
    }

    fn store_err(&self, e: impl std::fmt::Display) -> ClientError {
        ClientError::Store(format!("{}: {e}", self.name))
    }
}

#[async_trait]
impl MetadataBackend for HttpBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self, key: &str) -> Result<Option<CollectionRecord>, ClientError> {
        check_key(key)?;
        let response = self
            .http
            .get(self.url_for(key))
            .send()
            .await
            .map_err(|e| self.store_err(e))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status().map_err(|e| self.store_err(e))?;
        response.json().await.map(Some).map_err(|e| self.store_err(e))
    }

    async fn save(&self, record: &CollectionRecord) -> Result<(), ClientError> {
        let key = record.key();
        check_key(&key)?;
        self.http
            .put(self.url_for(&key))
            .json(record)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map(|_| ())
            .map_err(|e| self.store_err(e))
    }
}

/// Per-backend result of a fan-out save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendResult {
    pub backend: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub results: Vec<BackendResult>,
}

impl SaveReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.error.is_none()).count()
    }
}

/// Ordered list of backends, each isolated from the others' failures.
#[derive(Default)]
pub struct FallbackStore {
    backends: Vec<Box<dyn MetadataBackend>>,
}

impl std::fmt::Debug for FallbackStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.backends.iter().map(|b| b.name()))
            .finish()
    }
}

impl FallbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(mut self, backend: impl MetadataBackend + 'static) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    /// Local directory first, then the HTTP backends in configured order.
    pub fn from_config(config: &StoreConfig, timeout: Duration) -> Result<Self, ClientError> {
        let mut store = Self::new();
        if let Some(dir) = &config.local_dir {
            store = store.with_backend(LocalFileBackend::new(dir.clone()));
        }
        for (i, base) in config.http_backends.iter().enumerate() {
            store = store.with_backend(HttpBackend::new(format!("http-{i}"), base.clone(), timeout)?);
        }
        Ok(store)
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// First record found, in backend order. Errors only if no backend
    /// could answer at all.
    pub async fn load(&self, key: &str) -> Result<Option<CollectionRecord>, ClientError> {
        let mut answered = false;
        let mut last_error = None;

        for backend in &self.backends {
            match backend.load(key).await {
                Ok(Some(mut record)) => {
                    record.reconcile()?;
                    debug!(backend = backend.name(), key, "record loaded");
                    return Ok(Some(record));
                }
                Ok(None) => {
                    answered = true;
                    debug!(backend = backend.name(), key, "record not in backend");
                }
                Err(e) => {
                    warn!(backend = backend.name(), key, error = %e, "backend load failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !answered => Err(e),
            _ => Ok(None),
        }
    }

    /// Write to every backend. Succeeds if at least one write did.
    pub async fn save(&self, record: &CollectionRecord) -> Result<SaveReport, ClientError> {
        if self.backends.is_empty() {
            return Err(ClientError::Store("no metadata backends configured".into()));
        }

        let mut results = Vec::with_capacity(self.backends.len());
        for backend in &self.backends {
            let error = match backend.save(record).await {
                Ok(()) => None,
                Err(e) => {
                    warn!(backend = backend.name(), key = %record.key(), error = %e, "backend save failed");
                    Some(e.to_string())
                }
            };
            results.push(BackendResult {
                backend: backend.name().to_string(),
                error,
            });
        }

        let report = SaveReport { results };
        if report.succeeded() == 0 {
            return Err(ClientError::Store(format!(
                "all {} backends failed to save {}",
                report.results.len(),
                record.key()
            )));
        }
        info!(key = %record.key(), saved = report.succeeded(), of = report.results.len(), "record saved");
        Ok(report)
    }
}
