//! Client configuration.
//!
//! Layered as: `Default` -> optional JSON file -> `ANALOS_*` environment ->
//! command-line flags (applied by the caller). Every layer only overrides
//! what it sets.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use launchpad_core::types::derive_ws_url;
use launchpad_core::{Network, ProgramIds};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

pub const ENV_RPC_URL: &str = "ANALOS_RPC_URL";
pub const ENV_WS_URL: &str = "ANALOS_WS_URL";
pub const ENV_NETWORK: &str = "ANALOS_NETWORK";
pub const ENV_COMMITMENT: &str = "ANALOS_COMMITMENT";
pub const ENV_CONFIRM_TIMEOUT_MS: &str = "ANALOS_CONFIRM_TIMEOUT_MS";

/// How settled a block must be before the node reports on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }

    /// Whether a `confirmationStatus` reported by the node satisfies this
    /// level.
    pub fn is_satisfied_by(&self, status: &str) -> bool {
        status
            .parse::<Commitment>()
            .map(|reported| reported >= *self)
            .unwrap_or(false)
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Commitment {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "processed" => Ok(Commitment::Processed),
            "confirmed" => Ok(Commitment::Confirmed),
            "finalized" => Ok(Commitment::Finalized),
            other => Err(ClientError::Config(format!("unknown commitment {other:?}"))),
        }
    }
}

/// Where collection records are cached, in fallback order: the local
/// directory first, then each HTTP base URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub local_dir: Option<PathBuf>,
    pub http_backends: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub network: Network,
    /// Overrides the network's built-in endpoint.
    pub rpc_url: Option<String>,
    pub ws_url: Option<String>,
    pub commitment: Commitment,
    pub ws_handshake_timeout_ms: u64,
    pub confirm_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub programs: ProgramIds,
    pub store: StoreConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            rpc_url: None,
            ws_url: None,
            commitment: Commitment::Confirmed,
            ws_handshake_timeout_ms: 5_000,
            confirm_timeout_ms: 60_000,
            poll_interval_ms: 2_000,
            request_timeout_ms: 30_000,
            programs: ProgramIds::default(),
            store: StoreConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn for_network(network: Network) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }

    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ClientError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))
    }

    /// Apply `ANALOS_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ClientError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup, used by `apply_env`.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(network) = get(ENV_NETWORK) {
            self.network = network
                .parse()
                .map_err(|e| ClientError::Config(format!("{ENV_NETWORK}: {e}")))?;
        }
        if let Some(url) = get(ENV_RPC_URL) {
            self.rpc_url = Some(url);
        }
        if let Some(url) = get(ENV_WS_URL) {
            self.ws_url = Some(url);
        }
        if let Some(commitment) = get(ENV_COMMITMENT) {
            self.commitment = commitment.parse()?;
        }
        if let Some(ms) = get(ENV_CONFIRM_TIMEOUT_MS) {
            self.confirm_timeout_ms = ms.trim().parse().map_err(|_| {
                ClientError::Config(format!("{ENV_CONFIRM_TIMEOUT_MS}: not a number: {ms}"))
            })?;
        }
        Ok(())
    }

    /// The JSON-RPC endpoint: explicit override, else the network default.
    pub fn rpc_url(&self) -> Result<String, ClientError> {
        self.rpc_url
            .clone()
            .or_else(|| self.network.default_rpc_url().map(str::to_string))
            .ok_or_else(|| {
                ClientError::Config(format!(
                    "no RPC endpoint for {}; set rpc_url or {ENV_RPC_URL}",
                    self.network
                ))
            })
    }

    /// The pubsub endpoint: explicit override, else the network default when
    /// the RPC endpoint is the default, else derived from the RPC URL.
    pub fn ws_url(&self) -> Option<String> {
        if let Some(url) = &self.ws_url {
            return Some(url.clone());
        }
        match &self.rpc_url {
            Some(rpc) => derive_ws_url(rpc),
            None => self.network.default_ws_url().map(str::to_string),
        }
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        self.rpc_url()?;
        for (name, value) in [
            ("ws_handshake_timeout_ms", self.ws_handshake_timeout_ms),
            ("confirm_timeout_ms", self.confirm_timeout_ms),
            ("poll_interval_ms", self.poll_interval_ms),
            ("request_timeout_ms", self.request_timeout_ms),
        ] {
            if value == 0 {
                return Err(ClientError::Config(format!("{name} must be > 0")));
            }
        }
        Ok(())
    }

    pub fn ws_handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.ws_handshake_timeout_ms)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
