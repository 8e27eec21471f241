//! Connection adapter.
//!
//! Building a connection never fails because of the WebSocket endpoint. The
//! pubsub handshake is probed once, bounded by `ws_handshake_timeout`; an
//! error or a timeout downgrades the connection to HTTP polling.

use std::time::Duration;

use async_trait::async_trait;
use launchpad_core::Network;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::rpc::RpcClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportMode {
    /// Pubsub handshake succeeded.
    Push,
    /// Pubsub unavailable; all status comes from HTTP polling.
    HttpOnly,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportMode::Push => f.write_str("push"),
            TransportMode::HttpOnly => f.write_str("http-only"),
        }
    }
}

/// Attempts a push-channel handshake.
#[async_trait]
pub trait PushProbe: Send + Sync {
    async fn handshake(&self, url: &str) -> Result<(), ClientError>;
}

/// Opens a WebSocket to the pubsub endpoint and closes it again.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketProbe;

#[async_trait]
impl PushProbe for WebSocketProbe {
    async fn handshake(&self, url: &str) -> Result<(), ClientError> {
        let (mut stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| ClientError::Network(format!("websocket handshake: {e}")))?;
        // Only the upgrade matters; a failed close is not an error.
        let _ = stream.close(None).await;
        Ok(())
    }
}

/// Resolve the transport mode. Never fails.
pub async fn probe_transport(
    probe: &dyn PushProbe,
    ws_url: Option<&str>,
    handshake_timeout: Duration,
) -> TransportMode {
    let Some(url) = ws_url else {
        warn!("no websocket endpoint configured, using HTTP polling");
        return TransportMode::HttpOnly;
    };

    match tokio::time::timeout(handshake_timeout, probe.handshake(url)).await {
        Ok(Ok(())) => TransportMode::Push,
        Ok(Err(e)) => {
            warn!(url, error = %e, "websocket unavailable, falling back to HTTP polling");
            TransportMode::HttpOnly
        }
        Err(_) => {
            warn!(
                url,
                timeout_ms = handshake_timeout.as_millis() as u64,
                "websocket handshake timed out, falling back to HTTP polling"
            );
            TransportMode::HttpOnly
        }
    }
}

/// An RPC client plus the transport mode negotiated at start-up.
///
/// Built once and passed down explicitly.
#[derive(Debug)]
pub struct Connection {
    rpc: RpcClient,
    network: Network,
    ws_url: Option<String>,
    mode: TransportMode,
}

impl Connection {
    pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::connect_with_probe(config, &WebSocketProbe).await
    }

    /// Errors only on invalid configuration.
    pub async fn connect_with_probe(
        config: &ClientConfig,
        probe: &dyn PushProbe,
    ) -> Result<Self, ClientError> {
        config.validate()?;
        let rpc = RpcClient::from_config(config)?;
        let ws_url = config.ws_url();
        let mode = probe_transport(probe, ws_url.as_deref(), config.ws_handshake_timeout()).await;
        info!(
            network = %config.network,
            rpc = rpc.url(),
            mode = %mode,
            "connection ready"
        );
        Ok(Self {
            rpc,
            network: config.network,
            ws_url,
            mode,
        })
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn ws_url(&self) -> Option<&str> {
        self.ws_url.as_deref()
    }

    pub fn mode(&self) -> TransportMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct Succeeds;
    struct Fails;
    struct Hangs;

    #[async_trait]
    impl PushProbe for Succeeds {
        async fn handshake(&self, _url: &str) -> Result<(), ClientError> {
            Ok(())
        }
    }

    #[async_trait]
    impl PushProbe for Fails {
        async fn handshake(&self, _url: &str) -> Result<(), ClientError> {
            Err(ClientError::Network("connection refused".into()))
        }
    }

    #[async_trait]
    impl PushProbe for Hangs {
        async fn handshake(&self, _url: &str) -> Result<(), ClientError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    #[derive(Default)]
    struct Counting(AtomicUsize);

    #[async_trait]
    impl PushProbe for Counting {
        async fn handshake(&self, _url: &str) -> Result<(), ClientError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn local_config() -> ClientConfig {
        ClientConfig {
            network: Network::Localnet,
            ws_handshake_timeout_ms: 50,
            ..ClientConfig::default()
        }
    }

    #[tokio::test]
    async fn successful_handshake_gives_push() {
        let conn = Connection::connect_with_probe(&local_config(), &Succeeds).await.unwrap();
        assert_eq!(conn.mode(), TransportMode::Push);
        assert_eq!(conn.rpc().url(), "http://127.0.0.1:8899");
    }

    #[tokio::test]
    async fn failed_handshake_falls_back_to_http() {
        let conn = Connection::connect_with_probe(&local_config(), &Fails).await.unwrap();
        assert_eq!(conn.mode(), TransportMode::HttpOnly);
    }

    #[tokio::test]
    async fn hanging_handshake_times_out_to_http() {
        let started = std::time::Instant::now();
        let conn = Connection::connect_with_probe(&local_config(), &Hangs).await.unwrap();
        assert_eq!(conn.mode(), TransportMode::HttpOnly);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn missing_ws_endpoint_skips_probe() {
        let probe = Counting::default();
        let config = ClientConfig {
            network: Network::Devnet,
            rpc_url: Some("ftp://devnet.example".into()),
            ..ClientConfig::default()
        };
        let conn = Connection::connect_with_probe(&config, &probe).await.unwrap();
        assert_eq!(conn.mode(), TransportMode::HttpOnly);
        assert_eq!(probe.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_config_is_the_only_failure() {
        let config = ClientConfig::for_network(Network::Testnet);
        let err = Connection::connect_with_probe(&config, &Succeeds).await.unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[tokio::test]
    async fn real_probe_against_closed_port_falls_back() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = format!("ws://127.0.0.1:{port}");
        let mode = probe_transport(&WebSocketProbe, Some(&url), Duration::from_secs(2)).await;
        assert_eq!(mode, TransportMode::HttpOnly);
    }
}
