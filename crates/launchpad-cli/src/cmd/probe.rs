use std::fmt;

use anyhow::Result;
use launchpad_client::{ClientConfig, Connection, TransportMode};
use launchpad_core::Network;
use serde::Serialize;
use tracing::warn;

use crate::output;

#[derive(Debug, Serialize)]
pub struct ProbeOut {
    pub network: Network,
    pub rpc_url: String,
    pub ws_url: Option<String>,
    pub mode: TransportMode,
    pub healthy: bool,
    pub block_height: Option<u64>,
}

impl fmt::Display for ProbeOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "network:   {} ({})", self.network.display_name(), self.network)?;
        writeln!(f, "rpc:       {}", self.rpc_url)?;
        writeln!(f, "websocket: {}", self.ws_url.as_deref().unwrap_or("-"))?;
        writeln!(f, "transport: {}", self.mode)?;
        write!(f, "healthy:   {}", if self.healthy { "yes" } else { "no" })?;
        if let Some(height) = self.block_height {
            write!(f, "\nheight:    {height}")?;
        }
        Ok(())
    }
}

pub async fn run(config: &ClientConfig) -> Result<()> {
    let conn = Connection::connect(config).await?;

    let healthy = match conn.rpc().get_health().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "node reports unhealthy");
            false
        }
    };
    let block_height = conn.rpc().get_block_height().await.ok();

    output::print(&ProbeOut {
        network: conn.network(),
        rpc_url: conn.rpc().url().to_string(),
        ws_url: conn.ws_url().map(str::to_string),
        mode: conn.mode(),
        healthy,
        block_height,
    })
}
