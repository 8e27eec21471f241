use std::fmt;

use anyhow::Result;
use chain_analos::Signature;
use launchpad_client::{ClientConfig, Connection};
use serde::Serialize;
use serde_json::Value;

use crate::output;

#[derive(Debug, Serialize)]
pub struct StatusOut {
    pub signature: Signature,
    pub found: bool,
    pub slot: Option<u64>,
    pub confirmation_status: Option<String>,
    pub err: Option<Value>,
    pub explorer: String,
}

impl fmt::Display for StatusOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "signature: {}", self.signature)?;
        if !self.found {
            writeln!(f, "status:    not found (unknown, expired or not yet seen)")?;
        } else {
            let level = self.confirmation_status.as_deref().unwrap_or("unknown");
            match &self.err {
                Some(err) => writeln!(f, "status:    failed ({level}): {err}")?,
                None => writeln!(f, "status:    {level}")?,
            }
            if let Some(slot) = self.slot {
                writeln!(f, "slot:      {slot}")?;
            }
        }
        write!(f, "explorer:  {}", self.explorer)
    }
}

pub async fn run(config: &ClientConfig, signature: &Signature) -> Result<()> {
    let conn = Connection::connect(config).await?;
    let status = conn
        .rpc()
        .get_signature_statuses(std::slice::from_ref(signature))
        .await?
        .pop()
        .flatten();

    let out = match status {
        Some(status) => StatusOut {
            signature: *signature,
            found: true,
            slot: Some(status.slot),
            confirmation_status: status.confirmation_status,
            err: status.err,
            explorer: conn.network().explorer_tx_url(signature),
        },
        None => StatusOut {
            signature: *signature,
            found: false,
            slot: None,
            confirmation_status: None,
            err: None,
            explorer: conn.network().explorer_tx_url(signature),
        },
    };
    output::print(&out)
}
