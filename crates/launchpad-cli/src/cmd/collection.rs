use std::fmt;

use anyhow::{bail, Result};
use chain_analos::Address;
use launchpad_client::{ClientConfig, CollectionRecord, Connection, FallbackStore};
use launchpad_core::{lamports_to_los, CollectionConfig, LaunchpadProgram, MintPriceBreakdown};
use serde::Serialize;
use tracing::warn;

use super::short;
use crate::output;

#[derive(Debug, Serialize)]
pub struct CollectionOut {
    pub address: Address,
    pub config: CollectionConfig,
    pub price_los: f64,
    pub remaining_supply: u64,
    pub reveal_ready: bool,
    /// `None` when minting is open.
    pub mint_blocked: Option<String>,
    /// `None` when the on-chain price is too large to split into fees.
    pub fees: Option<MintPriceBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fees_error: Option<String>,
    pub explorer: String,
    pub record: Option<CollectionRecord>,
}

impl fmt::Display for CollectionOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.config;
        writeln!(f, "{} ({})", c.collection_name, c.collection_symbol)?;
        writeln!(f, "  address:   {}", self.address)?;
        writeln!(f, "  authority: {}", short(&c.authority))?;
        writeln!(f, "  mint:      {}", short(&c.collection_mint))?;
        writeln!(
            f,
            "  supply:    {}/{} ({} left)",
            c.current_supply, c.max_supply, self.remaining_supply
        )?;
        writeln!(f, "  price:     {} LOS", self.price_los)?;
        writeln!(
            f,
            "  reveal:    {} at {}{}",
            if c.is_revealed { "revealed" } else { "hidden" },
            c.reveal_threshold,
            if self.reveal_ready && !c.is_revealed { " (ready)" } else { "" }
        )?;
        writeln!(
            f,
            "  minting:   {}",
            self.mint_blocked.as_deref().unwrap_or("open")
        )?;
        match (&self.fees, &self.fees_error) {
            (Some(fees), _) => writeln!(
                f,
                "  fees:      {} LOS per mint, creator receives {} LOS",
                lamports_to_los(fees.total_fee),
                lamports_to_los(fees.creator_payment)
            )?,
            (None, Some(err)) => writeln!(f, "  fees:      unavailable ({err})")?,
            (None, None) => {}
        }
        if let Some(record) = &self.record {
            writeln!(f, "  recorded:  {} on {}", record.created_at, record.network)?;
        }
        write!(f, "  {}", self.explorer)
    }
}

pub async fn run(config: &ClientConfig, authority: &Address) -> Result<()> {
    let program = LaunchpadProgram::from_ids(&config.programs);
    let address = program.collection_config(authority)?.address;

    let conn = Connection::connect(config).await?;
    let Some(account) = conn.rpc().get_account_info(&address).await? else {
        bail!("no collection config at {address} for authority {authority}");
    };
    if account.owner != program.program_id {
        bail!(
            "{address} is owned by {}, not the launchpad program {}",
            account.owner,
            program.program_id
        );
    }
    let decoded = CollectionConfig::decode(&account.data)?;

    let explorer = conn.network().explorer_account_url(&address);
    let record = load_record(config, &address).await;
    output::print(&describe(address, decoded, explorer, record))
}

fn describe(
    address: Address,
    config: CollectionConfig,
    explorer: String,
    record: Option<CollectionRecord>,
) -> CollectionOut {
    let (fees, fees_error) = match MintPriceBreakdown::from_price(config.price_lamports) {
        Ok(fees) => (Some(fees), None),
        Err(e) => {
            warn!(price = config.price_lamports, error = %e, "cannot split mint price into fees");
            (None, Some(e.to_string()))
        }
    };
    CollectionOut {
        address,
        price_los: config.price_los(),
        remaining_supply: config.remaining_supply(),
        reveal_ready: config.reveal_ready(),
        mint_blocked: config.can_mint().err().map(|b| b.to_string()),
        fees,
        fees_error,
        explorer,
        record,
        config,
    }
}

async fn load_record(config: &ClientConfig, address: &Address) -> Option<CollectionRecord> {
    let store = FallbackStore::from_config(&config.store, config.request_timeout()).ok()?;
    if store.is_empty() {
        return None;
    }
    match store.load(&address.to_string()).await {
        Ok(record) => record,
        Err(e) => {
            warn!(error = %e, "metadata store lookup failed");
            None
        }
    }
}
