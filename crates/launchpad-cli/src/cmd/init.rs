use std::fmt;
use std::path::Path;

use anyhow::Result;
use chain_analos::{Address, Instruction, SigningKey};
use launchpad_client::{
    ClientConfig, CollectionRecord, Connection, FallbackStore, KeypairWallet, Outcome, Submitter,
};
use launchpad_core::{
    lamports_to_los, los_to_lamports, usd_to_micro_usd, CollectionParams, LaunchpadProgram,
    MintPriceBreakdown, PriceOracleProgram, RarityOracleProgram,
};
use serde::Serialize;
use tracing::{info, warn};

use super::load_wallet;
use crate::output;

#[derive(Debug, Clone)]
pub struct CollectionArgs {
    pub name: String,
    pub symbol: String,
    pub max_supply: u64,
    pub price_los: f64,
    pub reveal_threshold: u64,
    pub placeholder_uri: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitOut {
    pub action: &'static str,
    pub outcome: Outcome,
    pub explorer: String,
    /// Accounts created or targeted, by role.
    pub accounts: Vec<(&'static str, Address)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fees: Option<MintPriceBreakdown>,
}

impl fmt::Display for SubmitOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = match &self.outcome {
            Outcome::Confirmed { slot, .. } => format!("confirmed in slot {slot}"),
            Outcome::TimedOut { .. } => {
                "not confirmed before the deadline; it may still land, check the explorer".into()
            }
            Outcome::RejectedOnChain { error, .. } => format!("rejected: {error}"),
        };
        writeln!(f, "{}: {verdict}", self.action)?;
        writeln!(f, "  signature: {}", self.outcome.signature())?;
        for (role, address) in &self.accounts {
            writeln!(f, "  {role}: {address}")?;
        }
        if let Some(fees) = &self.fees {
            writeln!(
                f,
                "  per mint: {} LOS, creator receives {} LOS after {} LOS fees",
                lamports_to_los(fees.price_lamports),
                lamports_to_los(fees.creator_payment),
                lamports_to_los(fees.total_fee)
            )?;
        }
        write!(f, "  {}", self.explorer)
    }
}

async fn submit(
    config: &ClientConfig,
    wallet: &KeypairWallet,
    instructions: &[Instruction],
    co_signers: &[&SigningKey],
) -> Result<(Connection, Outcome)> {
    let conn = Connection::connect(config).await?;
    let outcome = Submitter::new(&conn, config)
        .submit_with_signers(instructions, wallet, co_signers)
        .await?;
    Ok((conn, outcome))
}

pub async fn collection(config: &ClientConfig, keypair: &Path, args: CollectionArgs) -> Result<()> {
    let wallet = load_wallet(keypair)?;
    let authority = wallet.address();
    let params = CollectionParams {
        max_supply: args.max_supply,
        price_lamports: los_to_lamports(args.price_los)?,
        reveal_threshold: args.reveal_threshold,
        name: args.name,
        symbol: args.symbol,
        placeholder_uri: args.placeholder_uri,
    };
    let fees = MintPriceBreakdown::from_price(params.price_lamports)?;

    let program = LaunchpadProgram::from_ids(&config.programs);
    let collection_mint = KeypairWallet::generate();
    let ix = program.initialize_collection(&authority, &collection_mint.address(), &params)?;
    let collection_config = program.collection_config(&authority)?.address;

    let (conn, outcome) =
        submit(config, &wallet, &[ix], &[collection_mint.signing_key()]).await?;

    if outcome.is_confirmed() {
        let mut record = CollectionRecord::new(
            conn.network(),
            &program,
            authority,
            Some(collection_mint.address()),
            &params,
        )?;
        record.signature = Some(*outcome.signature());
        save_record(config, &record).await;
    }

    output::print(&SubmitOut {
        action: "initialize_collection",
        explorer: outcome.explorer_url(conn.network()),
        outcome,
        accounts: vec![
            ("collection config", collection_config),
            ("collection mint", collection_mint.address()),
            ("authority", authority),
        ],
        fees: Some(fees),
    })
}

/// A store failure never fails the command; the collection already exists.
async fn save_record(config: &ClientConfig, record: &CollectionRecord) {
    let store = match FallbackStore::from_config(&config.store, config.request_timeout()) {
        Ok(store) if !store.is_empty() => store,
        Ok(_) => return,
        Err(e) => {
            warn!(error = %e, "metadata store unavailable");
            return;
        }
    };
    match store.save(record).await {
        Ok(report) => info!(key = %record.key(), backends = report.succeeded(), "collection recorded"),
        Err(e) => warn!(key = %record.key(), error = %e, "collection not recorded"),
    }
}

pub async fn price_oracle(config: &ClientConfig, keypair: &Path, market_cap_usd: f64) -> Result<()> {
    let wallet = load_wallet(keypair)?;
    let program = PriceOracleProgram::from_ids(&config.programs);
    let ix = program.initialize_oracle(&wallet.address(), usd_to_micro_usd(market_cap_usd)?)?;
    let oracle = program.price_oracle()?.address;

    let (conn, outcome) = submit(config, &wallet, &[ix], &[]).await?;
    output::print(&SubmitOut {
        action: "initialize_oracle",
        explorer: outcome.explorer_url(conn.network()),
        outcome,
        accounts: vec![("price oracle", oracle), ("authority", wallet.address())],
        fees: None,
    })
}

pub async fn rarity_config(
    config: &ClientConfig,
    keypair: &Path,
    collection_authority: Option<Address>,
) -> Result<()> {
    let wallet = load_wallet(keypair)?;
    let collection_authority = collection_authority.unwrap_or_else(|| wallet.address());
    let collection_config = LaunchpadProgram::from_ids(&config.programs)
        .collection_config(&collection_authority)?
        .address;

    let program = RarityOracleProgram::from_ids(&config.programs);
    let ix = program.initialize_rarity_config(&wallet.address(), &collection_config)?;
    let rarity_config = program.rarity_config(&collection_config)?.address;

    let (conn, outcome) = submit(config, &wallet, &[ix], &[]).await?;
    output::print(&SubmitOut {
        action: "initialize_rarity_config",
        explorer: outcome.explorer_url(conn.network()),
        outcome,
        accounts: vec![
            ("rarity config", rarity_config),
            ("collection config", collection_config),
            ("authority", wallet.address()),
        ],
        fees: None,
    })
}
