use std::path::PathBuf;

use chain_analos::{Address, Signature};
use clap::{Parser, Subcommand};
use launchpad_core::Network;

#[derive(Parser, Debug, Clone)]
#[command(name = "analos-launchpad", version, about = "Analos NFT launchpad client")]
pub struct Cli {
    /// Emit JSON output on stdout.
    #[arg(long, global = true)]
    pub json: bool,

    /// JSON config file; environment and flags override it.
    #[arg(long, global = true, env = "ANALOS_CONFIG")]
    pub config: Option<PathBuf>,

    /// RPC endpoint override.
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,

    /// mainnet|devnet|testnet|localnet
    #[arg(long, global = true)]
    pub network: Option<Network>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Derive a program address and print it with its bump.
    Derive {
        #[command(subcommand)]
        target: DeriveTarget,
    },

    /// Encode instruction data and print it as hex.
    Encode {
        /// launchpad|price-oracle|rarity-oracle
        program: String,
        /// Instruction name, e.g. initialize_collection.
        instruction: String,
        /// Arguments in declaration order.
        args: Vec<String>,
    },

    /// Identify and decode hex instruction data.
    Inspect { data: String },

    /// Create a collection. A fresh collection mint co-signs.
    InitCollection {
        #[arg(long)]
        keypair: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        max_supply: u64,
        /// Mint price in LOS.
        #[arg(long)]
        price: f64,
        #[arg(long)]
        reveal_threshold: u64,
        #[arg(long)]
        placeholder_uri: String,
    },

    /// Create the LOS price oracle.
    InitPriceOracle {
        #[arg(long)]
        keypair: PathBuf,
        /// Initial LOS market cap in USD.
        #[arg(long)]
        market_cap_usd: f64,
    },

    /// Create the rarity config for a collection.
    InitRarityConfig {
        #[arg(long)]
        keypair: PathBuf,
        /// Collection authority (default: the keypair).
        #[arg(long)]
        authority: Option<Address>,
    },

    /// Fetch and decode a collection's on-chain config.
    Collection {
        #[arg(long)]
        authority: Address,
    },

    /// Look up a transaction signature.
    Status { signature: Signature },

    /// Check the RPC endpoint and report the transport mode.
    Probe,

    /// Write a fresh keypair file.
    Keygen {
        #[arg(long)]
        out: PathBuf,
        /// Seal with a password from ANALOS_KEYSTORE_PASSWORD.
        #[arg(long)]
        encrypt: bool,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum DeriveTarget {
    /// ["collection", authority]
    Collection { authority: Address },
    /// ["mint", collection_config, index]
    Mint {
        collection_config: Address,
        index: u64,
    },
    /// ["price_oracle"]
    PriceOracle,
    /// ["rarity_config", collection_config]
    RarityConfig { collection_config: Address },
    /// ["rarity_tier", rarity_config, tier_id]
    RarityTier { rarity_config: Address, tier_id: u8 },
    /// Arbitrary seeds: `str:text`, `pubkey:<base58>`, `u64:n`, `u8:n`,
    /// `hex:..`; bare values are UTF-8.
    Raw {
        /// Program name or base58 program id.
        #[arg(long)]
        program: String,
        seeds: Vec<String>,
    },
}
