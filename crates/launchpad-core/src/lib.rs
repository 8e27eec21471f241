//! Analos launchpad program interfaces.
//!
//! Pure, synchronous building blocks shared by the async client and the
//! CLI: network and program-id tables, one interface table per on-chain
//! program, typed instruction builders, account decoders, rarity tiers and
//! mint fee splits. Nothing here touches the network.

pub mod accounts;
pub mod error;
pub mod programs;
pub mod rarity;
pub mod types;

pub use accounts::{CollectionConfig, MintBlocked, MintRecord, PriceOracle, RarityConfig};
pub use error::LaunchpadError;
pub use programs::{
    identify, CollectionParams, LaunchpadErrorCode, LaunchpadProgram, PriceOracleProgram,
    ProgramInterface, RarityOracleProgram, RarityTierParams, INTERFACES, LAUNCHPAD_INTERFACE,
    PRICE_ORACLE_INTERFACE, RARITY_ORACLE_INTERFACE,
};
pub use rarity::{format_rarity, MintPriceBreakdown, RarityTier};
pub use types::{
    derive_ws_url, lamports_to_los, los_to_lamports, usd_to_micro_usd, Network, ProgramIds,
    LAMPORTS_PER_LOS, LAUNCHPAD_PROGRAM_ID, PRICE_ORACLE_PROGRAM_ID, RARITY_ORACLE_PROGRAM_ID,
};
