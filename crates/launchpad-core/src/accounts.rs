//! Decoders for program-owned account data.
//!
//! Anchor accounts start with `SHA-256("account:" + TypeName)[..8]` and
//! then lay out fields in declaration order. Strings are allocated at
//! their maximum length, so trailing zero padding after the last field is
//! expected and ignored.

use chain_analos::{Address, ByteReader, ChainError};
use serde::Serialize;

use crate::error::LaunchpadError;
use crate::types::{lamports_to_los, LAMPORTS_PER_LOS};

pub const COLLECTION_CONFIG_DISCRIMINATOR: [u8; 8] = [0xdf, 0x6e, 0x98, 0xa0, 0xae, 0x9d, 0x6a, 0xff];
pub const MINT_RECORD_DISCRIMINATOR: [u8; 8] = [0x2f, 0xfc, 0x8e, 0x7e, 0xf1, 0xa2, 0x74, 0xbc];
pub const PRICE_ORACLE_DISCRIMINATOR: [u8; 8] = [0x39, 0x8c, 0x78, 0xb0, 0xbf, 0x41, 0x34, 0x59];
pub const RARITY_CONFIG_DISCRIMINATOR: [u8; 8] = [0x6b, 0x7c, 0x20, 0x61, 0x9f, 0x90, 0x7b, 0xc4];

impl From<ChainError> for AccountDecodeError {
    fn from(e: ChainError) -> Self {
        AccountDecodeError(e.to_string())
    }
}

/// Internal carrier so field reads can use `?` before mapping to
/// `LaunchpadError::AccountData` with the account name attached.
struct AccountDecodeError(String);

fn open<'a>(
    data: &'a [u8],
    expected: [u8; 8],
    account: &str,
) -> Result<ByteReader<'a>, LaunchpadError> {
    let mut reader = ByteReader::new(data);
    let disc = reader
        .take(8)
        .map_err(|_| LaunchpadError::AccountData(format!("{account}: account data too short")))?;
    if disc != expected {
        return Err(LaunchpadError::AccountData(format!(
            "{account}: discriminator {} does not match {}",
            hex::encode(disc),
            hex::encode(expected)
        )));
    }
    Ok(reader)
}

fn decode_with<T>(
    data: &[u8],
    expected: [u8; 8],
    account: &str,
    read: impl FnOnce(&mut ByteReader<'_>) -> Result<T, AccountDecodeError>,
) -> Result<T, LaunchpadError> {
    let mut reader = open(data, expected, account)?;
    read(&mut reader).map_err(|AccountDecodeError(msg)| {
        LaunchpadError::AccountData(format!("{account}: {msg}"))
    })
}

// ---------------------------------------------------------------------------
// Launchpad
// ---------------------------------------------------------------------------

/// On-chain state of one NFT collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionConfig {
    pub authority: Address,
    pub max_supply: u64,
    pub current_supply: u64,
    pub price_lamports: u64,
    pub reveal_threshold: u64,
    pub is_revealed: bool,
    pub is_paused: bool,
    #[serde(serialize_with = "hex_32")]
    pub global_seed: [u8; 32],
    pub collection_mint: Address,
    pub collection_name: String,
    pub collection_symbol: String,
    pub placeholder_uri: String,
}

fn hex_32<S: serde::Serializer>(bytes: &[u8; 32], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(bytes))
}

/// Why a mint would be refused by the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MintBlocked {
    Paused,
    SoldOut,
}

impl std::fmt::Display for MintBlocked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MintBlocked::Paused => f.write_str("Collection minting is paused"),
            MintBlocked::SoldOut => f.write_str("Collection is sold out"),
        }
    }
}

impl CollectionConfig {
    pub fn decode(data: &[u8]) -> Result<Self, LaunchpadError> {
        decode_with(data, COLLECTION_CONFIG_DISCRIMINATOR, "CollectionConfig", |r| {
            Ok(Self {
                authority: r.pubkey()?,
                max_supply: r.u64()?,
                current_supply: r.u64()?,
                price_lamports: r.u64()?,
                reveal_threshold: r.u64()?,
                is_revealed: r.bool()?,
                is_paused: r.bool()?,
                global_seed: r.bytes32()?,
                collection_mint: r.pubkey()?,
                collection_name: r.string()?,
                collection_symbol: r.string()?,
                placeholder_uri: r.string()?,
            })
        })
    }

    /// Client-side mirror of the program's mint preconditions.
    pub fn can_mint(&self) -> Result<(), MintBlocked> {
        if self.is_paused {
            return Err(MintBlocked::Paused);
        }
        if self.current_supply >= self.max_supply {
            return Err(MintBlocked::SoldOut);
        }
        Ok(())
    }

    /// The program assigns mint indices sequentially from the current supply.
    pub fn next_mint_index(&self) -> u64 {
        self.current_supply
    }

    pub fn remaining_supply(&self) -> u64 {
        self.max_supply.saturating_sub(self.current_supply)
    }

    pub fn reveal_ready(&self) -> bool {
        !self.is_revealed && self.current_supply >= self.reveal_threshold
    }

    pub fn price_los(&self) -> f64 {
        lamports_to_los(self.price_lamports)
    }
}

/// A minted placeholder, keyed by `["mint", collection_config, index]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MintRecord {
    pub collection_config: Address,
    pub mint_index: u64,
    pub mint_address: Address,
    pub owner: Address,
    pub is_revealed: bool,
}

impl MintRecord {
    pub fn decode(data: &[u8]) -> Result<Self, LaunchpadError> {
        decode_with(data, MINT_RECORD_DISCRIMINATOR, "MintRecord", |r| {
            Ok(Self {
                collection_config: r.pubkey()?,
                mint_index: r.u64()?,
                mint_address: r.pubkey()?,
                owner: r.pubkey()?,
                is_revealed: r.bool()?,
            })
        })
    }
}

// ---------------------------------------------------------------------------
// Price oracle
// ---------------------------------------------------------------------------

/// Oracle state. USD values carry 6 decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceOracle {
    pub authority: Address,
    pub los_market_cap_usd: u64,
    pub los_price_usd: u64,
    pub last_update: i64,
    pub update_count: u64,
    pub is_active: bool,
}

impl PriceOracle {
    pub fn decode(data: &[u8]) -> Result<Self, LaunchpadError> {
        decode_with(data, PRICE_ORACLE_DISCRIMINATOR, "PriceOracle", |r| {
            Ok(Self {
                authority: r.pubkey()?,
                los_market_cap_usd: r.u64()?,
                los_price_usd: r.u64()?,
                last_update: r.i64()?,
                update_count: r.u64()?,
                is_active: r.bool()?,
            })
        })
    }

    /// Lamports of LOS worth `usd_micro` micro-USD at the oracle price,
    /// using the program's integer arithmetic. `None` when the oracle has no
    /// price yet or the product overflows.
    pub fn los_lamports_for_usd(&self, usd_micro: u64) -> Option<u64> {
        if self.los_price_usd == 0 {
            return None;
        }
        usd_micro
            .checked_mul(LAMPORTS_PER_LOS)
            .map(|v| v / self.los_price_usd)
    }
}

// ---------------------------------------------------------------------------
// Rarity oracle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RarityConfig {
    pub collection_config: Address,
    pub authority: Address,
    pub oracle_authority: Address,
    pub total_revealed: u64,
    pub is_active: bool,
    pub use_metadata_based: bool,
    pub use_randomness: bool,
    pub created_at: i64,
}

impl RarityConfig {
    pub fn decode(data: &[u8]) -> Result<Self, LaunchpadError> {
        decode_with(data, RARITY_CONFIG_DISCRIMINATOR, "RarityConfig", |r| {
            Ok(Self {
                collection_config: r.pubkey()?,
                authority: r.pubkey()?,
                oracle_authority: r.pubkey()?,
                total_revealed: r.u64()?,
                is_active: r.bool()?,
                use_metadata_based: r.bool()?,
                use_randomness: r.bool()?,
                created_at: r.i64()?,
            })
        })
    }
}
