//! Rarity tiers and mint-fee splits as the launchpad program computes them.

use std::fmt;

use serde::Serialize;

use crate::error::LaunchpadError;

/// Score range is `0..=MAX_RARITY_SCORE`; lower is rarer.
pub const MAX_RARITY_SCORE: u8 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RarityTier {
    Legendary,
    Epic,
    Rare,
    Common,
}

impl RarityTier {
    pub const ALL: [RarityTier; 4] = [
        RarityTier::Legendary,
        RarityTier::Epic,
        RarityTier::Rare,
        RarityTier::Common,
    ];

    pub fn from_score(score: u8) -> Result<Self, LaunchpadError> {
        match score {
            0..=4 => Ok(RarityTier::Legendary),
            5..=19 => Ok(RarityTier::Epic),
            20..=49 => Ok(RarityTier::Rare),
            50..=99 => Ok(RarityTier::Common),
            _ => Err(LaunchpadError::AmountOutOfRange(format!(
                "rarity score {score} exceeds {MAX_RARITY_SCORE}"
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RarityTier::Legendary => "Legendary",
            RarityTier::Epic => "Epic",
            RarityTier::Rare => "Rare",
            RarityTier::Common => "Common",
        }
    }

    pub fn chance(self) -> &'static str {
        match self {
            RarityTier::Legendary => "5%",
            RarityTier::Epic => "15%",
            RarityTier::Rare => "30%",
            RarityTier::Common => "50%",
        }
    }

    /// Hex display colour used by the launchpad front end.
    pub fn color(self) -> &'static str {
        match self {
            RarityTier::Legendary => "#FFD700",
            RarityTier::Epic => "#9932CC",
            RarityTier::Rare => "#1E90FF",
            RarityTier::Common => "#C0C0C0",
        }
    }

    pub fn score_range(self) -> std::ops::RangeInclusive<u8> {
        match self {
            RarityTier::Legendary => 0..=4,
            RarityTier::Epic => 5..=19,
            RarityTier::Rare => 20..=49,
            RarityTier::Common => 50..=99,
        }
    }
}

impl fmt::Display for RarityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `"Epic (12/99)"`.
pub fn format_rarity(score: u8) -> Result<String, LaunchpadError> {
    let tier = RarityTier::from_score(score)?;
    Ok(format!("{tier} ({score}/{MAX_RARITY_SCORE})"))
}

// ---------------------------------------------------------------------------
// Fees
// ---------------------------------------------------------------------------

pub const PLATFORM_FEE_BPS: u64 = 250;
pub const BUYBACK_FEE_BPS: u64 = 150;
pub const DEV_FEE_BPS: u64 = 100;
pub const TOTAL_FEE_BPS: u64 = 500;
pub const ROYALTY_BPS: u16 = 500;
const BPS_DENOMINATOR: u64 = 10_000;

/// How one mint payment is split.
///
/// The creator receives the price minus `total_fee`, but each fee transfer is
/// rounded down on its own, so the three transfers can add up to less than
/// `total_fee`. That rounding dust is never transferred and stays with the
/// payer; see [`MintPriceBreakdown::payer_total`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MintPriceBreakdown {
    pub price_lamports: u64,
    pub platform_fee: u64,
    pub buyback_fee: u64,
    pub dev_fee: u64,
    pub total_fee: u64,
    pub creator_payment: u64,
}

impl MintPriceBreakdown {
    pub fn from_price(price_lamports: u64) -> Result<Self, LaunchpadError> {
        let fee = |bps: u64| {
            price_lamports
                .checked_mul(bps)
                .map(|v| v / BPS_DENOMINATOR)
                .ok_or_else(|| {
                    LaunchpadError::AmountOutOfRange(format!(
                        "price {price_lamports} overflows the fee calculation"
                    ))
                })
        };
        let total_fee = fee(TOTAL_FEE_BPS)?;
        Ok(Self {
            price_lamports,
            platform_fee: fee(PLATFORM_FEE_BPS)?,
            buyback_fee: fee(BUYBACK_FEE_BPS)?,
            dev_fee: fee(DEV_FEE_BPS)?,
            total_fee,
            creator_payment: price_lamports - total_fee,
        })
    }

    /// Lamports that actually leave the payer: the creator payment plus the
    /// three individually rounded fees. At most `price_lamports`.
    pub fn payer_total(&self) -> u64 {
        self.creator_payment + self.platform_fee + self.buyback_fee + self.dev_fee
    }
}
