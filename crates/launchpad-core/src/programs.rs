//! Interface tables and typed instruction builders for the three on-chain
//! programs.
//!
//! Each program has exactly one table mapping instruction name to
//! discriminator and argument list. Builders encode through that table and
//! attach accounts in the order the program's `Accounts` structs declare
//! them, so no call site ever carries its own discriminator bytes.

use chain_analos::instruction::{self, Arg, Field, FieldType, Instruction, InstructionSchema};
use chain_analos::{
    anchor_discriminator, derive_associated_token_address, find_program_address, AccountMeta,
    Address, DerivedAddress, ASSOCIATED_TOKEN_PROGRAM_ID, SYSTEM_PROGRAM_ID, SYSVAR_RENT_ID,
    TOKEN_PROGRAM_ID,
};
use serde::Serialize;

use crate::error::LaunchpadError;
use crate::types::ProgramIds;

/// PDA seed prefixes used by the deployed programs.
pub mod seeds {
    pub const COLLECTION: &[u8] = b"collection";
    pub const MINT: &[u8] = b"mint";
    pub const PRICE_ORACLE: &[u8] = b"price_oracle";
    pub const RARITY_CONFIG: &[u8] = b"rarity_config";
    pub const RARITY_TIER: &[u8] = b"rarity_tier";
    pub const RARITY_DETERMINATION: &[u8] = b"rarity_determination";
    pub const METADATA: &[u8] = b"metadata";
}

/// Token Metadata program: `metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s`
pub const METADATA_PROGRAM_ID: Address = Address::new([
    0x0b, 0x70, 0x65, 0xb1, 0xe3, 0xd1, 0x7c, 0x45, 0x38, 0x9d, 0x52, 0x7f, 0x6b, 0x04, 0xc3, 0xcd,
    0x58, 0xb8, 0x6c, 0x73, 0x1a, 0xa0, 0xfd, 0xb5, 0x49, 0xb6, 0xd1, 0xbc, 0x03, 0xf8, 0x29, 0x46,
]);

// ---------------------------------------------------------------------------
// Interface tables
// ---------------------------------------------------------------------------

pub const INITIALIZE_COLLECTION: InstructionSchema = InstructionSchema {
    name: "initialize_collection",
    discriminator: [0x70, 0x3e, 0x35, 0x8b, 0xad, 0x98, 0x62, 0x5d],
    fields: &[
        Field::new("max_supply", FieldType::U64),
        Field::new("price_lamports", FieldType::U64),
        Field::new("reveal_threshold", FieldType::U64),
        Field::new("collection_name", FieldType::Str),
        Field::new("collection_symbol", FieldType::Str),
        Field::new("placeholder_uri", FieldType::Str),
    ],
};

pub const MINT_PLACEHOLDER: InstructionSchema = InstructionSchema {
    name: "mint_placeholder",
    discriminator: [0x1e, 0x87, 0xb5, 0x3f, 0xb0, 0x98, 0xe8, 0xd4],
    fields: &[],
};

pub const REVEAL_COLLECTION: InstructionSchema = InstructionSchema {
    name: "reveal_collection",
    discriminator: [0xb5, 0xfc, 0x87, 0x73, 0xd8, 0x64, 0x3c, 0xc8],
    fields: &[Field::new("revealed_base_uri", FieldType::Str)],
};

pub const WITHDRAW_FUNDS: InstructionSchema = InstructionSchema {
    name: "withdraw_funds",
    discriminator: [0xf1, 0x24, 0x1d, 0x6f, 0xd0, 0x1f, 0x68, 0xd9],
    fields: &[Field::new("amount", FieldType::U64)],
};

pub const SET_PAUSE: InstructionSchema = InstructionSchema {
    name: "set_pause",
    discriminator: [0x3f, 0x20, 0x9a, 0x02, 0x38, 0x67, 0x4f, 0x2d],
    fields: &[Field::new("paused", FieldType::Bool)],
};

pub const UPDATE_CONFIG: InstructionSchema = InstructionSchema {
    name: "update_config",
    discriminator: [0x1d, 0x9e, 0xfc, 0xbf, 0x0a, 0x53, 0xdb, 0x63],
    fields: &[
        Field::new("new_price", FieldType::OptionU64),
        Field::new("new_reveal_threshold", FieldType::OptionU64),
    ],
};

pub const INITIALIZE_ORACLE: InstructionSchema = InstructionSchema {
    name: "initialize_oracle",
    discriminator: [0x90, 0xdf, 0x83, 0x78, 0xc4, 0xfd, 0xb5, 0x63],
    fields: &[Field::new("initial_los_market_cap_usd", FieldType::U64)],
};

pub const UPDATE_LOS_MARKET_CAP: InstructionSchema = InstructionSchema {
    name: "update_los_market_cap",
    discriminator: [0xc0, 0x91, 0x89, 0x03, 0xae, 0x87, 0x9d, 0xb3],
    fields: &[
        Field::new("new_market_cap_usd", FieldType::U64),
        Field::new("los_circulating_supply", FieldType::U64),
    ],
};

pub const PAUSE_ORACLE: InstructionSchema = InstructionSchema {
    name: "pause_oracle",
    discriminator: [0xaa, 0x74, 0x03, 0x79, 0xf7, 0x6d, 0x93, 0xbf],
    fields: &[Field::new("reason", FieldType::Str)],
};

pub const RESUME_ORACLE: InstructionSchema = InstructionSchema {
    name: "resume_oracle",
    discriminator: [0xd2, 0x7e, 0x35, 0xd8, 0x85, 0xe1, 0xca, 0x04],
    fields: &[],
};

pub const INITIALIZE_RARITY_CONFIG: InstructionSchema = InstructionSchema {
    name: "initialize_rarity_config",
    discriminator: [0x22, 0xc7, 0x05, 0xb3, 0xb3, 0xf9, 0xe3, 0xff],
    fields: &[],
};

pub const ADD_RARITY_TIER: InstructionSchema = InstructionSchema {
    name: "add_rarity_tier",
    discriminator: [0xec, 0xc7, 0x49, 0x40, 0x90, 0xae, 0x6f, 0x52],
    fields: &[
        Field::new("tier_id", FieldType::U8),
        Field::new("tier_name", FieldType::Str),
        Field::new("token_multiplier", FieldType::U64),
        Field::new("probability_bps", FieldType::U16),
        Field::new("metadata_attributes", FieldType::StrList),
    ],
};

pub const DETERMINE_RARITY: InstructionSchema = InstructionSchema {
    name: "determine_rarity",
    discriminator: [0x8d, 0x11, 0x5d, 0x3a, 0x96, 0x90, 0x98, 0x4a],
    fields: &[
        Field::new("nft_mint", FieldType::Pubkey),
        Field::new("mint_index", FieldType::U64),
    ],
};

/// The instruction set of one deployed program.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProgramInterface {
    pub name: &'static str,
    pub instructions: &'static [InstructionSchema],
}

pub const LAUNCHPAD_INTERFACE: ProgramInterface = ProgramInterface {
    name: "launchpad",
    instructions: &[
        INITIALIZE_COLLECTION,
        MINT_PLACEHOLDER,
        REVEAL_COLLECTION,
        WITHDRAW_FUNDS,
        SET_PAUSE,
        UPDATE_CONFIG,
    ],
};

pub const PRICE_ORACLE_INTERFACE: ProgramInterface = ProgramInterface {
    name: "price-oracle",
    instructions: &[INITIALIZE_ORACLE, UPDATE_LOS_MARKET_CAP, PAUSE_ORACLE, RESUME_ORACLE],
};

pub const RARITY_ORACLE_INTERFACE: ProgramInterface = ProgramInterface {
    name: "rarity-oracle",
    instructions: &[INITIALIZE_RARITY_CONFIG, ADD_RARITY_TIER, DETERMINE_RARITY],
};

pub static INTERFACES: [ProgramInterface; 3] =
    [LAUNCHPAD_INTERFACE, PRICE_ORACLE_INTERFACE, RARITY_ORACLE_INTERFACE];

impl ProgramInterface {
    /// Look up an interface by its short name (`launchpad`, `price-oracle`,
    /// `rarity-oracle`).
    pub fn by_name(name: &str) -> Result<&'static ProgramInterface, LaunchpadError> {
        INTERFACES
            .iter()
            .find(|i| i.name == name)
            .ok_or_else(|| LaunchpadError::UnknownProgram(name.to_string()))
    }

    pub fn find(&self, instruction: &str) -> Result<&'static InstructionSchema, LaunchpadError> {
        self.instructions
            .iter()
            .find(|s| s.name == instruction)
            .ok_or_else(|| LaunchpadError::UnknownInstruction {
                program: self.name,
                instruction: instruction.to_string(),
            })
    }

    /// The schema whose discriminator prefixes `data`, if any.
    pub fn identify(&self, data: &[u8]) -> Option<&'static InstructionSchema> {
        let prefix = data.get(..8)?;
        self.instructions.iter().find(|s| s.discriminator == prefix)
    }

    /// Check every table entry against the Anchor derivation.
    pub fn verify(&self) -> Result<(), LaunchpadError> {
        for schema in self.instructions {
            let derived = anchor_discriminator(schema.name);
            if derived != schema.discriminator {
                return Err(LaunchpadError::DiscriminatorMismatch {
                    instruction: schema.name,
                    table: hex::encode(schema.discriminator),
                    derived: hex::encode(derived),
                });
            }
        }
        Ok(())
    }
}

/// Identify instruction data against every known program.
pub fn identify(data: &[u8]) -> Option<(&'static ProgramInterface, &'static InstructionSchema)> {
    INTERFACES
        .iter()
        .find_map(|iface| iface.identify(data).map(|schema| (iface, schema)))
}

fn encode(schema: &InstructionSchema, args: &[Arg]) -> Result<Vec<u8>, LaunchpadError> {
    Ok(instruction::encode(schema, args)?)
}

fn check_len(what: &str, value: &str, max: usize) -> Result<(), LaunchpadError> {
    if value.len() > max {
        return Err(LaunchpadError::InvalidArgument(format!(
            "{what} is {} bytes, limit is {max}",
            value.len()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// NFT launchpad
// ---------------------------------------------------------------------------

pub const MAX_NAME_LEN: usize = 32;
pub const MAX_SYMBOL_LEN: usize = 10;
pub const MAX_URI_LEN: usize = 200;

/// Arguments of `initialize_collection`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionParams {
    pub max_supply: u64,
    pub price_lamports: u64,
    pub reveal_threshold: u64,
    pub name: String,
    pub symbol: String,
    pub placeholder_uri: String,
}

impl CollectionParams {
    pub fn validate(&self) -> Result<(), LaunchpadError> {
        if self.max_supply == 0 {
            return Err(LaunchpadError::InvalidArgument("max_supply must be > 0".into()));
        }
        if self.reveal_threshold > self.max_supply {
            return Err(LaunchpadError::InvalidArgument(format!(
                "reveal_threshold {} exceeds max_supply {}",
                self.reveal_threshold, self.max_supply
            )));
        }
        check_len("collection name", &self.name, MAX_NAME_LEN)?;
        check_len("collection symbol", &self.symbol, MAX_SYMBOL_LEN)?;
        check_len("placeholder uri", &self.placeholder_uri, MAX_URI_LEN)?;
        Ok(())
    }

    pub fn to_args(&self) -> Vec<Arg> {
        vec![
            Arg::U64(self.max_supply),
            Arg::U64(self.price_lamports),
            Arg::U64(self.reveal_threshold),
            Arg::Str(self.name.clone()),
            Arg::Str(self.symbol.clone()),
            Arg::Str(self.placeholder_uri.clone()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchpadProgram {
    pub program_id: Address,
}

impl LaunchpadProgram {
    pub fn new(program_id: Address) -> Self {
        Self { program_id }
    }

    pub fn from_ids(ids: &ProgramIds) -> Self {
        Self::new(ids.launchpad)
    }

    /// Collection config PDA: `["collection", authority]`.
    pub fn collection_config(&self, authority: &Address) -> Result<DerivedAddress, LaunchpadError> {
        Ok(find_program_address(
            &[seeds::COLLECTION, authority.as_ref()],
            &self.program_id,
        )?)
    }

    /// Mint record PDA: `["mint", collection_config, mint_index as u64 LE]`.
    pub fn mint_record(
        &self,
        collection_config: &Address,
        mint_index: u64,
    ) -> Result<DerivedAddress, LaunchpadError> {
        Ok(find_program_address(
            &[seeds::MINT, collection_config.as_ref(), &mint_index.to_le_bytes()],
            &self.program_id,
        )?)
    }

    /// `initialize_collection`. `collection_mint` is a fresh keypair that
    /// must co-sign the transaction.
    pub fn initialize_collection(
        &self,
        authority: &Address,
        collection_mint: &Address,
        params: &CollectionParams,
    ) -> Result<Instruction, LaunchpadError> {
        params.validate()?;
        let config = self.collection_config(authority)?;
        let data = encode(&INITIALIZE_COLLECTION, &params.to_args())?;
        Ok(Instruction::new(
            self.program_id,
            vec![
                AccountMeta::writable(config.address),
                AccountMeta::writable_signer(*collection_mint),
                AccountMeta::writable_signer(*authority),
                AccountMeta::readonly(SYSTEM_PROGRAM_ID),
                AccountMeta::readonly(TOKEN_PROGRAM_ID),
                AccountMeta::readonly(SYSVAR_RENT_ID),
            ],
            data,
        ))
    }

    /// `mint_placeholder`. `nft_mint` is a fresh keypair that must co-sign;
    /// the token account and metadata account are derived from it.
    pub fn mint_placeholder(
        &self,
        collection_authority: &Address,
        nft_mint: &Address,
        payer: &Address,
    ) -> Result<Instruction, LaunchpadError> {
        let config = self.collection_config(collection_authority)?;
        let token_account = derive_associated_token_address(payer, nft_mint)?;
        let metadata = find_program_address(
            &[seeds::METADATA, METADATA_PROGRAM_ID.as_ref(), nft_mint.as_ref()],
            &METADATA_PROGRAM_ID,
        )?;
        let data = encode(&MINT_PLACEHOLDER, &[])?;
        Ok(Instruction::new(
            self.program_id,
            vec![
                AccountMeta::writable(config.address),
                AccountMeta::writable_signer(*nft_mint),
                AccountMeta::writable(token_account),
                AccountMeta::writable(metadata.address),
                AccountMeta::writable_signer(*payer),
                AccountMeta::readonly(METADATA_PROGRAM_ID),
                AccountMeta::readonly(TOKEN_PROGRAM_ID),
                AccountMeta::readonly(ASSOCIATED_TOKEN_PROGRAM_ID),
                AccountMeta::readonly(SYSTEM_PROGRAM_ID),
                AccountMeta::readonly(SYSVAR_RENT_ID),
            ],
            data,
        ))
    }

    pub fn reveal_collection(
        &self,
        authority: &Address,
        revealed_base_uri: &str,
    ) -> Result<Instruction, LaunchpadError> {
        check_len("revealed base uri", revealed_base_uri, MAX_URI_LEN)?;
        let data = encode(&REVEAL_COLLECTION, &[Arg::Str(revealed_base_uri.to_string())])?;
        self.authority_instruction(authority, true, data)
    }

    pub fn withdraw_funds(&self, authority: &Address, amount: u64) -> Result<Instruction, LaunchpadError> {
        if amount == 0 {
            return Err(LaunchpadError::InvalidArgument("withdraw amount must be > 0".into()));
        }
        let data = encode(&WITHDRAW_FUNDS, &[Arg::U64(amount)])?;
        self.authority_instruction(authority, true, data)
    }

    pub fn set_pause(&self, authority: &Address, paused: bool) -> Result<Instruction, LaunchpadError> {
        let data = encode(&SET_PAUSE, &[Arg::Bool(paused)])?;
        self.authority_instruction(authority, false, data)
    }

    pub fn update_config(
        &self,
        authority: &Address,
        new_price: Option<u64>,
        new_reveal_threshold: Option<u64>,
    ) -> Result<Instruction, LaunchpadError> {
        let data = encode(
            &UPDATE_CONFIG,
            &[Arg::OptionU64(new_price), Arg::OptionU64(new_reveal_threshold)],
        )?;
        self.authority_instruction(authority, false, data)
    }

    /// `[collection_config (w), authority (s)]`, the shape shared by the
    /// admin instructions.
    fn authority_instruction(
        &self,
        authority: &Address,
        authority_writable: bool,
        data: Vec<u8>,
    ) -> Result<Instruction, LaunchpadError> {
        let config = self.collection_config(authority)?;
        let authority_meta = if authority_writable {
            AccountMeta::writable_signer(*authority)
        } else {
            AccountMeta::readonly_signer(*authority)
        };
        Ok(Instruction::new(
            self.program_id,
            vec![AccountMeta::writable(config.address), authority_meta],
            data,
        ))
    }
}

/// Custom error codes returned by the launchpad program (Anchor numbers
/// them from 6000).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LaunchpadErrorCode {
    SoldOut,
    CollectionPaused,
    AlreadyRevealed,
    ThresholdNotMet,
    InsufficientFunds,
    InvalidThreshold,
}

impl LaunchpadErrorCode {
    pub fn from_code(code: u32) -> Option<Self> {
        let variant = match code {
            6000 => Self::SoldOut,
            6001 => Self::CollectionPaused,
            6002 => Self::AlreadyRevealed,
            6003 => Self::ThresholdNotMet,
            6004 => Self::InsufficientFunds,
            6005 => Self::InvalidThreshold,
            _ => return None,
        };
        Some(variant)
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::SoldOut => "Collection is sold out",
            Self::CollectionPaused => "Collection minting is paused",
            Self::AlreadyRevealed => "Collection has already been revealed",
            Self::ThresholdNotMet => "Reveal threshold has not been met",
            Self::InsufficientFunds => "Insufficient funds for withdrawal",
            Self::InvalidThreshold => "Invalid threshold value",
        }
    }
}

// ---------------------------------------------------------------------------
// Price oracle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceOracleProgram {
    pub program_id: Address,
}

impl PriceOracleProgram {
    pub fn new(program_id: Address) -> Self {
        Self { program_id }
    }

    pub fn from_ids(ids: &ProgramIds) -> Self {
        Self::new(ids.price_oracle)
    }

    /// The singleton oracle PDA: `["price_oracle"]`.
    pub fn price_oracle(&self) -> Result<DerivedAddress, LaunchpadError> {
        Ok(find_program_address(&[seeds::PRICE_ORACLE], &self.program_id)?)
    }

    /// `initialize_oracle` with the market cap in micro-USD.
    pub fn initialize_oracle(
        &self,
        authority: &Address,
        initial_market_cap_micro_usd: u64,
    ) -> Result<Instruction, LaunchpadError> {
        let oracle = self.price_oracle()?;
        let data = encode(&INITIALIZE_ORACLE, &[Arg::U64(initial_market_cap_micro_usd)])?;
        Ok(Instruction::new(
            self.program_id,
            vec![
                AccountMeta::writable(oracle.address),
                AccountMeta::writable_signer(*authority),
                AccountMeta::readonly(SYSTEM_PROGRAM_ID),
            ],
            data,
        ))
    }

    pub fn update_los_market_cap(
        &self,
        updater: &Address,
        new_market_cap_micro_usd: u64,
        los_circulating_supply: u64,
    ) -> Result<Instruction, LaunchpadError> {
        if los_circulating_supply == 0 {
            return Err(LaunchpadError::InvalidArgument(
                "circulating supply must be > 0".into(),
            ));
        }
        let data = encode(
            &UPDATE_LOS_MARKET_CAP,
            &[Arg::U64(new_market_cap_micro_usd), Arg::U64(los_circulating_supply)],
        )?;
        self.oracle_instruction(updater, data)
    }

    pub fn pause_oracle(&self, authority: &Address, reason: &str) -> Result<Instruction, LaunchpadError> {
        let data = encode(&PAUSE_ORACLE, &[Arg::Str(reason.to_string())])?;
        self.oracle_instruction(authority, data)
    }

    pub fn resume_oracle(&self, authority: &Address) -> Result<Instruction, LaunchpadError> {
        let data = encode(&RESUME_ORACLE, &[])?;
        self.oracle_instruction(authority, data)
    }

    fn oracle_instruction(&self, signer: &Address, data: Vec<u8>) -> Result<Instruction, LaunchpadError> {
        let oracle = self.price_oracle()?;
        Ok(Instruction::new(
            self.program_id,
            vec![
                AccountMeta::writable(oracle.address),
                AccountMeta::readonly_signer(*signer),
            ],
            data,
        ))
    }
}

// ---------------------------------------------------------------------------
// Rarity oracle
// ---------------------------------------------------------------------------

pub const MAX_RARITY_TIERS: u8 = 10;
pub const MAX_METADATA_ATTRIBUTES: usize = 50;

/// Arguments of `add_rarity_tier`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RarityTierParams {
    pub tier_id: u8,
    pub tier_name: String,
    pub token_multiplier: u64,
    pub probability_bps: u16,
    pub metadata_attributes: Vec<String>,
}

impl RarityTierParams {
    /// Mirrors the program's own checks so bad input fails before signing.
    pub fn validate(&self) -> Result<(), LaunchpadError> {
        if self.tier_id >= MAX_RARITY_TIERS {
            return Err(LaunchpadError::InvalidArgument(format!(
                "tier_id {} must be below {MAX_RARITY_TIERS}",
                self.tier_id
            )));
        }
        if !(1..=1000).contains(&self.token_multiplier) {
            return Err(LaunchpadError::InvalidArgument(format!(
                "token_multiplier {} must be within 1..=1000",
                self.token_multiplier
            )));
        }
        if !(1..=10_000).contains(&self.probability_bps) {
            return Err(LaunchpadError::InvalidArgument(format!(
                "probability_bps {} must be within 1..=10000",
                self.probability_bps
            )));
        }
        if self.metadata_attributes.len() > MAX_METADATA_ATTRIBUTES {
            return Err(LaunchpadError::InvalidArgument(format!(
                "{} metadata attributes exceed {MAX_METADATA_ATTRIBUTES}",
                self.metadata_attributes.len()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RarityOracleProgram {
    pub program_id: Address,
}

impl RarityOracleProgram {
    pub fn new(program_id: Address) -> Self {
        Self { program_id }
    }

    pub fn from_ids(ids: &ProgramIds) -> Self {
        Self::new(ids.rarity_oracle)
    }

    /// `["rarity_config", collection_config]`.
    pub fn rarity_config(&self, collection_config: &Address) -> Result<DerivedAddress, LaunchpadError> {
        Ok(find_program_address(
            &[seeds::RARITY_CONFIG, collection_config.as_ref()],
            &self.program_id,
        )?)
    }

    /// `["rarity_tier", rarity_config, [tier_id]]`.
    pub fn rarity_tier(&self, rarity_config: &Address, tier_id: u8) -> Result<DerivedAddress, LaunchpadError> {
        Ok(find_program_address(
            &[seeds::RARITY_TIER, rarity_config.as_ref(), &[tier_id]],
            &self.program_id,
        )?)
    }

    /// `["rarity_determination", rarity_config, nft_mint]`.
    pub fn rarity_determination(
        &self,
        rarity_config: &Address,
        nft_mint: &Address,
    ) -> Result<DerivedAddress, LaunchpadError> {
        Ok(find_program_address(
            &[seeds::RARITY_DETERMINATION, rarity_config.as_ref(), nft_mint.as_ref()],
            &self.program_id,
        )?)
    }

    pub fn initialize_rarity_config(
        &self,
        authority: &Address,
        collection_config: &Address,
    ) -> Result<Instruction, LaunchpadError> {
        let rarity_config = self.rarity_config(collection_config)?;
        let data = encode(&INITIALIZE_RARITY_CONFIG, &[])?;
        Ok(Instruction::new(
            self.program_id,
            vec![
                AccountMeta::writable(rarity_config.address),
                AccountMeta::readonly(*collection_config),
                AccountMeta::writable_signer(*authority),
                AccountMeta::readonly(SYSTEM_PROGRAM_ID),
            ],
            data,
        ))
    }

    pub fn add_rarity_tier(
        &self,
        authority: &Address,
        collection_config: &Address,
        tier: &RarityTierParams,
    ) -> Result<Instruction, LaunchpadError> {
        tier.validate()?;
        let rarity_config = self.rarity_config(collection_config)?;
        let rarity_tier = self.rarity_tier(&rarity_config.address, tier.tier_id)?;
        let data = encode(
            &ADD_RARITY_TIER,
            &[
                Arg::U8(tier.tier_id),
                Arg::Str(tier.tier_name.clone()),
                Arg::U64(tier.token_multiplier),
                Arg::U16(tier.probability_bps),
                Arg::StrList(tier.metadata_attributes.clone()),
            ],
        )?;
        Ok(Instruction::new(
            self.program_id,
            vec![
                AccountMeta::writable(rarity_config.address),
                AccountMeta::writable(rarity_tier.address),
                AccountMeta::writable_signer(*authority),
                AccountMeta::readonly(SYSTEM_PROGRAM_ID),
            ],
            data,
        ))
    }

    pub fn determine_rarity(
        &self,
        oracle_authority: &Address,
        collection_config: &Address,
        nft_mint: &Address,
        mint_index: u64,
    ) -> Result<Instruction, LaunchpadError> {
        let rarity_config = self.rarity_config(collection_config)?;
        let determination = self.rarity_determination(&rarity_config.address, nft_mint)?;
        let data = encode(&DETERMINE_RARITY, &[Arg::Pubkey(*nft_mint), Arg::U64(mint_index)])?;
        Ok(Instruction::new(
            self.program_id,
            vec![
                AccountMeta::writable(rarity_config.address),
                AccountMeta::writable(determination.address),
                AccountMeta::readonly(*nft_mint),
                AccountMeta::writable_signer(*oracle_authority),
                AccountMeta::readonly(SYSTEM_PROGRAM_ID),
            ],
            data,
        ))
    }
}
