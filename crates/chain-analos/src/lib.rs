//! Analos chain primitives.
//!
//! Analos is a Solana fork, so this crate speaks the Solana account model:
//! Base58 addresses, program-derived addresses, Anchor-style instruction
//! data and the legacy transaction wire format. Everything is implemented
//! by hand on top of `ed25519-dalek`, `curve25519-dalek`, `sha2` and `bs58`
//! rather than pulling in `solana-sdk`.

pub mod address;
pub mod error;
pub mod instruction;
pub mod pda;
pub mod transaction;

pub use address::{
    validate_address, Address, ProgramId, ASSOCIATED_TOKEN_PROGRAM_ID, SYSTEM_PROGRAM_ID,
    SYSVAR_RENT_ID, TOKEN_PROGRAM_ID,
};
pub use error::ChainError;
pub use instruction::{
    account_discriminator, anchor_discriminator, decode, encode, encoded_len, AccountMeta, Arg,
    ByteReader, Field, FieldType, Instruction, InstructionSchema,
};
pub use pda::{
    create_program_address, derive_associated_token_address, find_program_address, DerivedAddress,
};
pub use transaction::{
    compile_message, decode_compact_u16, encode_compact_u16, Blockhash, CompiledInstruction,
    Message, Signature, SignedTransaction, UnsignedTransaction,
};

/// Re-exported so downstream crates sign with the same key type.
pub use ed25519_dalek::SigningKey;
