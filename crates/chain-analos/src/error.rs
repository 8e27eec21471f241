use thiserror::Error;

/// Analos chain-level errors: addresses, PDAs, instruction encoding, wire format.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid seeds: {0}")]
    InvalidSeeds(String),

    /// Every bump from 255 down to 0 produced an on-curve point.
    #[error("no viable bump seed for program {program_id}")]
    NoViableBump { program_id: String },

    #[error("instruction {instruction} expects {expected} arguments, got {got}")]
    ArgumentCount {
        instruction: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("argument `{field}` of {instruction} must be {expected}")]
    ArgumentType {
        instruction: &'static str,
        field: &'static str,
        expected: &'static str,
    },

    #[error("cannot parse `{input}` as {expected}")]
    ArgumentParse { input: String, expected: &'static str },

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),
}
