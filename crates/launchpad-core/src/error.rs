use chain_analos::ChainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchpadError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown program: {0}")]
    UnknownProgram(String),

    #[error("Unknown instruction {instruction} for {program}")]
    UnknownInstruction {
        program: &'static str,
        instruction: String,
    },

    #[error("Discriminator mismatch for {instruction}: table has {table}, derived {derived}")]
    DiscriminatorMismatch {
        instruction: &'static str,
        table: String,
        derived: String,
    },

    #[error("Account data error: {0}")]
    AccountData(String),

    #[error("Amount out of range: {0}")]
    AmountOutOfRange(String),

    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error(transparent)]
    Chain(#[from] ChainError),
}
