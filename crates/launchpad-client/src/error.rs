use chain_analos::ChainError;
use launchpad_core::LaunchpadError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Built locally and rejected before anything was sent.
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("Wallet rejected the request: {0}")]
    WalletRejected(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Metadata store error: {0}")]
    Store(String),

    #[error("Keystore error: {0}")]
    Keystore(String),
}

impl From<ChainError> for ClientError {
    fn from(e: ChainError) -> Self {
        ClientError::Encoding(e.to_string())
    }
}

impl From<LaunchpadError> for ClientError {
    fn from(e: LaunchpadError) -> Self {
        ClientError::Encoding(e.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_layer_errors_map_to_encoding() {
        let err: ClientError = ChainError::InvalidAddress("xyz".into()).into();
        assert!(matches!(err, ClientError::Encoding(_)));

        let err: ClientError = LaunchpadError::UnknownNetwork("moon".into()).into();
        assert_eq!(err.to_string(), "Encoding error: Unknown network: moon");
    }

    #[test]
    fn rpc_error_display() {
        let err = ClientError::Rpc {
            code: -32002,
            message: "Transaction simulation failed".into(),
        };
        assert_eq!(err.to_string(), "RPC error -32002: Transaction simulation failed");
    }
}
