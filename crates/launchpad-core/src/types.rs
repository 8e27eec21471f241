use std::fmt;
use std::str::FromStr;

use chain_analos::Address;
use serde::{Deserialize, Serialize};

use crate::error::LaunchpadError;

/// Analos clusters the client can talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Devnet,
    Testnet,
    Localnet,
}

pub const MAINNET_RPC_URL: &str = "https://rpc.analos.io";
pub const MAINNET_WS_URL: &str = "wss://rpc.analos.io";
pub const LOCALNET_RPC_URL: &str = "http://127.0.0.1:8899";
pub const LOCALNET_WS_URL: &str = "ws://127.0.0.1:8900";
pub const EXPLORER_BASE_URL: &str = "https://explorer.analos.io";

impl Network {
    pub fn display_name(&self) -> &'static str {
        match self {
            Network::Mainnet => "Analos Mainnet",
            Network::Devnet => "Analos Devnet",
            Network::Testnet => "Analos Testnet",
            Network::Localnet => "Local Validator",
        }
    }

    /// Built-in RPC endpoint. Devnet and testnet have none and must be
    /// configured explicitly.
    pub fn default_rpc_url(&self) -> Option<&'static str> {
        match self {
            Network::Mainnet => Some(MAINNET_RPC_URL),
            Network::Localnet => Some(LOCALNET_RPC_URL),
            Network::Devnet | Network::Testnet => None,
        }
    }

    pub fn default_ws_url(&self) -> Option<&'static str> {
        match self {
            Network::Mainnet => Some(MAINNET_WS_URL),
            Network::Localnet => Some(LOCALNET_WS_URL),
            Network::Devnet | Network::Testnet => None,
        }
    }

    pub fn is_testnet(&self) -> bool {
        !matches!(self, Network::Mainnet)
    }

    /// Guess the cluster from an RPC endpoint URL.
    pub fn from_endpoint(url: &str) -> Self {
        let url = url.to_ascii_lowercase();
        if url.contains("devnet") {
            Network::Devnet
        } else if url.contains("testnet") {
            Network::Testnet
        } else if url.contains("localhost") || url.contains("127.0.0.1") {
            Network::Localnet
        } else {
            Network::Mainnet
        }
    }

    fn explorer_cluster(&self) -> Option<&'static str> {
        match self {
            Network::Mainnet => None,
            Network::Devnet => Some("devnet"),
            Network::Testnet => Some("testnet"),
            Network::Localnet => Some("custom"),
        }
    }

    fn explorer_url(&self, kind: &str, id: &str) -> String {
        match self.explorer_cluster() {
            Some(cluster) => format!("{EXPLORER_BASE_URL}/{kind}/{id}?cluster={cluster}"),
            None => format!("{EXPLORER_BASE_URL}/{kind}/{id}"),
        }
    }

    /// Explorer link for a transaction signature.
    pub fn explorer_tx_url(&self, signature: &impl fmt::Display) -> String {
        self.explorer_url("tx", &signature.to_string())
    }

    /// Explorer link for an account.
    pub fn explorer_account_url(&self, address: &Address) -> String {
        self.explorer_url("account", &address.to_string())
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Mainnet => "mainnet",
            Network::Devnet => "devnet",
            Network::Testnet => "testnet",
            Network::Localnet => "localnet",
        };
        f.write_str(name)
    }
}

impl FromStr for Network {
    type Err = LaunchpadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "mainnet-beta" => Ok(Network::Mainnet),
            "devnet" => Ok(Network::Devnet),
            "testnet" => Ok(Network::Testnet),
            "localnet" | "localhost" | "local" => Ok(Network::Localnet),
            other => Err(LaunchpadError::UnknownNetwork(other.to_string())),
        }
    }
}

/// Derive a WebSocket endpoint from an RPC endpoint.
///
/// `https` becomes `wss` and `http` becomes `ws`. A local validator serves
/// pubsub on the RPC port plus one.
pub fn derive_ws_url(rpc_url: &str) -> Option<String> {
    let (scheme, rest) = rpc_url.split_once("://")?;
    let ws_scheme = match scheme {
        "https" => "wss",
        "http" => "ws",
        _ => return None,
    };

    let (authority, path) = match rest.find('/') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };
    let authority = match authority.rsplit_once(':') {
        Some((host, port)) if Network::from_endpoint(host) == Network::Localnet => {
            let port: u16 = port.parse().ok()?;
            format!("{host}:{}", port.checked_add(1)?)
        }
        _ => authority.to_string(),
    };

    Some(format!("{ws_scheme}://{authority}{path}"))
}

// ---------------------------------------------------------------------------
// Program ids
// ---------------------------------------------------------------------------

/// NFT launchpad: `BJcthd8WgvkFbncnb6TyaoLUrMv4R1X3fpPCdzD9PaHS`
pub const LAUNCHPAD_PROGRAM_ID: Address = Address::new([
    0x99, 0x18, 0x53, 0x56, 0x6c, 0x71, 0x6b, 0xcf, 0xc6, 0xd2, 0x35, 0xc4, 0xdc, 0xeb, 0x03, 0x13,
    0x3b, 0xac, 0x02, 0xee, 0x6a, 0xfa, 0x35, 0x5b, 0xa6, 0xef, 0xfb, 0x89, 0xdd, 0xef, 0xf2, 0x0d,
]);

/// Price oracle: `5ihyquuoRJXTocBhjEA48rGQGsM9ZB6HezYE1dQq8NUD`
pub const PRICE_ORACLE_PROGRAM_ID: Address = Address::new([
    0x46, 0x1d, 0xe5, 0xad, 0x50, 0xa1, 0x83, 0x4c, 0xb7, 0x97, 0xea, 0x13, 0x65, 0x5a, 0xdf, 0x61,
    0x84, 0xb4, 0x6c, 0x83, 0x8f, 0x41, 0xf1, 0x7f, 0x7e, 0x33, 0xdd, 0xcb, 0xa4, 0x4a, 0x75, 0x96,
]);

/// Rarity oracle: `3cnHMbD3Y88BZbxEPzv7WZGkN12X2bwKEP4FFtaVd5B2`
pub const RARITY_ORACLE_PROGRAM_ID: Address = Address::new([
    0x26, 0xe1, 0xe7, 0x15, 0x78, 0xf7, 0x19, 0xd1, 0x28, 0x52, 0xcc, 0xd4, 0xb4, 0x68, 0xc3, 0x00,
    0xf6, 0xda, 0x36, 0xc0, 0x17, 0x1d, 0xc0, 0x61, 0x6e, 0xf3, 0x96, 0x41, 0x22, 0x20, 0x69, 0x95,
]);

/// Deployed program ids. Always configuration, never hardcoded at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramIds {
    pub launchpad: Address,
    pub price_oracle: Address,
    pub rarity_oracle: Address,
}

impl Default for ProgramIds {
    fn default() -> Self {
        Self {
            launchpad: LAUNCHPAD_PROGRAM_ID,
            price_oracle: PRICE_ORACLE_PROGRAM_ID,
            rarity_oracle: RARITY_ORACLE_PROGRAM_ID,
        }
    }
}

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// 1 LOS = 10^9 lamports.
pub const LAMPORTS_PER_LOS: u64 = 1_000_000_000;
/// The price oracle stores USD amounts with 6 decimals.
pub const MICRO_USD_PER_USD: u64 = 1_000_000;

/// Lamports to LOS for display.
pub fn lamports_to_los(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_LOS as f64
}

/// LOS to lamports, rejecting negative, non-finite and overflowing input.
pub fn los_to_lamports(los: f64) -> Result<u64, LaunchpadError> {
    scale_checked(los, LAMPORTS_PER_LOS, "LOS")
}

/// Whole USD to the oracle's 6-decimal fixed point.
pub fn usd_to_micro_usd(usd: f64) -> Result<u64, LaunchpadError> {
    scale_checked(usd, MICRO_USD_PER_USD, "USD")
}

fn scale_checked(value: f64, scale: u64, unit: &str) -> Result<u64, LaunchpadError> {
    if !value.is_finite() || value < 0.0 {
        return Err(LaunchpadError::AmountOutOfRange(format!("{value} {unit}")));
    }
    let scaled = (value * scale as f64).round();
    if scaled >= u64::MAX as f64 {
        return Err(LaunchpadError::AmountOutOfRange(format!("{value} {unit}")));
    }
    Ok(scaled as u64)
}
