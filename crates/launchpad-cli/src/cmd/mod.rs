use std::path::Path;

use anyhow::{Context, Result};
use chain_analos::Address;
use launchpad_client::{ClientConfig, KeypairWallet};
use secrecy::SecretString;

use crate::args::{Cli, Command};

mod collection;
mod derive;
mod encode;
mod init;
mod inspect;
mod keygen;
mod probe;
mod status;

pub const ENV_KEYSTORE_PASSWORD: &str = "ANALOS_KEYSTORE_PASSWORD";

pub async fn dispatch(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    match cli.command {
        Command::Derive { target } => derive::run(&config, &target),
        Command::Encode {
            program,
            instruction,
            args,
        } => encode::run(&program, &instruction, &args),
        Command::Inspect { data } => inspect::run(&data),
        Command::InitCollection {
            keypair,
            name,
            symbol,
            max_supply,
            price,
            reveal_threshold,
            placeholder_uri,
        } => {
            let collection = init::CollectionArgs {
                name,
                symbol,
                max_supply,
                price_los: price,
                reveal_threshold,
                placeholder_uri,
            };
            init::collection(&config, &keypair, collection).await
        }
        Command::InitPriceOracle {
            keypair,
            market_cap_usd,
        } => init::price_oracle(&config, &keypair, market_cap_usd).await,
        Command::InitRarityConfig { keypair, authority } => {
            init::rarity_config(&config, &keypair, authority).await
        }
        Command::Collection { authority } => collection::run(&config, &authority).await,
        Command::Status { signature } => status::run(&config, &signature).await,
        Command::Probe => probe::run(&config).await,
        Command::Keygen {
            out,
            encrypt,
            force,
        } => keygen::run(&out, encrypt, force),
    }
}

/// Defaults, then the config file, then `ANALOS_*`, then flags.
fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };
    config.apply_env()?;
    if let Some(network) = cli.network {
        config.network = network;
    }
    if let Some(url) = &cli.rpc_url {
        config.rpc_url = Some(url.clone());
    }
    Ok(config)
}

fn keystore_password() -> Option<SecretString> {
    std::env::var(ENV_KEYSTORE_PASSWORD)
        .ok()
        .filter(|p| !p.is_empty())
        .map(SecretString::from)
}

/// Plain keypair arrays load as-is; keystores need the password variable.
pub fn load_wallet(path: &Path) -> Result<KeypairWallet> {
    let password = keystore_password();
    KeypairWallet::load(path, password.as_ref())
        .with_context(|| format!("loading keypair {}", path.display()))
}

fn short(address: &Address) -> String {
    let s = address.to_string();
    if s.len() <= 12 {
        return s;
    }
    format!("{}..{}", &s[..4], &s[s.len() - 4..])
}
