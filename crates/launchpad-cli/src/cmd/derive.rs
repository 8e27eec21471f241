use std::fmt;

use anyhow::{bail, Context, Result};
use chain_analos::{find_program_address, Address};
use launchpad_client::ClientConfig;
use launchpad_core::{LaunchpadProgram, PriceOracleProgram, ProgramIds, RarityOracleProgram};
use serde::Serialize;

use crate::args::DeriveTarget;
use crate::output;

#[derive(Debug, Serialize)]
pub struct DeriveOut {
    pub program_id: Address,
    pub address: Address,
    pub bump: u8,
}

impl fmt::Display for DeriveOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "address: {}", self.address)?;
        writeln!(f, "bump:    {}", self.bump)?;
        write!(f, "program: {}", self.program_id)
    }
}

pub fn run(config: &ClientConfig, target: &DeriveTarget) -> Result<()> {
    let ids = &config.programs;
    let (program_id, derived) = match target {
        DeriveTarget::Collection { authority } => {
            let program = LaunchpadProgram::from_ids(ids);
            (program.program_id, program.collection_config(authority)?)
        }
        DeriveTarget::Mint {
            collection_config,
            index,
        } => {
            let program = LaunchpadProgram::from_ids(ids);
            (program.program_id, program.mint_record(collection_config, *index)?)
        }
        DeriveTarget::PriceOracle => {
            let program = PriceOracleProgram::from_ids(ids);
            (program.program_id, program.price_oracle()?)
        }
        DeriveTarget::RarityConfig { collection_config } => {
            let program = RarityOracleProgram::from_ids(ids);
            (program.program_id, program.rarity_config(collection_config)?)
        }
        DeriveTarget::RarityTier {
            rarity_config,
            tier_id,
        } => {
            let program = RarityOracleProgram::from_ids(ids);
            (program.program_id, program.rarity_tier(rarity_config, *tier_id)?)
        }
        DeriveTarget::Raw { program, seeds } => {
            let program_id = resolve_program(ids, program)?;
            let seeds = seeds
                .iter()
                .map(|s| parse_seed(s))
                .collect::<Result<Vec<_>>>()?;
            let refs: Vec<&[u8]> = seeds.iter().map(Vec::as_slice).collect();
            (program_id, find_program_address(&refs, &program_id)?)
        }
    };

    output::print(&DeriveOut {
        program_id,
        address: derived.address,
        bump: derived.bump,
    })
}

fn resolve_program(ids: &ProgramIds, name: &str) -> Result<Address> {
    Ok(match name {
        "launchpad" => ids.launchpad,
        "price-oracle" => ids.price_oracle,
        "rarity-oracle" => ids.rarity_oracle,
        other => other
            .parse()
            .with_context(|| format!("unknown program {other:?}"))?,
    })
}

fn parse_seed(input: &str) -> Result<Vec<u8>> {
    let Some((kind, value)) = input.split_once(':') else {
        return Ok(input.as_bytes().to_vec());
    };
    let bytes = match kind {
        "str" => value.as_bytes().to_vec(),
        "pubkey" => value
            .parse::<Address>()
            .with_context(|| format!("seed {input:?}"))?
            .to_bytes()
            .to_vec(),
        "u64" => value
            .parse::<u64>()
            .with_context(|| format!("seed {input:?}"))?
            .to_le_bytes()
            .to_vec(),
        "u8" => vec![value.parse::<u8>().with_context(|| format!("seed {input:?}"))?],
        "hex" => hex::decode(value).with_context(|| format!("seed {input:?}"))?,
        other => bail!("unknown seed kind {other:?} in {input:?}"),
    };
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_kinds() {
        assert_eq!(parse_seed("collection").unwrap(), b"collection");
        assert_eq!(parse_seed("str:a:b").unwrap(), b"a:b");
        assert_eq!(parse_seed("u64:1").unwrap(), vec![1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(parse_seed("u8:7").unwrap(), vec![7]);
        assert_eq!(parse_seed("hex:0aff").unwrap(), vec![0x0a, 0xff]);
        assert_eq!(
            parse_seed(&format!("pubkey:{}", Address::new([0x42; 32]))).unwrap(),
            vec![0x42; 32]
        );
        assert!(parse_seed("u8:300").is_err());
        assert!(parse_seed("float:1.0").is_err());
    }

    #[test]
    fn program_names_resolve() {
        let ids = ProgramIds::default();
        assert_eq!(resolve_program(&ids, "launchpad").unwrap(), ids.launchpad);
        assert_eq!(resolve_program(&ids, "rarity-oracle").unwrap(), ids.rarity_oracle);
        let raw = Address::new([3; 32]);
        assert_eq!(resolve_program(&ids, &raw.to_string()).unwrap(), raw);
        assert!(resolve_program(&ids, "nope").is_err());
    }
}
