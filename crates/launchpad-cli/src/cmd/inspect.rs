use std::fmt;

use anyhow::{Context, Result};
use chain_analos::{decode, Arg};
use launchpad_core::identify;
use serde::Serialize;

use crate::output;

#[derive(Debug, Serialize)]
pub struct NamedArg {
    pub name: &'static str,
    pub value: Arg,
}

#[derive(Debug, Serialize)]
pub struct InspectOut {
    pub program: &'static str,
    pub instruction: &'static str,
    pub length: usize,
    pub args: Vec<NamedArg>,
}

impl fmt::Display for InspectOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{} ({} bytes)", self.program, self.instruction, self.length)?;
        for arg in &self.args {
            write!(f, "\n  {}: {}", arg.name, show(&arg.value))?;
        }
        Ok(())
    }
}

fn show(arg: &Arg) -> String {
    match arg {
        Arg::U8(v) => v.to_string(),
        Arg::U16(v) => v.to_string(),
        Arg::U64(v) => v.to_string(),
        Arg::I64(v) => v.to_string(),
        Arg::Bool(v) => v.to_string(),
        Arg::Str(v) => format!("{v:?}"),
        Arg::Pubkey(v) => v.to_string(),
        Arg::Bytes(v) => format!("0x{}", hex::encode(v)),
        Arg::StrList(v) => format!("{v:?}"),
        Arg::OptionU64(Some(v)) => v.to_string(),
        Arg::OptionU64(None) => "none".to_string(),
    }
}

pub fn run(data_hex: &str) -> Result<()> {
    let trimmed = data_hex.trim();
    let data = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
        .context("instruction data must be hex")?;
    output::print(&inspect(&data)?)
}

fn inspect(data: &[u8]) -> Result<InspectOut> {
    let (iface, schema) = identify(data).with_context(|| {
        let prefix = data.get(..8).map(hex::encode).unwrap_or_else(|| hex::encode(data));
        format!("no known instruction has discriminator {prefix}")
    })?;
    let args = decode(schema, data)?;
    Ok(InspectOut {
        program: iface.name,
        instruction: schema.name,
        length: data.len(),
        args: schema
            .fields
            .iter()
            .zip(args)
            .map(|(field, value)| NamedArg {
                name: field.name,
                value,
            })
            .collect(),
    })
}
