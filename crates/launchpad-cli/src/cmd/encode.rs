use std::fmt;

use anyhow::{bail, Context, Result};
use chain_analos::{encode, Arg, InstructionSchema};
use launchpad_core::ProgramInterface;
use serde::Serialize;

use crate::output;

#[derive(Debug, Serialize)]
pub struct EncodeOut {
    pub program: &'static str,
    pub instruction: &'static str,
    pub discriminator: String,
    pub length: usize,
    pub data: String,
}

impl fmt::Display for EncodeOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.data)
    }
}

pub fn run(program: &str, instruction: &str, raw_args: &[String]) -> Result<()> {
    let iface = ProgramInterface::by_name(program)?;
    let schema = iface.find(instruction)?;
    let args = parse_args(schema, raw_args)?;
    let data = encode(schema, &args)?;

    output::print(&EncodeOut {
        program: iface.name,
        instruction: schema.name,
        discriminator: hex::encode(schema.discriminator),
        length: data.len(),
        data: hex::encode(&data),
    })
}

fn parse_args(schema: &InstructionSchema, raw: &[String]) -> Result<Vec<Arg>> {
    if raw.len() != schema.fields.len() {
        let expected: Vec<String> = schema
            .fields
            .iter()
            .map(|f| format!("{}:{}", f.name, f.ty.name()))
            .collect();
        bail!(
            "{} takes {} arguments ({}), got {}",
            schema.name,
            schema.fields.len(),
            expected.join(", "),
            raw.len()
        );
    }
    schema
        .fields
        .iter()
        .zip(raw)
        .map(|(field, input)| {
            Arg::parse(field.ty, input).with_context(|| format!("argument {}", field.name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn initialize_collection_from_strings() {
        let schema = ProgramInterface::by_name("launchpad")
            .unwrap()
            .find("initialize_collection")
            .unwrap();
        let args = parse_args(
            schema,
            &strings(&["1000", "1000000000", "100", "Test", "TST", "https://x/y.json"]),
        )
        .unwrap();
        let data = encode(schema, &args).unwrap();
        assert_eq!(data.len(), 67);
        assert_eq!(&data[..8], &schema.discriminator);
    }

    #[test]
    fn arity_and_type_errors() {
        let schema = ProgramInterface::by_name("launchpad")
            .unwrap()
            .find("withdraw_funds")
            .unwrap();
        let err = parse_args(schema, &[]).unwrap_err();
        assert!(err.to_string().contains("takes 1 arguments"));
        assert!(parse_args(schema, &strings(&["lots"])).is_err());
    }
}
