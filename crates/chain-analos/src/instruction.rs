//! Schema-driven instruction encoding.
//!
//! Every program instruction is described once by an [`InstructionSchema`]:
//! its name, its 8-byte discriminator and its ordered argument list. A
//! single encoder turns a schema plus typed [`Arg`]s into instruction data:
//!
//! ```text
//! discriminator   8 bytes (SHA-256("global:" + name)[..8])
//! arguments       in declaration order
//!   u8/u16/u64/i64  little-endian, fixed width
//!   bool            1 byte, 0 or 1
//!   string          u32 LE byte length + UTF-8 bytes
//!   bytes           u32 LE length + raw bytes
//!   pubkey          32 raw bytes
//!   vec<string>     u32 LE count + each string
//!   option<u64>     0, or 1 followed by u64 LE
//! ```
//!
//! Arity and type mismatches are caught here, before anything is signed.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::address::Address;
use crate::error::ChainError;

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    U8,
    U16,
    U64,
    I64,
    Bool,
    Str,
    Pubkey,
    Bytes,
    StrList,
    OptionU64,
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::U8 => "u8",
            FieldType::U16 => "u16",
            FieldType::U64 => "u64",
            FieldType::I64 => "i64",
            FieldType::Bool => "bool",
            FieldType::Str => "string",
            FieldType::Pubkey => "pubkey",
            FieldType::Bytes => "bytes",
            FieldType::StrList => "vec<string>",
            FieldType::OptionU64 => "option<u64>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
}

impl Field {
    pub const fn new(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty }
    }
}

/// One instruction of an on-chain program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InstructionSchema {
    pub name: &'static str,
    #[serde(serialize_with = "serialize_hex")]
    pub discriminator: [u8; 8],
    pub fields: &'static [Field],
}

fn serialize_hex<S: serde::Serializer>(bytes: &[u8; 8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(bytes))
}

/// Anchor's instruction discriminator: `SHA-256("global:" + name)[..8]`.
pub fn anchor_discriminator(name: &str) -> [u8; 8] {
    namespaced_discriminator("global", name)
}

/// Anchor's account discriminator: `SHA-256("account:" + Name)[..8]`.
pub fn account_discriminator(type_name: &str) -> [u8; 8] {
    namespaced_discriminator("account", type_name)
}

fn namespaced_discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let digest = Sha256::new()
        .chain_update(namespace.as_bytes())
        .chain_update(b":")
        .chain_update(name.as_bytes())
        .finalize();
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// A typed argument value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Arg {
    U8(u8),
    U16(u16),
    U64(u64),
    I64(i64),
    Bool(bool),
    Str(String),
    Pubkey(Address),
    Bytes(Vec<u8>),
    StrList(Vec<String>),
    OptionU64(Option<u64>),
}

impl Arg {
    pub fn field_type(&self) -> FieldType {
        match self {
            Arg::U8(_) => FieldType::U8,
            Arg::U16(_) => FieldType::U16,
            Arg::U64(_) => FieldType::U64,
            Arg::I64(_) => FieldType::I64,
            Arg::Bool(_) => FieldType::Bool,
            Arg::Str(_) => FieldType::Str,
            Arg::Pubkey(_) => FieldType::Pubkey,
            Arg::Bytes(_) => FieldType::Bytes,
            Arg::StrList(_) => FieldType::StrList,
            Arg::OptionU64(_) => FieldType::OptionU64,
        }
    }

    /// Number of bytes this argument occupies in instruction data.
    pub fn encoded_len(&self) -> usize {
        match self {
            Arg::U8(_) | Arg::Bool(_) => 1,
            Arg::U16(_) => 2,
            Arg::U64(_) | Arg::I64(_) => 8,
            Arg::Str(s) => 4 + s.len(),
            Arg::Pubkey(_) => 32,
            Arg::Bytes(b) => 4 + b.len(),
            Arg::StrList(items) => 4 + items.iter().map(|s| 4 + s.len()).sum::<usize>(),
            Arg::OptionU64(None) => 1,
            Arg::OptionU64(Some(_)) => 9,
        }
    }

    fn write_to(&self, buf: &mut Vec<u8>) -> Result<(), ChainError> {
        match self {
            Arg::U8(v) => buf.push(*v),
            Arg::U16(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Arg::U64(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Arg::I64(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Arg::Bool(v) => buf.push(u8::from(*v)),
            Arg::Str(s) => write_bytes(buf, s.as_bytes())?,
            Arg::Pubkey(pk) => buf.extend_from_slice(pk.as_bytes()),
            Arg::Bytes(b) => write_bytes(buf, b)?,
            Arg::StrList(items) => {
                buf.extend_from_slice(&len_prefix(items.len())?);
                for item in items {
                    write_bytes(buf, item.as_bytes())?;
                }
            }
            Arg::OptionU64(None) => buf.push(0),
            Arg::OptionU64(Some(v)) => {
                buf.push(1);
                buf.extend_from_slice(&v.to_le_bytes());
            }
        }
        Ok(())
    }

    /// Parse a textual argument (as typed on a command line) into `ty`.
    ///
    /// `vec<string>` is comma-separated; `option<u64>` accepts `none`;
    /// `bytes` is hex.
    pub fn parse(ty: FieldType, input: &str) -> Result<Arg, ChainError> {
        let bad = || ChainError::ArgumentParse {
            input: input.to_string(),
            expected: ty.name(),
        };
        let arg = match ty {
            FieldType::U8 => Arg::U8(input.parse().map_err(|_| bad())?),
            FieldType::U16 => Arg::U16(input.parse().map_err(|_| bad())?),
            FieldType::U64 => Arg::U64(input.parse().map_err(|_| bad())?),
            FieldType::I64 => Arg::I64(input.parse().map_err(|_| bad())?),
            FieldType::Bool => match input {
                "true" | "1" => Arg::Bool(true),
                "false" | "0" => Arg::Bool(false),
                _ => return Err(bad()),
            },
            FieldType::Str => Arg::Str(input.to_string()),
            FieldType::Pubkey => Arg::Pubkey(input.parse().map_err(|_| bad())?),
            FieldType::Bytes => {
                let trimmed = input.strip_prefix("0x").unwrap_or(input);
                Arg::Bytes(hex::decode(trimmed).map_err(|_| bad())?)
            }
            FieldType::StrList if input.is_empty() => Arg::StrList(Vec::new()),
            FieldType::StrList => Arg::StrList(input.split(',').map(str::to_string).collect()),
            FieldType::OptionU64 => match input {
                "" | "none" | "null" => Arg::OptionU64(None),
                n => Arg::OptionU64(Some(n.parse().map_err(|_| bad())?)),
            },
        };
        Ok(arg)
    }
}

fn len_prefix(len: usize) -> Result<[u8; 4], ChainError> {
    let len = u32::try_from(len)
        .map_err(|_| ChainError::SerializationError(format!("length {len} exceeds u32")))?;
    Ok(len.to_le_bytes())
}

fn write_bytes(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<(), ChainError> {
    buf.extend_from_slice(&len_prefix(bytes.len())?);
    buf.extend_from_slice(bytes);
    Ok(())
}

// ---------------------------------------------------------------------------
// Encode / decode
// ---------------------------------------------------------------------------

/// Total length of instruction data for `args`: discriminator plus fields.
pub fn encoded_len(args: &[Arg]) -> usize {
    8 + args.iter().map(Arg::encoded_len).sum::<usize>()
}

/// Check `args` against `schema` without encoding.
pub fn validate(schema: &InstructionSchema, args: &[Arg]) -> Result<(), ChainError> {
    if args.len() != schema.fields.len() {
        return Err(ChainError::ArgumentCount {
            instruction: schema.name,
            expected: schema.fields.len(),
            got: args.len(),
        });
    }
    for (field, arg) in schema.fields.iter().zip(args) {
        if arg.field_type() != field.ty {
            return Err(ChainError::ArgumentType {
                instruction: schema.name,
                field: field.name,
                expected: field.ty.name(),
            });
        }
    }
    Ok(())
}

/// Encode instruction data for `schema`.
pub fn encode(schema: &InstructionSchema, args: &[Arg]) -> Result<Vec<u8>, ChainError> {
    validate(schema, args)?;

    let mut buf = Vec::with_capacity(encoded_len(args));
    buf.extend_from_slice(&schema.discriminator);
    for arg in args {
        arg.write_to(&mut buf)?;
    }
    Ok(buf)
}

/// Decode instruction data produced by [`encode`].
///
/// Rejects a foreign discriminator, truncated fields and trailing bytes.
pub fn decode(schema: &InstructionSchema, data: &[u8]) -> Result<Vec<Arg>, ChainError> {
    let mut reader = ByteReader::new(data);
    let disc = reader.take(8)?;
    if disc != schema.discriminator {
        return Err(ChainError::SerializationError(format!(
            "discriminator {} does not match {}",
            hex::encode(disc),
            schema.name
        )));
    }

    let mut args = Vec::with_capacity(schema.fields.len());
    for field in schema.fields {
        args.push(reader.read_arg(field.ty)?);
    }
    reader.finish()?;
    Ok(args)
}

/// Little-endian cursor over account or instruction data.
#[derive(Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], ChainError> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.data.len());
        let end = end.ok_or_else(|| {
            ChainError::SerializationError(format!(
                "need {n} bytes at offset {}, only {} left",
                self.pos,
                self.data.len() - self.pos
            ))
        })?;
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], ChainError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, ChainError> {
        Ok(self.take(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16, ChainError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub fn u32(&mut self) -> Result<u32, ChainError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub fn u64(&mut self) -> Result<u64, ChainError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    pub fn i64(&mut self) -> Result<i64, ChainError> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    pub fn bool(&mut self) -> Result<bool, ChainError> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ChainError::SerializationError(format!(
                "invalid bool byte {other}"
            ))),
        }
    }

    pub fn pubkey(&mut self) -> Result<Address, ChainError> {
        Ok(Address::new(self.array()?))
    }

    pub fn bytes32(&mut self) -> Result<[u8; 32], ChainError> {
        self.array()
    }

    pub fn bytes(&mut self) -> Result<Vec<u8>, ChainError> {
        let len = self.u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    pub fn string(&mut self) -> Result<String, ChainError> {
        let raw = self.bytes()?;
        String::from_utf8(raw)
            .map_err(|e| ChainError::SerializationError(format!("invalid utf-8: {e}")))
    }

    pub fn read_arg(&mut self, ty: FieldType) -> Result<Arg, ChainError> {
        let arg = match ty {
            FieldType::U8 => Arg::U8(self.u8()?),
            FieldType::U16 => Arg::U16(self.u16()?),
            FieldType::U64 => Arg::U64(self.u64()?),
            FieldType::I64 => Arg::I64(self.i64()?),
            FieldType::Bool => Arg::Bool(self.bool()?),
            FieldType::Str => Arg::Str(self.string()?),
            FieldType::Pubkey => Arg::Pubkey(self.pubkey()?),
            FieldType::Bytes => Arg::Bytes(self.bytes()?),
            FieldType::StrList => {
                let count = self.u32()? as usize;
                let mut items = Vec::with_capacity(count.min(64));
                for _ in 0..count {
                    items.push(self.string()?);
                }
                Arg::StrList(items)
            }
            FieldType::OptionU64 => match self.u8()? {
                0 => Arg::OptionU64(None),
                1 => Arg::OptionU64(Some(self.u64()?)),
                tag => {
                    return Err(ChainError::SerializationError(format!(
                        "invalid option tag {tag}"
                    )))
                }
            },
        };
        Ok(arg)
    }

    /// Error if unread bytes remain.
    pub fn finish(&self) -> Result<(), ChainError> {
        if self.pos != self.data.len() {
            return Err(ChainError::SerializationError(format!(
                "{} trailing bytes",
                self.data.len() - self.pos
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

/// A single account reference in an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccountMeta {
    pub address: Address,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn writable(address: Address) -> Self {
        Self { address, is_signer: false, is_writable: true }
    }

    pub fn readonly(address: Address) -> Self {
        Self { address, is_signer: false, is_writable: false }
    }

    pub fn writable_signer(address: Address) -> Self {
        Self { address, is_signer: true, is_writable: true }
    }

    pub fn readonly_signer(address: Address) -> Self {
        Self { address, is_signer: true, is_writable: false }
    }
}

/// A program call ready to be placed in a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instruction {
    pub program_id: Address,
    pub accounts: Vec<AccountMeta>,
    #[serde(serialize_with = "serialize_data_hex")]
    pub data: Vec<u8>,
}

fn serialize_data_hex<S: serde::Serializer>(data: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(data))
}

impl Instruction {
    pub fn new(program_id: Address, accounts: Vec<AccountMeta>, data: Vec<u8>) -> Self {
        Self { program_id, accounts, data }
    }
}
