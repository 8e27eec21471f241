//! Transaction assembly, wire format and signing.
//!
//! Analos keeps the Solana legacy transaction layout, built here by hand:
//!
//! ```text
//! Transaction:
//!   num_signatures          compact-u16
//!   signatures              64 bytes * num_signatures
//!   message:
//!     num_required_sigs     u8
//!     num_readonly_signed   u8
//!     num_readonly_unsigned u8
//!     num_accounts          compact-u16
//!     account_keys          32 bytes * num_accounts
//!     recent_blockhash      32 bytes
//!     num_instructions      compact-u16
//!     instructions[]        (see below)
//!
//! Instruction:
//!   program_id_index        u8
//!   num_accounts            compact-u16
//!   account_indices         u8 * num_accounts
//!   data_len                compact-u16
//!   data                    u8 * data_len
//! ```
//!
//! A transaction moves strictly forward: [`UnsignedTransaction`] (built
//! against a recent blockhash) to [`SignedTransaction`] (every required
//! signature present) to wire bytes. Nothing here retries or batches.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::address::Address;
use crate::error::ChainError;
use crate::instruction::Instruction;

/// Account indices are single bytes.
const MAX_ACCOUNTS: usize = 256;

// ---------------------------------------------------------------------------
// Compact-u16 encoding
// ---------------------------------------------------------------------------

/// Encode a `u16` value in compact-u16 format.
///
/// - Values 0..0x7f       -> 1 byte
/// - Values 0x80..0x3fff  -> 2 bytes
/// - Values 0x4000..      -> 3 bytes
pub fn encode_compact_u16(value: u16) -> Vec<u8> {
    let mut val = value as u32;
    let mut out = Vec::with_capacity(3);

    loop {
        let mut byte = (val & 0x7f) as u8;
        val >>= 7;
        if val > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if val == 0 {
            break;
        }
    }

    out
}

/// Decode a compact-u16 value.
///
/// Returns `(value, bytes_consumed)` or an error if the data is truncated.
pub fn decode_compact_u16(data: &[u8]) -> Result<(u16, usize), ChainError> {
    let mut value: u32 = 0;
    let mut shift = 0u32;
    let mut consumed = 0usize;

    loop {
        let byte = *data.get(consumed).ok_or_else(|| {
            ChainError::SerializationError(
                "unexpected end of data while decoding compact-u16".into(),
            )
        })?;
        consumed += 1;

        value |= ((byte & 0x7f) as u32) << shift;
        shift += 7;

        if byte & 0x80 == 0 || consumed >= 3 {
            break;
        }
    }

    let value = u16::try_from(value)
        .map_err(|_| ChainError::SerializationError("compact-u16 value overflow".into()))?;
    Ok((value, consumed))
}

fn compact_len(len: usize, what: &str) -> Result<Vec<u8>, ChainError> {
    let len = u16::try_from(len)
        .map_err(|_| ChainError::SerializationError(format!("too many {what}: {len}")))?;
    Ok(encode_compact_u16(len))
}

// ---------------------------------------------------------------------------
// Blockhash and signature
// ---------------------------------------------------------------------------

/// A recent chain checkpoint. Transactions built against it expire once it
/// ages out of the cluster's window.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Blockhash([u8; 32]);

impl Blockhash {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for Blockhash {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| ChainError::SerializationError(format!("blockhash: {e}")))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            ChainError::SerializationError(format!("blockhash: expected 32 bytes, got {}", v.len()))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for Blockhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Blockhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blockhash({self})")
    }
}

/// An Ed25519 transaction signature. The fee payer's signature doubles as
/// the transaction id.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; 64]);

impl Signature {
    pub const fn new(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    pub fn verify(&self, signer: &Address, message: &[u8]) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(signer.as_bytes()) else {
            return false;
        };
        key.verify_strict(message, &ed25519_dalek::Signature::from_bytes(&self.0))
            .is_ok()
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self([0u8; 64])
    }
}

impl FromStr for Signature {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| ChainError::SerializationError(format!("signature: {e}")))?;
        let arr: [u8; 64] = bytes.try_into().map_err(|v: Vec<u8>| {
            ChainError::SerializationError(format!("signature: expected 64 bytes, got {}", v.len()))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}

macro_rules! serde_as_base58 {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

serde_as_base58!(Blockhash);
serde_as_base58!(Signature);

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// An instruction whose accounts are indices into the message key list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub account_indices: Vec<u8>,
    pub data: Vec<u8>,
}

/// The signed portion of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Account keys in canonical order:
    ///   1. writable signers (fee payer first)
    ///   2. read-only signers
    ///   3. writable non-signers
    ///   4. read-only non-signers
    pub account_keys: Vec<Address>,
    pub num_required_signatures: u8,
    pub num_readonly_signed: u8,
    pub num_readonly_unsigned: u8,
    pub recent_blockhash: Blockhash,
    pub instructions: Vec<CompiledInstruction>,
}

impl Message {
    /// The accounts whose signatures this message requires, in slot order.
    pub fn signers(&self) -> &[Address] {
        &self.account_keys[..self.num_required_signatures as usize]
    }

    pub fn fee_payer(&self) -> Option<&Address> {
        self.account_keys.first()
    }

    /// Serialize the message (the bytes that get signed).
    pub fn serialize(&self) -> Result<Vec<u8>, ChainError> {
        let mut buf = Vec::with_capacity(256);

        buf.push(self.num_required_signatures);
        buf.push(self.num_readonly_signed);
        buf.push(self.num_readonly_unsigned);

        buf.extend_from_slice(&compact_len(self.account_keys.len(), "account keys")?);
        for key in &self.account_keys {
            buf.extend_from_slice(key.as_bytes());
        }

        buf.extend_from_slice(self.recent_blockhash.as_bytes());

        buf.extend_from_slice(&compact_len(self.instructions.len(), "instructions")?);
        for ix in &self.instructions {
            buf.push(ix.program_id_index);
            buf.extend_from_slice(&compact_len(ix.account_indices.len(), "instruction accounts")?);
            buf.extend_from_slice(&ix.account_indices);
            buf.extend_from_slice(&compact_len(ix.data.len(), "instruction data bytes")?);
            buf.extend_from_slice(&ix.data);
        }

        Ok(buf)
    }
}

/// Compile instructions into a message paid for by `fee_payer`.
pub fn compile_message(
    instructions: &[Instruction],
    fee_payer: &Address,
    recent_blockhash: &Blockhash,
) -> Result<Message, ChainError> {
    if instructions.is_empty() {
        return Err(ChainError::TransactionBuildError(
            "transaction has no instructions".into(),
        ));
    }

    // Instruction account lists are tiny; a Vec keeps insertion order.
    struct AccountEntry {
        address: Address,
        is_signer: bool,
        is_writable: bool,
    }

    let mut entries: Vec<AccountEntry> = Vec::new();
    let mut upsert = |address: Address, signer: bool, writable: bool| {
        if let Some(entry) = entries.iter_mut().find(|e| e.address == address) {
            entry.is_signer |= signer;
            entry.is_writable |= writable;
        } else {
            entries.push(AccountEntry {
                address,
                is_signer: signer,
                is_writable: writable,
            });
        }
    };

    upsert(*fee_payer, true, true);
    for ix in instructions {
        for meta in &ix.accounts {
            upsert(meta.address, meta.is_signer, meta.is_writable);
        }
        upsert(ix.program_id, false, false);
    }

    if entries.len() > MAX_ACCOUNTS {
        return Err(ChainError::TransactionBuildError(format!(
            "{} accounts exceed the limit of {MAX_ACCOUNTS}",
            entries.len()
        )));
    }

    // Stable sort: the fee payer was inserted first as a writable signer,
    // so it stays at index 0.
    entries.sort_by_key(|e| match (e.is_signer, e.is_writable) {
        (true, true) => 0u8,
        (true, false) => 1,
        (false, true) => 2,
        (false, false) => 3,
    });

    let count = |pred: fn(&AccountEntry) -> bool| entries.iter().filter(|e| pred(e)).count() as u8;
    let num_required_signatures = count(|e| e.is_signer);
    let num_readonly_signed = count(|e| e.is_signer && !e.is_writable);
    let num_readonly_unsigned = count(|e| !e.is_signer && !e.is_writable);

    let account_keys: Vec<Address> = entries.iter().map(|e| e.address).collect();
    let index_of = |address: &Address| -> Result<u8, ChainError> {
        account_keys
            .iter()
            .position(|k| k == address)
            .map(|i| i as u8)
            .ok_or_else(|| {
                ChainError::TransactionBuildError(format!("{address} not in account keys"))
            })
    };

    let mut compiled = Vec::with_capacity(instructions.len());
    for ix in instructions {
        let account_indices = ix
            .accounts
            .iter()
            .map(|meta| index_of(&meta.address))
            .collect::<Result<Vec<_>, _>>()?;
        compiled.push(CompiledInstruction {
            program_id_index: index_of(&ix.program_id)?,
            account_indices,
            data: ix.data.clone(),
        });
    }

    Ok(Message {
        account_keys,
        num_required_signatures,
        num_readonly_signed,
        num_readonly_unsigned,
        recent_blockhash: *recent_blockhash,
        instructions: compiled,
    })
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// A compiled transaction awaiting signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    message: Message,
}

impl UnsignedTransaction {
    pub fn new(
        instructions: &[Instruction],
        fee_payer: &Address,
        recent_blockhash: &Blockhash,
    ) -> Result<Self, ChainError> {
        Ok(Self {
            message: compile_message(instructions, fee_payer, recent_blockhash)?,
        })
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    /// The exact bytes every signer signs.
    pub fn message_bytes(&self) -> Result<Vec<u8>, ChainError> {
        self.message.serialize()
    }

    pub fn required_signers(&self) -> &[Address] {
        self.message.signers()
    }

    /// Sign with locally held keys. Every required signer must be present
    /// and no extra keys are accepted.
    pub fn sign(self, keys: &[&SigningKey]) -> Result<SignedTransaction, ChainError> {
        let message_bytes = self.message_bytes()?;
        let signers = self.required_signers();

        if let Some(extra) = keys
            .iter()
            .map(|k| Address::new(k.verifying_key().to_bytes()))
            .find(|pk| !signers.contains(pk))
        {
            return Err(ChainError::SigningError(format!(
                "{extra} is not a signer of this transaction"
            )));
        }

        let mut signatures = Vec::with_capacity(signers.len());
        for signer in signers {
            let key = keys
                .iter()
                .find(|k| k.verifying_key().to_bytes() == signer.to_bytes())
                .ok_or_else(|| ChainError::SigningError(format!("missing signer {signer}")))?;
            signatures.push(Signature::new(key.sign(&message_bytes).to_bytes()));
        }

        Ok(SignedTransaction {
            signatures,
            message: self.message,
        })
    }
}

/// A transaction with every required signature attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    signatures: Vec<Signature>,
    message: Message,
}

impl SignedTransaction {
    /// Attach signatures produced elsewhere (for example by an external
    /// wallet). Each is verified against its signer slot.
    pub fn from_parts(
        unsigned: UnsignedTransaction,
        signatures: Vec<Signature>,
    ) -> Result<Self, ChainError> {
        let signers = unsigned.required_signers();
        if signatures.len() != signers.len() {
            return Err(ChainError::SigningError(format!(
                "expected {} signatures, got {}",
                signers.len(),
                signatures.len()
            )));
        }

        let message_bytes = unsigned.message_bytes()?;
        for (signer, signature) in signers.iter().zip(&signatures) {
            if !signature.verify(signer, &message_bytes) {
                return Err(ChainError::SigningError(format!(
                    "invalid signature for {signer}"
                )));
            }
        }

        Ok(Self {
            signatures,
            message: unsigned.message,
        })
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// The fee payer's signature, used to track the transaction.
    pub fn signature(&self) -> Signature {
        self.signatures.first().copied().unwrap_or_default()
    }

    /// Serialize into wire format, ready for `sendTransaction`.
    pub fn to_wire(&self) -> Result<Vec<u8>, ChainError> {
        let message_bytes = self.message.serialize()?;
        let mut wire = Vec::with_capacity(3 + 64 * self.signatures.len() + message_bytes.len());
        wire.extend_from_slice(&compact_len(self.signatures.len(), "signatures")?);
        for sig in &self.signatures {
            wire.extend_from_slice(sig.as_bytes());
        }
        wire.extend_from_slice(&message_bytes);
        Ok(wire)
    }
}
