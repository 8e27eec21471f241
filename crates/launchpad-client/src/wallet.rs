//! Wallet capability.
//!
//! A wallet exposes a public key and signs messages; it never hands out its
//! secret. Fresh keypairs that must co-sign (a new collection or NFT mint)
//! are held by the caller and passed to [`sign_with`] alongside the wallet.

use std::path::Path;

use async_trait::async_trait;
use chain_analos::{Address, Signature, SignedTransaction, SigningKey, UnsignedTransaction};
use ed25519_dalek::Signer;
use secrecy::SecretString;
use zeroize::{Zeroize, Zeroizing};

use crate::error::ClientError;
use crate::keystore::{decrypt_keypair, encrypt_keypair, EncryptedKeypair, KdfParams};

#[async_trait]
pub trait Wallet: Send + Sync {
    /// `None` while disconnected.
    fn public_key(&self) -> Option<Address>;

    fn connected(&self) -> bool {
        self.public_key().is_some()
    }

    /// Sign raw message bytes with the wallet's key.
    async fn sign_message(&self, message: &[u8]) -> Result<Signature, ClientError>;

    /// Sign a transaction whose only signer is this wallet.
    async fn sign_transaction(
        &self,
        tx: UnsignedTransaction,
    ) -> Result<SignedTransaction, ClientError> {
        sign_with(self, tx, &[]).await
    }
}

/// Collect a signature for every required signer: the wallet signs its own
/// slot and `co_signers` fill the rest.
pub async fn sign_with<W: Wallet + ?Sized>(
    wallet: &W,
    tx: UnsignedTransaction,
    co_signers: &[&SigningKey],
) -> Result<SignedTransaction, ClientError> {
    let owner = wallet.public_key().ok_or(ClientError::WalletNotConnected)?;
    let message = tx.message_bytes()?;
    let signers: Vec<Address> = tx.required_signers().to_vec();

    let mut signatures = Vec::with_capacity(signers.len());
    for signer in &signers {
        if *signer == owner {
            signatures.push(wallet.sign_message(&message).await?);
            continue;
        }
        let key = co_signers
            .iter()
            .find(|k| Address::new(k.verifying_key().to_bytes()) == *signer)
            .ok_or_else(|| {
                ClientError::WalletRejected(format!("no key for required signer {signer}"))
            })?;
        signatures.push(Signature::new(key.sign(&message).to_bytes()));
    }

    SignedTransaction::from_parts(tx, signatures)
        .map_err(|e| ClientError::WalletRejected(e.to_string()))
}

/// A wallet backed by an in-process Ed25519 key.
pub struct KeypairWallet {
    key: SigningKey,
}

impl std::fmt::Debug for KeypairWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeypairWallet")
            .field("public_key", &self.address())
            .finish_non_exhaustive()
    }
}

impl KeypairWallet {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    pub fn generate() -> Self {
        Self::new(SigningKey::generate(&mut rand::rngs::OsRng))
    }

    pub fn address(&self) -> Address {
        Address::new(self.key.verifying_key().to_bytes())
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.key
    }

    /// `secret (32) | public (32)`, the layout of CLI keypair files.
    pub fn from_keypair_bytes(bytes: &[u8]) -> Result<Self, ClientError> {
        let arr: &[u8; 64] = bytes.try_into().map_err(|_| {
            ClientError::Keystore(format!("keypair must be 64 bytes, got {}", bytes.len()))
        })?;
        let key = SigningKey::from_keypair_bytes(arr)
            .map_err(|e| ClientError::Keystore(format!("invalid keypair: {e}")))?;
        Ok(Self::new(key))
    }

    /// Plain JSON byte array, as written by `solana-keygen`.
    pub fn from_json(json: &str) -> Result<Self, ClientError> {
        let mut bytes: Vec<u8> = serde_json::from_str(json)
            .map_err(|e| ClientError::Keystore(format!("keypair json: {e}")))?;
        let wallet = Self::from_keypair_bytes(&bytes);
        bytes.zeroize();
        wallet
    }

    pub fn to_json(&self) -> Zeroizing<String> {
        let mut bytes = self.key.to_keypair_bytes();
        let list: Vec<String> = bytes.iter().map(u8::to_string).collect();
        bytes.zeroize();
        Zeroizing::new(format!("[{}]", list.join(",")))
    }

    /// Load either a plain keypair array or an encrypted keystore object.
    /// Encrypted files need `password`.
    pub fn load(path: &Path, password: Option<&SecretString>) -> Result<Self, ClientError> {
        let raw = Zeroizing::new(
            std::fs::read_to_string(path)
                .map_err(|e| ClientError::Keystore(format!("{}: {e}", path.display())))?,
        );
        if raw.trim_start().starts_with('[') {
            return Self::from_json(&raw);
        }

        let encrypted: EncryptedKeypair = serde_json::from_str(&raw)
            .map_err(|e| ClientError::Keystore(format!("{}: {e}", path.display())))?;
        let password = password.ok_or_else(|| {
            ClientError::Keystore(format!("{} is encrypted; a password is required", path.display()))
        })?;
        Ok(Self::new(decrypt_keypair(&encrypted, password)?))
    }

    pub fn encrypt(
        &self,
        password: &SecretString,
        params: KdfParams,
    ) -> Result<EncryptedKeypair, ClientError> {
        encrypt_keypair(&self.key, password, params)
    }
}

#[async_trait]
impl Wallet for KeypairWallet {
    fn public_key(&self) -> Option<Address> {
        Some(self.address())
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Signature, ClientError> {
        Ok(Signature::new(self.key.sign(message).to_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chain_analos::{AccountMeta, Blockhash, Instruction};

    use super::*;

    struct Disconnected;

    #[async_trait]
    impl Wallet for Disconnected {
        fn public_key(&self) -> Option<Address> {
            None
        }

        async fn sign_message(&self, _message: &[u8]) -> Result<Signature, ClientError> {
            Err(ClientError::WalletNotConnected)
        }
    }

    fn tx_for(signers: &[Address]) -> UnsignedTransaction {
        let accounts = signers.iter().map(|a| AccountMeta::writable_signer(*a)).collect();
        let ix = Instruction::new(Address::new([9; 32]), accounts, vec![1, 2, 3]);
        UnsignedTransaction::new(&[ix], &signers[0], &Blockhash::new([3; 32])).unwrap()
    }

    #[tokio::test]
    async fn keypair_wallet_signs_alone() {
        let wallet = KeypairWallet::new(SigningKey::from_bytes(&[1; 32]));
        assert!(wallet.connected());
        let signed = wallet.sign_transaction(tx_for(&[wallet.address()])).await.unwrap();
        let message = signed.message().serialize().unwrap();
        assert!(signed.signature().verify(&wallet.address(), &message));
    }

    #[tokio::test]
    async fn co_signer_fills_second_slot() {
        let wallet = KeypairWallet::new(SigningKey::from_bytes(&[1; 32]));
        let mint = SigningKey::from_bytes(&[2; 32]);
        let mint_addr = Address::new(mint.verifying_key().to_bytes());

        let signed = sign_with(&wallet, tx_for(&[wallet.address(), mint_addr]), &[&mint])
            .await
            .unwrap();
        assert_eq!(signed.signatures().len(), 2);
    }

    #[tokio::test]
    async fn missing_co_signer_is_rejected() {
        let wallet = KeypairWallet::new(SigningKey::from_bytes(&[1; 32]));
        let other = Address::new(SigningKey::from_bytes(&[2; 32]).verifying_key().to_bytes());
        let err = wallet
            .sign_transaction(tx_for(&[wallet.address(), other]))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::WalletRejected(_)));
    }

    #[tokio::test]
    async fn disconnected_wallet_cannot_sign() {
        let err = Disconnected
            .sign_transaction(tx_for(&[Address::new([4; 32])]))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::WalletNotConnected));
        assert!(!Disconnected.connected());
    }

    #[test]
    fn json_keypair_roundtrip() {
        let wallet = KeypairWallet::new(SigningKey::from_bytes(&[7; 32]));
        let json = wallet.to_json();
        let back = KeypairWallet::from_json(&json).unwrap();
        assert_eq!(back.address(), wallet.address());
    }

    #[test]
    fn mismatched_public_half_is_rejected() {
        let mut bytes = SigningKey::from_bytes(&[7; 32]).to_keypair_bytes().to_vec();
        bytes[63] ^= 1;
        assert!(KeypairWallet::from_keypair_bytes(&bytes).is_err());
        assert!(KeypairWallet::from_keypair_bytes(&bytes[..32]).is_err());
    }

    #[test]
    fn load_plain_and_encrypted_files() {
        let wallet = KeypairWallet::new(SigningKey::from_bytes(&[7; 32]));

        let mut plain = tempfile::NamedTempFile::new().unwrap();
        plain.write_all(wallet.to_json().as_bytes()).unwrap();
        let loaded = KeypairWallet::load(plain.path(), None).unwrap();
        assert_eq!(loaded.address(), wallet.address());

        let password = SecretString::from("pw".to_string());
        let light = KdfParams {
            memory_kib: 256,
            iterations: 1,
            parallelism: 1,
        };
        let sealed = wallet.encrypt(&password, light).unwrap();
        let mut enc = tempfile::NamedTempFile::new().unwrap();
        enc.write_all(serde_json::to_string(&sealed).unwrap().as_bytes())
            .unwrap();

        assert!(KeypairWallet::load(enc.path(), None).is_err());
        let loaded = KeypairWallet::load(enc.path(), Some(&password)).unwrap();
        assert_eq!(loaded.address(), wallet.address());
    }
}
