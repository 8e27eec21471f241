//! Password-encrypted keypair files.
//!
//! The 32-byte Ed25519 seed is sealed with AES-256-GCM under a key derived
//! from the password with Argon2id. The file is JSON:
//! `{ version, public_key, kdf, salt, ciphertext }` where `ciphertext` is
//! `nonce (12 bytes) | ciphertext + tag`, hex encoded.

use aes_gcm::aead::{Aead, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, KeyInit, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use chain_analos::{Address, SigningKey};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::ClientError;

pub const KEYSTORE_VERSION: u8 = 1;
const NONCE_SIZE: usize = 12;
const SALT_SIZE: usize = 16;

/// Argon2id cost parameters, stored alongside the ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    /// 64 MiB, 3 passes, 4 lanes.
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    /// 1 GiB.
    pub const MAX_MEMORY_KIB: u32 = 1 << 20;
    pub const MAX_ITERATIONS: u32 = 64;
    pub const MAX_PARALLELISM: u32 = 16;

    /// Checked before every derivation, including ones whose parameters
    /// were read from a keystore file.
    pub fn check(&self) -> Result<(), ClientError> {
        let over = |what: &str, value: u32, max: u32| {
            Err(ClientError::Keystore(format!(
                "argon2 {what} {value} exceeds the limit of {max}"
            )))
        };
        if self.memory_kib > Self::MAX_MEMORY_KIB {
            return over("memory_kib", self.memory_kib, Self::MAX_MEMORY_KIB);
        }
        if self.iterations > Self::MAX_ITERATIONS {
            return over("iterations", self.iterations, Self::MAX_ITERATIONS);
        }
        if self.parallelism > Self::MAX_PARALLELISM {
            return over("parallelism", self.parallelism, Self::MAX_PARALLELISM);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedKeypair {
    pub version: u8,
    pub public_key: Address,
    pub kdf: KdfParams,
    pub salt: String,
    pub ciphertext: String,
}

fn derive_key(password: &[u8], salt: &[u8], params: &KdfParams) -> Result<[u8; 32], ClientError> {
    params.check()?;
    let params = Params::new(params.memory_kib, params.iterations, params.parallelism, Some(32))
        .map_err(|e| ClientError::Keystore(format!("invalid argon2 params: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = [0u8; 32];
    argon2
        .hash_password_into(password, salt, &mut output)
        .map_err(|e| ClientError::Keystore(format!("argon2 hash failed: {e}")))?;
    Ok(output)
}

/// Seal `key` under `password`.
pub fn encrypt_keypair(
    key: &SigningKey,
    password: &SecretString,
    params: KdfParams,
) -> Result<EncryptedKeypair, ClientError> {
    let mut salt = [0u8; SALT_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut salt);

    let mut aes_key = derive_key(password.expose_secret().as_bytes(), &salt, &params)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&aes_key));
    aes_key.zeroize();

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let mut seed = key.to_bytes();
    let sealed = cipher.encrypt(&nonce, &seed[..]);
    seed.zeroize();
    let sealed = sealed.map_err(|e| ClientError::Keystore(format!("encryption failed: {e}")))?;

    let mut ciphertext = Vec::with_capacity(NONCE_SIZE + sealed.len());
    ciphertext.extend_from_slice(&nonce);
    ciphertext.extend_from_slice(&sealed);

    Ok(EncryptedKeypair {
        version: KEYSTORE_VERSION,
        public_key: Address::new(key.verifying_key().to_bytes()),
        kdf: params,
        salt: hex::encode(salt),
        ciphertext: hex::encode(ciphertext),
    })
}

/// Open a keystore. A wrong password and a tampered file both fail here.
pub fn decrypt_keypair(
    encrypted: &EncryptedKeypair,
    password: &SecretString,
) -> Result<SigningKey, ClientError> {
    if encrypted.version != KEYSTORE_VERSION {
        return Err(ClientError::Keystore(format!(
            "unsupported keystore version {}",
            encrypted.version
        )));
    }
    let salt = hex::decode(&encrypted.salt)
        .map_err(|e| ClientError::Keystore(format!("salt: {e}")))?;
    let ciphertext = hex::decode(&encrypted.ciphertext)
        .map_err(|e| ClientError::Keystore(format!("ciphertext: {e}")))?;
    if ciphertext.len() < NONCE_SIZE {
        return Err(ClientError::Keystore(format!(
            "ciphertext too short: expected at least {NONCE_SIZE} bytes, got {}",
            ciphertext.len()
        )));
    }

    let mut aes_key = derive_key(password.expose_secret().as_bytes(), &salt, &encrypted.kdf)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&aes_key));
    aes_key.zeroize();

    let (nonce, sealed) = ciphertext.split_at(NONCE_SIZE);
    let mut seed = cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| ClientError::Keystore("wrong password or corrupted keystore".into()))?;

    let seed_arr: Result<[u8; 32], _> = seed.as_slice().try_into();
    seed.zeroize();
    let mut seed_arr = seed_arr
        .map_err(|_| ClientError::Keystore("decrypted seed is not 32 bytes".into()))?;
    let key = SigningKey::from_bytes(&seed_arr);
    seed_arr.zeroize();

    if Address::new(key.verifying_key().to_bytes()) != encrypted.public_key {
        return Err(ClientError::Keystore(
            "decrypted key does not match the stored public key".into(),
        ));
    }
    Ok(key)
}
