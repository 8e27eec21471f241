//! Program-derived addresses.
//!
//! A PDA is `SHA-256(seed_0 || ... || seed_n || program_id || "ProgramDerivedAddress")`
//! that does not decompress to an Ed25519 point, so no private key can sign
//! for it. `find_program_address` appends a one-byte bump seed and walks it
//! from 255 down to 0 until the hash lands off the curve.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::address::{Address, ASSOCIATED_TOKEN_PROGRAM_ID, TOKEN_PROGRAM_ID};
use crate::error::ChainError;

/// Appended after the program id in every PDA hash.
const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

pub const MAX_SEEDS: usize = 16;
pub const MAX_SEED_LEN: usize = 32;

/// An address found by bump search, together with the bump that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedAddress {
    pub address: Address,
    pub bump: u8,
}

/// Hash `seeds` under `program_id` without searching for a bump.
///
/// Fails with `InvalidSeeds` if the result is on the curve or the seeds
/// exceed the chain's limits.
pub fn create_program_address(seeds: &[&[u8]], program_id: &Address) -> Result<Address, ChainError> {
    check_seeds(seeds)?;
    let hash = hash_seeds(seeds, program_id);
    if hash.is_on_curve() {
        return Err(ChainError::InvalidSeeds(
            "derived address lies on the ed25519 curve".into(),
        ));
    }
    Ok(hash)
}

/// Find the canonical PDA for `seeds` under `program_id`.
///
/// The bump is appended as the final seed, so callers may pass at most
/// `MAX_SEEDS - 1` seeds of their own.
pub fn find_program_address(
    seeds: &[&[u8]],
    program_id: &Address,
) -> Result<DerivedAddress, ChainError> {
    if seeds.len() >= MAX_SEEDS {
        return Err(ChainError::InvalidSeeds(format!(
            "at most {} seeds plus the bump, got {}",
            MAX_SEEDS - 1,
            seeds.len()
        )));
    }
    check_seeds(seeds)?;

    for bump in (0u8..=255).rev() {
        let bump_seed = [bump];
        let mut with_bump: Vec<&[u8]> = Vec::with_capacity(seeds.len() + 1);
        with_bump.extend_from_slice(seeds);
        with_bump.push(&bump_seed);
        let candidate = hash_seeds(&with_bump, program_id);

        if !candidate.is_on_curve() {
            return Ok(DerivedAddress {
                address: candidate,
                bump,
            });
        }
    }

    Err(ChainError::NoViableBump {
        program_id: program_id.to_string(),
    })
}

/// Derive the associated token account for a wallet + mint pair.
///
/// Seeds are `[wallet, token_program_id, mint]` under the Associated Token
/// Account program.
pub fn derive_associated_token_address(
    wallet: &Address,
    mint: &Address,
) -> Result<Address, ChainError> {
    find_program_address(
        &[wallet.as_ref(), TOKEN_PROGRAM_ID.as_ref(), mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
    .map(|derived| derived.address)
}

fn check_seeds(seeds: &[&[u8]]) -> Result<(), ChainError> {
    if seeds.len() > MAX_SEEDS {
        return Err(ChainError::InvalidSeeds(format!(
            "at most {MAX_SEEDS} seeds, got {}",
            seeds.len()
        )));
    }
    if let Some(seed) = seeds.iter().find(|s| s.len() > MAX_SEED_LEN) {
        return Err(ChainError::InvalidSeeds(format!(
            "seed of {} bytes exceeds {MAX_SEED_LEN}",
            seed.len()
        )));
    }
    Ok(())
}

fn hash_seeds(seeds: &[&[u8]], program_id: &Address) -> Address {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(program_id.as_bytes());
    hasher.update(PDA_MARKER);
    Address::new(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> Address {
        "BPFLoaderUpgradeab1e11111111111111111111111".parse().unwrap()
    }

    // -- Published chain vectors --------------------------------------------

    #[test]
    fn create_matches_chain_vector_empty_seed() {
        let addr = create_program_address(&[b"", &[1]], &loader()).unwrap();
        assert_eq!(addr.to_string(), "BwqrghZA2htAcqq8dzP1WDAhTXYTYWj7CHxF5j7TDBAe");
    }

    #[test]
    fn create_matches_chain_vector_utf8_seed() {
        let addr = create_program_address(&["☉".as_bytes(), &[0]], &loader()).unwrap();
        assert_eq!(addr.to_string(), "13yWmRpaTR4r5nAktwLqMpRNr28tnVUZw26rTvPSSB19");
    }

    #[test]
    fn create_matches_chain_vector_two_words() {
        let addr = create_program_address(&[b"Talking", b"Squirrels"], &loader()).unwrap();
        assert_eq!(addr.to_string(), "2fnQrngrQT4SeLcdToJAD96phoEjNL2man2kfRLCASVk");
    }

    #[test]
    fn create_matches_chain_vector_pubkey_seed() {
        let seed: Address = "SeedPubey1111111111111111111111111111111111".parse().unwrap();
        let addr = create_program_address(&[seed.as_ref(), &[1]], &loader()).unwrap();
        assert_eq!(addr.to_string(), "976ymqVnfE32QFe6NfGDctSvVa36LWnvYxhU6G2232YL");
    }

    #[test]
    fn find_agrees_with_create_at_returned_bump() {
        let derived = find_program_address(&[b"Lil'", b"Bits"], &loader()).unwrap();
        assert_eq!(derived.bump, 254);
        let recreated =
            create_program_address(&[b"Lil'", b"Bits", &[derived.bump]], &loader()).unwrap();
        assert_eq!(recreated, derived.address);
    }

    #[test]
    fn bump_search_returns_the_highest_off_curve_bump() {
        let program: Address = "BJcthd8WgvkFbncnb6TyaoLUrMv4R1X3fpPCdzD9PaHS".parse().unwrap();
        for i in 0u8..32 {
            let seeds: [&[u8]; 2] = [b"mint", &[i]];
            let derived = find_program_address(&seeds, &program).unwrap();

            let bump = [derived.bump];
            let at_bump = create_program_address(&[seeds[0], seeds[1], &bump], &program).unwrap();
            assert_eq!(at_bump, derived.address);

            for higher in u16::from(derived.bump) + 1..=255 {
                let skipped = [higher as u8];
                assert!(
                    create_program_address(&[seeds[0], seeds[1], &skipped], &program).is_err(),
                    "bump {higher} was skipped for seed {i}"
                );
            }
        }
    }

    // -- Properties ----------------------------------------------------------

    #[test]
    fn derivation_is_deterministic() {
        let program: Address = "BJcthd8WgvkFbncnb6TyaoLUrMv4R1X3fpPCdzD9PaHS".parse().unwrap();
        let authority = [0x42u8; 32];
        let a = find_program_address(&[b"collection", &authority], &program).unwrap();
        let b = find_program_address(&[b"collection", &authority], &program).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn derived_addresses_are_off_curve() {
        let program: Address = "BJcthd8WgvkFbncnb6TyaoLUrMv4R1X3fpPCdzD9PaHS".parse().unwrap();
        for i in 0u8..64 {
            let derived = find_program_address(&[b"probe", &[i]], &program).unwrap();
            assert!(!derived.address.is_on_curve(), "seed {i} produced an on-curve address");
        }
    }

    #[test]
    fn known_seed_vector() {
        let program: Address = "BJcthd8WgvkFbncnb6TyaoLUrMv4R1X3fpPCdzD9PaHS".parse().unwrap();
        let derived = find_program_address(&[b"probe", &[0]], &program).unwrap();
        assert_eq!(
            derived.address.to_string(),
            "GQn3Wa6N3xKCtdHQm9CabA9TGHtzxoyiGeg7772RBzSu"
        );
        assert_eq!(derived.bump, 254);
    }

    #[test]
    fn different_programs_give_different_addresses() {
        let a = find_program_address(&[b"x"], &Address::new([1; 32])).unwrap();
        let b = find_program_address(&[b"x"], &Address::new([2; 32])).unwrap();
        assert_ne!(a.address, b.address);
    }

    #[test]
    fn associated_token_address_vector() {
        let ata = derive_associated_token_address(&Address::new([0x42; 32]), &Address::new([0x07; 32]))
            .unwrap();
        assert_eq!(ata.to_string(), "GbFJsymwbEWePe2Tu2aMQJtyTiZAdfJZtvxbFN68upf1");
        assert!(!ata.is_on_curve());
    }

    // -- Seed limits ---------------------------------------------------------

    #[test]
    fn seed_longer_than_32_bytes_is_rejected() {
        let long = [0u8; 33];
        let err = find_program_address(&[&long], &loader()).unwrap_err();
        assert!(matches!(err, ChainError::InvalidSeeds(_)));
    }

    #[test]
    fn sixteen_seeds_leave_no_room_for_bump() {
        let seeds: Vec<&[u8]> = vec![b"a"; MAX_SEEDS];
        assert!(find_program_address(&seeds, &loader()).is_err());
    }
}
