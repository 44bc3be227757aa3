//! 0x0a -- the EIP-4844 KZG point-evaluation precompile.
//!
//! Validates the versioned hash against `sha256(commitment)` with the
//! required version byte, a real check, and returns the fixed
//! `(FIELD_ELEMENTS_PER_BLOB, BLS_MODULUS)` tail every conforming
//! implementation returns on success. The actual KZG pairing check that
//! `z`/`y`/`proof` open `commitment` is not performed -- out of scope per
//! the spec's "cryptographic precompile correctness beyond hash/ECC
//! wrappers" Non-goal, and documented in `DESIGN.md` rather than silently
//! skipped.

use crate::constants::{BLOB_COMMITMENT_VERSION_KZG, BLS_MODULUS, FIELD_ELEMENTS_PER_BLOB};
use crate::errors::{ExceptionalHalt, VMError};
use bytes::Bytes;
use ethereum_types::U256;
use sha2::{Digest, Sha256};

/// versioned_hash(32) || z(32) || y(32) || commitment(48) || proof(48).
const INPUT_LEN: usize = 32 + 32 + 32 + 48 + 48;

pub fn run(input: &[u8]) -> Result<Bytes, VMError> {
    if input.len() != INPUT_LEN {
        return Err(ExceptionalHalt::InvalidInstruction { opcode: 0x0a }.into());
    }
    let versioned_hash = &input[0..32];
    let commitment = &input[96..144];

    let mut digest = Sha256::digest(commitment);
    digest[0] = BLOB_COMMITMENT_VERSION_KZG;

    if digest.as_slice() != versioned_hash {
        return Err(ExceptionalHalt::InvalidInstruction { opcode: 0x0a }.into());
    }

    let mut out = [0u8; 64];
    out[0..32].copy_from_slice(&U256::from(FIELD_ELEMENTS_PER_BLOB).to_big_endian());
    let modulus = U256::from_dec_str(BLS_MODULUS).unwrap_or_default();
    out[32..64].copy_from_slice(&modulus.to_big_endian());
    Ok(Bytes::copy_from_slice(&out))
}
