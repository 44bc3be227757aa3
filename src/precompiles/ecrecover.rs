//! 0x01 -- ECRECOVER: secp256k1 public key recovery.
//!
//! Malformed input (bad recovery id, invalid signature) is not an error at
//! the precompile-call boundary -- it simply yields an empty result, as
//! every EVM implementation does.

use crate::errors::VMError;
use crate::types::keccak;
use bytes::Bytes;
use ethereum_types::U256;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

pub fn run(input: &[u8]) -> Result<Bytes, VMError> {
    let mut padded = [0u8; 128];
    let n = input.len().min(128);
    padded[..n].copy_from_slice(&input[..n]);

    let hash = &padded[0..32];
    let v = U256::from_big_endian(&padded[32..64]);
    let r = &padded[64..96];
    let s = &padded[96..128];

    let Ok(recovery_byte) = u8::try_from(v) else {
        return Ok(Bytes::new());
    };
    if recovery_byte != 27 && recovery_byte != 28 {
        return Ok(Bytes::new());
    }
    let Ok(recovery_id) = RecoveryId::try_from(recovery_byte - 27) else {
        return Ok(Bytes::new());
    };

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(r);
    sig_bytes[32..].copy_from_slice(s);
    let Ok(signature) = Signature::from_slice(&sig_bytes) else {
        return Ok(Bytes::new());
    };

    let Ok(verifying_key) = VerifyingKey::recover_from_prehash(hash, &signature, recovery_id) else {
        return Ok(Bytes::new());
    };

    let encoded = verifying_key.to_encoded_point(false);
    let Some(uncompressed) = encoded.as_bytes().get(1..) else {
        return Ok(Bytes::new());
    };
    let digest = keccak(uncompressed);
    let mut out = [0u8; 32];
    out[12..].copy_from_slice(&digest.as_bytes()[12..]);
    Ok(Bytes::copy_from_slice(&out))
}
