//! 0x02 / 0x03 -- SHA256 and RIPEMD160.

use bytes::Bytes;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

pub fn sha256(input: &[u8]) -> Bytes {
    let digest = Sha256::digest(input);
    Bytes::copy_from_slice(&digest)
}

pub fn ripemd160(input: &[u8]) -> Bytes {
    let digest = Ripemd160::digest(input);
    // Left-padded to 32 bytes, matching the EVM's word-sized precompile
    // output convention.
    let mut out = [0u8; 32];
    out[12..].copy_from_slice(&digest);
    Bytes::copy_from_slice(&out)
}
