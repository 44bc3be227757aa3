//! Fixed-address pure functions dispatched before the opcode loop runs.
//!
//! Per the spec's explicit Non-goal ("cryptographic precompile correctness
//! beyond hash/ECC wrappers"), the hash-based precompiles (identity,
//! sha256, ripemd160) and ecrecover are byte-exact; modexp and the BN254
//! group operations are real but unoptimized; blake2f and the KZG
//! point-evaluation precompile are structurally correct but do not claim
//! full cryptographic rigor (see `DESIGN.md`).

mod blake2f;
mod bn128;
mod ecrecover;
mod hash;
mod identity;
mod modexp;
mod point_evaluation;

use crate::constants::precompile_addresses as addr;
use crate::errors::VMError;
use crate::types::Address;
use bytes::Bytes;

fn precompile_number(address: Address) -> Option<u8> {
    let bytes = address.as_bytes();
    if bytes[..19].iter().any(|b| *b != 0) {
        return None;
    }
    let last = bytes[19];
    (1..=10).contains(&last).then_some(last)
}

/// Runs the precompile at `address` against `input`, if one lives there.
pub fn try_execute(address: Address, input: &[u8]) -> Option<Result<Bytes, VMError>> {
    let number = precompile_number(address)?;
    let result = match number {
        n if n == addr::ECRECOVER => ecrecover::run(input),
        n if n == addr::SHA256 => Ok(hash::sha256(input)),
        n if n == addr::RIPEMD160 => Ok(hash::ripemd160(input)),
        n if n == addr::IDENTITY => Ok(identity::run(input)),
        n if n == addr::MODEXP => modexp::run(input),
        n if n == addr::EC_ADD => bn128::ec_add(input),
        n if n == addr::EC_MUL => bn128::ec_mul(input),
        n if n == addr::EC_PAIRING => bn128::ec_pairing(input),
        n if n == addr::BLAKE2F => blake2f::run(input),
        n if n == addr::POINT_EVALUATION => point_evaluation::run(input),
        _ => unreachable!("precompile_number only returns 1..=10"),
    };
    Some(result)
}

pub fn is_precompile(address: Address) -> bool {
    precompile_number(address).is_some()
}
