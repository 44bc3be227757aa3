//! 0x06 / 0x07 / 0x08 -- alt_bn128 ecAdd, ecMul, ecPairing (EIP-196/197).
//!
//! Real group arithmetic and pairing check over BN254 via `ark-bn254`.
//! Malformed or off-curve points are rejected at the input boundary, same
//! as every mainline implementation's precompile wrapper.

use crate::errors::VMError;
use ark_bn254::{Bn254, Fq, Fq2, Fr, G1Affine, G2Affine};
use ark_ec::pairing::Pairing;
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{BigInteger, One, PrimeField, Zero};
use bytes::Bytes;

fn field_from_be(bytes: &[u8]) -> Fq {
    Fq::from_be_bytes_mod_order(bytes)
}

fn read_chunk(input: &[u8], offset: usize, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    let end = (offset + len).min(input.len());
    if offset < end {
        let available = end - offset;
        out[..available].copy_from_slice(&input[offset..end]);
    }
    out
}

fn decode_g1(input: &[u8], offset: usize) -> Option<G1Affine> {
    let x = field_from_be(&read_chunk(input, offset, 32));
    let y = field_from_be(&read_chunk(input, offset + 32, 32));
    if x.is_zero() && y.is_zero() {
        return Some(G1Affine::zero());
    }
    let point = G1Affine::new_unchecked(x, y);
    (point.is_on_curve() && point.is_in_correct_subgroup_assuming_on_curve()).then_some(point)
}

fn decode_g2(input: &[u8], offset: usize) -> Option<G2Affine> {
    // EIP-197 orders each Fq2 coordinate as (c1, c0) -- imaginary part first.
    let x_c1 = field_from_be(&read_chunk(input, offset, 32));
    let x_c0 = field_from_be(&read_chunk(input, offset + 32, 32));
    let y_c1 = field_from_be(&read_chunk(input, offset + 64, 32));
    let y_c0 = field_from_be(&read_chunk(input, offset + 96, 32));
    let x = Fq2::new(x_c0, x_c1);
    let y = Fq2::new(y_c0, y_c1);
    if x.is_zero() && y.is_zero() {
        return Some(G2Affine::zero());
    }
    let point = G2Affine::new_unchecked(x, y);
    (point.is_on_curve() && point.is_in_correct_subgroup_assuming_on_curve()).then_some(point)
}

fn encode_g1(point: G1Affine) -> [u8; 64] {
    let mut out = [0u8; 64];
    if let Some((x, y)) = point.xy() {
        let x_bytes = x.into_bigint().to_bytes_be();
        let y_bytes = y.into_bigint().to_bytes_be();
        out[32 - x_bytes.len()..32].copy_from_slice(&x_bytes);
        out[64 - y_bytes.len()..64].copy_from_slice(&y_bytes);
    }
    out
}

pub fn ec_add(input: &[u8]) -> Result<Bytes, VMError> {
    let Some(p1) = decode_g1(input, 0) else {
        return Ok(Bytes::copy_from_slice(&[0u8; 64]));
    };
    let Some(p2) = decode_g1(input, 64) else {
        return Ok(Bytes::copy_from_slice(&[0u8; 64]));
    };
    let sum = (p1 + p2).into_affine();
    Ok(Bytes::copy_from_slice(&encode_g1(sum)))
}

pub fn ec_mul(input: &[u8]) -> Result<Bytes, VMError> {
    let Some(point) = decode_g1(input, 0) else {
        return Ok(Bytes::copy_from_slice(&[0u8; 64]));
    };
    let scalar_bytes = read_chunk(input, 64, 32);
    let scalar = Fr::from_be_bytes_mod_order(&scalar_bytes);
    let product = (point * scalar).into_affine();
    Ok(Bytes::copy_from_slice(&encode_g1(product)))
}

pub fn ec_pairing(input: &[u8]) -> Result<Bytes, VMError> {
    if input.len() % 192 != 0 {
        return Ok(Bytes::copy_from_slice(&[0u8; 32]));
    }
    let mut pairs = Vec::new();
    for chunk_start in (0..input.len()).step_by(192) {
        let Some(g1) = decode_g1(input, chunk_start) else {
            return Ok(Bytes::copy_from_slice(&[0u8; 32]));
        };
        let Some(g2) = decode_g2(input, chunk_start + 64) else {
            return Ok(Bytes::copy_from_slice(&[0u8; 32]));
        };
        pairs.push((g1, g2));
    }
    let accepted = if pairs.is_empty() {
        true
    } else {
        let product = Bn254::multi_pairing(pairs.iter().map(|(g1, _)| *g1), pairs.iter().map(|(_, g2)| *g2));
        product.0.is_one()
    };
    let mut out = [0u8; 32];
    if accepted {
        out[31] = 1;
    }
    Ok(Bytes::copy_from_slice(&out))
}
