//! 0x05 -- MODEXP (EIP-198).
//!
//! Real arbitrary-precision modular exponentiation via `malachite`'s
//! `Natural`, not capped to `U256`/`U512` -- RSA-sized operands (e.g. a
//! 256-byte RSA-2048 modulus) are exact, not silently zeroed out.

use crate::errors::VMError;
use bytes::Bytes;
use ethereum_types::U256;
use malachite::Natural;
use malachite::base::num::arithmetic::traits::ModPow;
use malachite::base::num::basic::traits::{One, Zero};
use malachite::base::num::conversion::traits::{FromStringBase, ToStringBase};

fn read_len(input: &[u8], offset: usize) -> usize {
    let mut buf = [0u8; 32];
    for (i, b) in buf.iter_mut().enumerate() {
        *b = input.get(offset + i).copied().unwrap_or(0);
    }
    #[allow(clippy::as_conversions, reason = "EIP-198 lengths never realistically exceed usize::MAX")]
    {
        U256::from_big_endian(&buf).low_u64() as usize
    }
}

fn read_bytes(input: &[u8], offset: usize, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    for (i, b) in buf.iter_mut().enumerate() {
        *b = input.get(offset + i).copied().unwrap_or(0);
    }
    buf
}

fn bytes_to_natural(bytes: &[u8]) -> Natural {
    if bytes.is_empty() {
        return Natural::ZERO;
    }
    Natural::from_string_base(16, &hex::encode(bytes)).unwrap_or(Natural::ZERO)
}

/// Renders `n` as exactly `len` big-endian bytes, truncating any excess
/// high-order bytes -- `mod_len` bounds the output length per EIP-198.
fn natural_to_bytes(n: &Natural, len: usize) -> Vec<u8> {
    if *n == Natural::ZERO {
        return vec![0u8; len];
    }
    let mut hex = n.to_string_base(16);
    if hex.len() % 2 == 1 {
        hex.insert(0, '0');
    }
    let mut bytes = hex::decode(&hex).unwrap_or_default();
    match len.checked_sub(bytes.len()) {
        Some(pad) if pad > 0 => {
            let mut padded = vec![0u8; pad];
            padded.extend(bytes);
            bytes = padded;
        }
        Some(_) => {}
        None => {
            #[allow(clippy::indexing_slicing, reason = "bytes.len() > len was just checked")]
            {
                bytes = bytes[bytes.len() - len..].to_vec();
            }
        }
    }
    bytes
}

/// `base^exponent mod modulus`, with EIP-198's degenerate moduli (0 and 1)
/// both defined to yield 0.
fn modpow(base: Natural, exponent: Natural, modulus: Natural) -> Natural {
    if modulus <= Natural::ONE {
        return Natural::ZERO;
    }
    let base = base % &modulus;
    base.mod_pow(exponent, modulus)
}

pub fn run(input: &[u8]) -> Result<Bytes, VMError> {
    let base_len = read_len(input, 0);
    let exp_len = read_len(input, 32);
    let mod_len = read_len(input, 64);

    if mod_len == 0 {
        return Ok(Bytes::new());
    }

    let base_offset = 96;
    let exp_offset = base_offset + base_len;
    let mod_offset = exp_offset + exp_len;

    let base = bytes_to_natural(&read_bytes(input, base_offset, base_len));
    let exponent = bytes_to_natural(&read_bytes(input, exp_offset, exp_len));
    let modulus = bytes_to_natural(&read_bytes(input, mod_offset, mod_len));

    let result = modpow(base, exponent, modulus);
    Ok(Bytes::from(natural_to_bytes(&result, mod_len)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_pow_two_mod_five_is_four() {
        let mut input = vec![0u8; 96];
        input[31] = 1; // base_len
        input[63] = 1; // exp_len
        input[95] = 1; // mod_len
        input.push(3); // base
        input.push(2); // exponent
        input.push(5); // modulus
        let out = run(&input).unwrap();
        assert_eq!(out.as_ref(), &[4]);
    }

    #[test]
    fn zero_exponent_yields_one_mod_anything_greater_than_one() {
        let mut input = vec![0u8; 96];
        input[31] = 1; // base_len
        input[63] = 0; // exp_len
        input[95] = 1; // mod_len
        input.push(7); // base
        input.push(5); // modulus
        let out = run(&input).unwrap();
        assert_eq!(out.as_ref(), &[1]);
    }

    #[test]
    fn modulus_of_one_is_always_zero() {
        let mut input = vec![0u8; 96];
        input[31] = 1;
        input[63] = 1;
        input[95] = 1;
        input.push(9);
        input.push(9);
        input.push(1);
        let out = run(&input).unwrap();
        assert_eq!(out.as_ref(), &[0]);
    }

    #[test]
    fn operands_wider_than_32_bytes_are_not_truncated() {
        // A 40-byte base and modulus -- too wide for U256 -- still produce
        // an exact result rather than the all-zero output a U256/U512-only
        // implementation would be forced to return.
        let base_len = 40;
        let mod_len = 40;
        let exp_len = 1;
        let mut input = vec![0u8; 96];
        input[31] = base_len as u8;
        input[63] = exp_len as u8;
        input[95] = mod_len as u8;

        let mut base = vec![0u8; base_len];
        base[base_len - 1] = 6;
        let exponent = vec![2u8];
        let mut modulus = vec![0u8; mod_len];
        modulus[mod_len - 1] = 0;
        modulus[mod_len - 2] = 1; // 256, so base^2 mod 256 = 36

        input.extend(base);
        input.extend(exponent);
        input.extend(modulus);

        let out = run(&input).unwrap();
        assert_eq!(out.len(), mod_len);
        assert_eq!(out[mod_len - 1], 36);
        assert!(out[..mod_len - 1].iter().all(|b| *b == 0));
    }
}
