//! Crate-wide limits and protocol constants.

/// Maximum number of items on the EVM stack.
pub const STACK_LIMIT: usize = 1024;

/// Maximum call depth (CALL/CREATE nesting).
pub const MAX_CALL_DEPTH: usize = 1024;

/// Number of ancestor block hashes reachable via BLOCKHASH.
pub const BLOCK_HASH_WINDOW: u64 = 256;

/// EIP-150: fraction of remaining gas forwarded to a child call is capped
/// at floor(available * 63 / 64).
pub const CALL_GAS_RETENTION_NUMERATOR: u64 = 63;
pub const CALL_GAS_RETENTION_DENOMINATOR: u64 = 64;

/// EIP-4844 constants used by BLOBBASEFEE / BLOBHASH.
pub const MIN_BLOB_BASE_FEE: u64 = 1;
pub const BLOB_BASE_FEE_UPDATE_FRACTION: u64 = 3_338_477;
pub const FIELD_ELEMENTS_PER_BLOB: u64 = 4096;
pub const BLS_MODULUS: &str =
    "52435875175126190479447740508185965837690552500527637822603658699938581184513";

/// Version byte prefixing a valid EIP-4844 blob versioned hash.
pub const BLOB_COMMITMENT_VERSION_KZG: u8 = 0x01;

/// Fixed precompile addresses 0x01..=0x0a, as in Cancun.
pub mod precompile_addresses {
    pub const ECRECOVER: u8 = 0x01;
    pub const SHA256: u8 = 0x02;
    pub const RIPEMD160: u8 = 0x03;
    pub const IDENTITY: u8 = 0x04;
    pub const MODEXP: u8 = 0x05;
    pub const EC_ADD: u8 = 0x06;
    pub const EC_MUL: u8 = 0x07;
    pub const EC_PAIRING: u8 = 0x08;
    pub const BLAKE2F: u8 = 0x09;
    pub const POINT_EVALUATION: u8 = 0x0a;
}
