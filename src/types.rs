//! Core scalar types shared across the interpreter.
//!
//! `Address`, `Word` and `Hash32` are thin aliases over `ethereum-types`
//! rather than bespoke newtypes, matching how the rest of the ecosystem
//! passes these values around.

use ethereum_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

pub type Address = H160;
pub type Word = U256;
pub type Hash32 = H256;

lazy_static::lazy_static! {
    /// Keccak-256 of the empty byte string, the sentinel `code_hash` for
    /// accounts that hold no code.
    pub static ref EMPTY_HASH: Hash32 = keccak(&[]);
}

/// Keccak-256 digest of `data`.
pub fn keccak(data: &[u8]) -> Hash32 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    Hash32::from_slice(&hasher.finalize())
}

/// Immutable contract bytecode, addressed by `keccak(code)`.
pub type Code = bytes::Bytes;

/// On-disk account record: nonce, balance, storage root and code hash.
///
/// `storage_root` is carried for interface completeness (see
/// `DESIGN.md` on stub state roots) but is never derived from a real trie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Account {
    pub nonce: u64,
    pub balance: Word,
    pub storage_root: Hash32,
    pub code_hash: Hash32,
}

impl Account {
    /// A brand-new, never-touched account: zero nonce/balance, empty code.
    pub fn empty() -> Self {
        Self {
            nonce: 0,
            balance: Word::zero(),
            storage_root: Hash32::zero(),
            code_hash: *EMPTY_HASH,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance.is_zero() && self.code_hash == *EMPTY_HASH
    }

    pub fn has_code(&self) -> bool {
        self.code_hash != *EMPTY_HASH
    }
}

/// A single emitted log entry.
///
/// `sequence_number` is assigned once, at emission time, from the
/// transaction-global monotonic counter -- never recomputed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub sequence_number: u64,
    pub address: Address,
    pub topics: Vec<Word>,
    pub data: bytes::Bytes,
}

/// A byte-string-valued storage value, used for transient storage (EIP-1153)
/// and for `RETURNDATA`/output buffers that should not be reinterpreted as
/// a 256-bit integer.
pub type ByteString = bytes::Bytes;
