//! The ancestor-hash oracle: an abstract collaborator that resolves block
//! numbers to hashes for `BLOCKHASH`. No concrete networked implementation
//! ships here -- wiring one up to a real chain's RPC or trie is an
//! embedder's job, not this crate's.

use crate::errors::DatabaseError;
use crate::types::Hash32;

/// Looks up the hash of a canonical-chain block by number. Callers must
/// only query within the 256-block window preceding the current block;
/// this trait does not enforce that itself (see `State::get_ancestor_hash`).
pub trait BlockHashOracle {
    fn get_block_hash(&self, block_number: u64) -> Result<Option<Hash32>, DatabaseError>;
}

/// An oracle with nothing behind it -- every lookup misses. Useful as a
/// default when an embedder has no ancestor-hash source at hand.
pub struct NullOracle;

impl BlockHashOracle for NullOracle {
    fn get_block_hash(&self, _block_number: u64) -> Result<Option<Hash32>, DatabaseError> {
        Ok(None)
    }
}
