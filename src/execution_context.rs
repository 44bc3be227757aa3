//! Block-level context visible to opcodes (COINBASE, TIMESTAMP, ...).

use crate::types::{Address, Hash32, Word};

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub coinbase: Address,
    pub timestamp: u64,
    pub block_number: u64,
    /// Aliases PREVRANDAO post-merge.
    pub difficulty: Word,
    pub mix_hash: Hash32,
    pub gas_limit: u64,
    pub chain_id: u64,
    pub base_fee_per_gas: Word,
    pub excess_blob_gas: u64,
}

impl ExecutionContext {
    pub fn genesis(chain_id: u64) -> Self {
        Self {
            coinbase: Address::zero(),
            timestamp: 0,
            block_number: 0,
            difficulty: Word::zero(),
            mix_hash: Hash32::zero(),
            gas_limit: 30_000_000,
            chain_id,
            base_fee_per_gas: Word::zero(),
            excess_blob_gas: 0,
        }
    }
}
