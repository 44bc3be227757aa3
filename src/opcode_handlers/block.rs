//! Block-context opcodes (11): BLOCKHASH, COINBASE, TIMESTAMP, NUMBER,
//! DIFFICULTY, GASLIMIT, CHAINID, SELFBALANCE, BASEFEE, BLOBHASH,
//! BLOBBASEFEE.

use crate::computation::Computation;
use crate::constants::{BLOB_BASE_FEE_UPDATE_FRACTION, MIN_BLOB_BASE_FEE};
use crate::errors::{OpcodeResult, VMError};
use crate::state::State;
use crate::transaction_context::TransactionContext;
use crate::types::Word;
use crate::validation::validate_uint64;
use ethereum_types::U256;

pub fn op_blockhash(frame: &mut Computation, state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let block_number = frame.stack.pop1()?;
    let n = validate_uint64(block_number).unwrap_or(u64::MAX);
    let hash = state.get_ancestor_hash(n);
    match hash {
        Some(h) => frame.stack.push(Word::from_big_endian(h.as_bytes()))?,
        None => frame.stack.push_zero()?,
    }
    Ok(OpcodeResult::Continue)
}

pub fn op_coinbase(frame: &mut Computation, state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    frame.stack.push(Word::from_big_endian(state.context.coinbase.as_bytes()))?;
    Ok(OpcodeResult::Continue)
}

pub fn op_timestamp(frame: &mut Computation, state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    frame.stack.push(Word::from(state.context.timestamp))?;
    Ok(OpcodeResult::Continue)
}

pub fn op_number(frame: &mut Computation, state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    frame.stack.push(Word::from(state.context.block_number))?;
    Ok(OpcodeResult::Continue)
}

/// Aliases PREVRANDAO post-merge.
pub fn op_difficulty(frame: &mut Computation, state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    frame.stack.push(state.context.difficulty)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_gaslimit(frame: &mut Computation, state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    frame.stack.push(Word::from(state.context.gas_limit))?;
    Ok(OpcodeResult::Continue)
}

pub fn op_chainid(frame: &mut Computation, state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    frame.stack.push(Word::from(state.context.chain_id))?;
    Ok(OpcodeResult::Continue)
}

pub fn op_selfbalance(frame: &mut Computation, state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let balance = state.get_balance(frame.message.storage_address)?;
    frame.stack.push(balance)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_basefee(frame: &mut Computation, state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    frame.stack.push(state.context.base_fee_per_gas)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_blobhash(frame: &mut Computation, _state: &mut State, tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let index = frame.stack.pop1()?;
    let hash = usize::try_from(index)
        .ok()
        .and_then(|i| tx_ctx.blob_versioned_hashes.get(i))
        .map(|h| Word::from_big_endian(h.as_bytes()))
        .unwrap_or_default();
    frame.stack.push(hash)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_blobbasefee(frame: &mut Computation, state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let fee = fake_exponential(
        U256::from(MIN_BLOB_BASE_FEE),
        U256::from(state.context.excess_blob_gas),
        U256::from(BLOB_BASE_FEE_UPDATE_FRACTION),
    );
    frame.stack.push(fee)?;
    Ok(OpcodeResult::Continue)
}

/// EIP-4844's `fake_exponential(factor, numerator, denominator)`: an
/// integer approximation of `factor * e^(numerator / denominator)`.
fn fake_exponential(factor: U256, numerator: U256, denominator: U256) -> U256 {
    let mut i = U256::one();
    let mut output = U256::zero();
    let mut accum = factor.saturating_mul(denominator);
    while !accum.is_zero() {
        output = output.saturating_add(accum);
        accum = accum
            .saturating_mul(numerator)
            .checked_div(denominator.saturating_mul(i))
            .unwrap_or_default();
        i = i.saturating_add(U256::one());
    }
    output.checked_div(denominator).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_exponential_with_zero_excess_is_the_minimum_fee() {
        let result = fake_exponential(U256::from(1u64), U256::zero(), U256::from(3_338_477u64));
        assert_eq!(result, U256::from(1u64));
    }
}
