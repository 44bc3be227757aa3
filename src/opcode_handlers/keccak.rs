//! KECCAK256 (1 opcode).

use crate::computation::Computation;
use crate::errors::{OpcodeResult, VMError};
use crate::state::State;
use crate::transaction_context::TransactionContext;
use crate::types::{keccak, Word};
use crate::validation::u256_to_usize;

pub fn op_keccak256(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [offset, size] = *frame.stack.pop()?;
    let offset = u256_to_usize(offset).unwrap_or(usize::MAX);
    let size = u256_to_usize(size).unwrap_or(usize::MAX);
    frame.memory.extend(offset, size)?;
    let data = frame.memory.load_range(offset, size)?;
    let hash = keccak(data);
    frame.stack.push(Word::from_big_endian(hash.as_bytes()))?;
    Ok(OpcodeResult::Continue)
}
