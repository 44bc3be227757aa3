//! DUP1..DUP16 and SWAP1..SWAP16.

use crate::computation::Computation;
use crate::errors::{OpcodeResult, VMError};
use crate::state::State;
use crate::transaction_context::TransactionContext;

pub fn op_dup<const N: usize>(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    frame.stack.dup(N)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_swap<const N: usize>(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    frame.stack.swap(N)?;
    Ok(OpcodeResult::Continue)
}
