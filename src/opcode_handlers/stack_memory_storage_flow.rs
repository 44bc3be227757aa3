//! Stack/memory/storage/flow opcodes (15): STOP, POP, MLOAD, MSTORE,
//! MSTORE8, SLOAD, SSTORE, JUMP, JUMPI, PC, MSIZE, GAS, JUMPDEST, TLOAD,
//! TSTORE, MCOPY.

use crate::computation::Computation;
use crate::errors::{require_not_static, ExceptionalHalt, OpcodeResult, VMError};
use crate::state::State;
use crate::transaction_context::TransactionContext;
use crate::types::Word;
use crate::validation::u256_to_usize;

pub fn op_stop(_frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    Ok(OpcodeResult::Halt)
}

pub fn op_pop(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    frame.stack.pop1()?;
    Ok(OpcodeResult::Continue)
}

pub fn op_mload(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let offset = frame.stack.pop1()?;
    let offset = u256_to_usize(offset).ok_or(ExceptionalHalt::OutOfBounds)?;
    frame.memory.extend(offset, 32)?;
    let value = frame.memory.load_word(offset)?;
    frame.stack.push(value)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_mstore(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [offset, value] = *frame.stack.pop()?;
    let offset = u256_to_usize(offset).ok_or(ExceptionalHalt::OutOfBounds)?;
    frame.memory.extend(offset, 32)?;
    frame.memory.store_word(offset, value)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_mstore8(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [offset, value] = *frame.stack.pop()?;
    let offset = u256_to_usize(offset).ok_or(ExceptionalHalt::OutOfBounds)?;
    frame.memory.extend(offset, 1)?;
    #[allow(clippy::as_conversions, reason = "truncating to the low byte is the defined MSTORE8 semantics")]
    let byte = value.low_u32() as u8;
    frame.memory.store_byte(offset, byte)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_sload(frame: &mut Computation, state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let slot = frame.stack.pop1()?;
    let value = state.get_storage(frame.message.storage_address, slot)?;
    frame.stack.push(value)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_sstore(frame: &mut Computation, state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    require_not_static(frame.message.is_static)?;
    let [slot, value] = *frame.stack.pop()?;
    state.set_storage(frame.message.storage_address, slot, value)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_jump(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let destination = frame.stack.pop1()?;
    jump_to(frame, destination)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_jumpi(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [destination, condition] = *frame.stack.pop()?;
    if !condition.is_zero() {
        jump_to(frame, destination)?;
    }
    Ok(OpcodeResult::Continue)
}

fn jump_to(frame: &mut Computation, destination: Word) -> Result<(), VMError> {
    let pos = u256_to_usize(destination).filter(|p| frame.code_stream.is_valid_jump_destination(*p));
    match pos {
        Some(pos) => {
            frame.code_stream.pc = pos;
            Ok(())
        }
        None => Err(ExceptionalHalt::InvalidJumpDestination { destination }.into()),
    }
}

/// Returns the PC of the instruction itself, i.e. one less than the
/// already-advanced PC the dispatch loop is currently holding.
pub fn op_pc(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let pc = frame.code_stream.pc.saturating_sub(1);
    frame.stack.push(Word::from(pc))?;
    Ok(OpcodeResult::Continue)
}

pub fn op_msize(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    frame.stack.push(Word::from(frame.memory.len()))?;
    Ok(OpcodeResult::Continue)
}

/// Nominal remaining gas: `msg.gas` verbatim, since this core stubs out
/// global gas metering (see `DESIGN.md`).
pub fn op_gas(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    frame.stack.push(Word::from(frame.message.gas))?;
    Ok(OpcodeResult::Continue)
}

pub fn op_jumpdest(_frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    Ok(OpcodeResult::Continue)
}

pub fn op_tload(frame: &mut Computation, state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let slot = frame.stack.pop1()?;
    let value = state.get_transient(frame.message.storage_address, slot);
    frame.stack.push(value)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_tstore(frame: &mut Computation, state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    require_not_static(frame.message.is_static)?;
    let [slot, value] = *frame.stack.pop()?;
    state.set_transient(frame.message.storage_address, slot, value);
    Ok(OpcodeResult::Continue)
}

pub fn op_mcopy(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [dest, src, len] = *frame.stack.pop()?;
    let dest = u256_to_usize(dest).ok_or(ExceptionalHalt::OutOfBounds)?;
    let src = u256_to_usize(src).ok_or(ExceptionalHalt::OutOfBounds)?;
    let len = u256_to_usize(len).ok_or(ExceptionalHalt::OutOfBounds)?;
    frame.memory.extend(dest, len)?;
    frame.memory.extend(src, len)?;
    frame.memory.copy_within(dest, src, len)?;
    Ok(OpcodeResult::Continue)
}
