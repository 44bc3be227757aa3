//! Environment opcodes (16): ADDRESS, BALANCE, ORIGIN, CALLER, CALLVALUE,
//! CALLDATALOAD, CALLDATASIZE, CALLDATACOPY, CODESIZE, CODECOPY, GASPRICE,
//! EXTCODESIZE, EXTCODECOPY, RETURNDATASIZE, RETURNDATACOPY, EXTCODEHASH.

use crate::computation::Computation;
use crate::errors::{ExceptionalHalt, OpcodeResult, VMError};
use crate::state::State;
use crate::transaction_context::TransactionContext;
use crate::types::{keccak, Word};
use crate::validation::{u256_to_usize, validate_canonical_address};

pub fn op_address(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let address = frame.message.storage_address;
    frame.stack.push(Word::from_big_endian(address.as_bytes()))?;
    Ok(OpcodeResult::Continue)
}

pub fn op_balance(frame: &mut Computation, state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let raw = frame.stack.pop1()?;
    let address = validate_canonical_address(&addr_bytes(raw))?;
    let balance = state.get_balance(address)?;
    frame.stack.push(balance)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_origin(frame: &mut Computation, _state: &mut State, tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    frame.stack.push(Word::from_big_endian(tx_ctx.origin.as_bytes()))?;
    Ok(OpcodeResult::Continue)
}

pub fn op_caller(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let sender = frame.message.sender;
    frame.stack.push(Word::from_big_endian(sender.as_bytes()))?;
    Ok(OpcodeResult::Continue)
}

pub fn op_callvalue(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let value = frame.message.value;
    frame.stack.push(value)?;
    Ok(OpcodeResult::Continue)
}

/// 32-byte load from calldata, zero-padded past the end.
pub fn op_calldataload(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let offset = frame.stack.pop1()?;
    let offset = u256_to_usize(offset).unwrap_or(usize::MAX);
    let mut bytes = [0u8; 32];
    if offset < frame.message.data.len() {
        let available = (frame.message.data.len() - offset).min(32);
        #[allow(clippy::indexing_slicing, reason = "offset < len and available is clamped")]
        bytes[..available].copy_from_slice(&frame.message.data[offset..offset + available]);
    }
    frame.stack.push(Word::from_big_endian(&bytes))?;
    Ok(OpcodeResult::Continue)
}

pub fn op_calldatasize(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    frame.stack.push(Word::from(frame.message.data.len()))?;
    Ok(OpcodeResult::Continue)
}

pub fn op_calldatacopy(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [dest_offset, offset, size] = *frame.stack.pop()?;
    let dest_offset = u256_to_usize(dest_offset).unwrap_or(usize::MAX);
    let offset = u256_to_usize(offset).unwrap_or(usize::MAX);
    let size = u256_to_usize(size).unwrap_or(usize::MAX);
    let data = zero_padded_slice(&frame.message.data, offset, size);
    frame.memory.extend(dest_offset, size)?;
    frame.memory.store(dest_offset, &data)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_codesize(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    frame.stack.push(Word::from(frame.code_stream.len()))?;
    Ok(OpcodeResult::Continue)
}

pub fn op_codecopy(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [dest_offset, offset, size] = *frame.stack.pop()?;
    let dest_offset = u256_to_usize(dest_offset).unwrap_or(usize::MAX);
    let offset = u256_to_usize(offset).unwrap_or(usize::MAX);
    let size = u256_to_usize(size).unwrap_or(usize::MAX);
    let data = zero_padded_slice(&frame.code_stream.code, offset, size);
    frame.memory.extend(dest_offset, size)?;
    frame.memory.store(dest_offset, &data)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_gasprice(frame: &mut Computation, _state: &mut State, tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    frame.stack.push(tx_ctx.gas_price)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_extcodesize(frame: &mut Computation, state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let raw = frame.stack.pop1()?;
    let address = validate_canonical_address(&addr_bytes(raw))?;
    let code = state.get_code(address)?;
    frame.stack.push(Word::from(code.len()))?;
    Ok(OpcodeResult::Continue)
}

pub fn op_extcodecopy(frame: &mut Computation, state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [addr_word, dest_offset, offset, size] = *frame.stack.pop()?;
    let address = validate_canonical_address(&addr_bytes(addr_word))?;
    let dest_offset = u256_to_usize(dest_offset).unwrap_or(usize::MAX);
    let offset = u256_to_usize(offset).unwrap_or(usize::MAX);
    let size = u256_to_usize(size).unwrap_or(usize::MAX);
    let code = state.get_code(address)?;
    let data = zero_padded_slice(&code, offset, size);
    frame.memory.extend(dest_offset, size)?;
    frame.memory.store(dest_offset, &data)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_returndatasize(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    frame.stack.push(Word::from(frame.return_data.len()))?;
    Ok(OpcodeResult::Continue)
}

pub fn op_returndatacopy(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [dest_offset, offset, size] = *frame.stack.pop()?;
    let offset_usize = u256_to_usize(offset).ok_or(ExceptionalHalt::OutOfBounds)?;
    let size_usize = u256_to_usize(size).ok_or(ExceptionalHalt::OutOfBounds)?;
    let end = offset_usize.checked_add(size_usize).ok_or(ExceptionalHalt::OutOfBounds)?;
    if end > frame.return_data.len() {
        return Err(ExceptionalHalt::OutOfBounds.into());
    }
    let dest_offset = u256_to_usize(dest_offset).unwrap_or(usize::MAX);
    #[allow(clippy::indexing_slicing, reason = "end <= return_data.len() just checked above")]
    let data = frame.return_data[offset_usize..end].to_vec();
    frame.memory.extend(dest_offset, size_usize)?;
    frame.memory.store(dest_offset, &data)?;
    Ok(OpcodeResult::Continue)
}

/// 0 for a non-existent account, `keccak(EMPTY)` for an account with no
/// code, `keccak(code)` otherwise.
pub fn op_extcodehash(frame: &mut Computation, state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let raw = frame.stack.pop1()?;
    let address = validate_canonical_address(&addr_bytes(raw))?;
    let account = state.get_account(address)?;
    if account.is_empty() && !account.has_code() {
        frame.stack.push_zero()?;
        return Ok(OpcodeResult::Continue);
    }
    let code = state.get_code(address)?;
    let hash = keccak(&code);
    frame.stack.push(Word::from_big_endian(hash.as_bytes()))?;
    Ok(OpcodeResult::Continue)
}

fn addr_bytes(word: Word) -> [u8; 20] {
    let full = word.to_big_endian();
    let mut out = [0u8; 20];
    #[allow(clippy::indexing_slicing, reason = "full is exactly 32 bytes")]
    out.copy_from_slice(&full[12..32]);
    out
}

fn zero_padded_slice(source: &[u8], offset: usize, size: usize) -> Vec<u8> {
    let mut out = vec![0u8; size];
    if offset >= source.len() {
        return out;
    }
    let available = (source.len() - offset).min(size);
    #[allow(clippy::indexing_slicing, reason = "available is clamped to both lengths")]
    out[..available].copy_from_slice(&source[offset..offset + available]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_store::InMemoryDatabase;
    use crate::execution_context::ExecutionContext;
    use crate::message::Message;
    use crate::oracle::NullOracle;
    use crate::types::{Account, Address};
    use bytes::Bytes;

    fn blank_frame(code_address: Address) -> Computation {
        let message = Message {
            gas: 1_000_000,
            to: Some(code_address),
            sender: Address::zero(),
            value: Word::zero(),
            data: Bytes::new(),
            code: Bytes::new(),
            code_address,
            storage_address: code_address,
            create_address: None,
            depth: 0,
            is_static: false,
            should_transfer_value: false,
        };
        Computation::new_for_test(message)
    }

    #[test]
    fn extcodehash_of_nonexistent_account_is_zero() {
        let mut db = InMemoryDatabase::new();
        let oracle = NullOracle;
        let mut state = State::new(&mut db, &oracle, ExecutionContext::genesis(1));
        let tx_ctx = TransactionContext::new(Word::zero(), Address::zero());
        let target = Address::repeat_byte(0xab);
        let mut frame = blank_frame(Address::zero());
        frame.stack.push(Word::from_big_endian(target.as_bytes())).unwrap();
        op_extcodehash(&mut frame, &mut state, &tx_ctx).unwrap();
        assert_eq!(frame.stack.peek(), Some(Word::zero()));
    }

    #[test]
    fn extcodehash_of_account_with_code_matches_keccak_of_code() {
        let mut db = InMemoryDatabase::new();
        let oracle = NullOracle;
        let mut state = State::new(&mut db, &oracle, ExecutionContext::genesis(1));
        let tx_ctx = TransactionContext::new(Word::zero(), Address::zero());
        let target = Address::repeat_byte(0xcd);
        state.set_account(target, Account::empty());
        state.set_code(target, Bytes::from_static(b"pseudocode")).unwrap();
        let mut frame = blank_frame(Address::zero());
        frame.stack.push(Word::from_big_endian(target.as_bytes())).unwrap();
        op_extcodehash(&mut frame, &mut state, &tx_ctx).unwrap();
        assert_eq!(frame.stack.peek(), Some(Word::from_big_endian(keccak(b"pseudocode").as_bytes())));
    }

    #[test]
    fn calldataload_zero_pads_past_the_end() {
        let mut db = InMemoryDatabase::new();
        let oracle = NullOracle;
        let mut state = State::new(&mut db, &oracle, ExecutionContext::genesis(1));
        let tx_ctx = TransactionContext::new(Word::zero(), Address::zero());
        let mut frame = blank_frame(Address::zero());
        frame.message.data = Bytes::from_static(&[0xff]);
        frame.stack.push(Word::zero()).unwrap();
        op_calldataload(&mut frame, &mut state, &tx_ctx).unwrap();
        let expected = Word::from(0xffu8) << 248;
        assert_eq!(frame.stack.peek(), Some(expected));
    }
}
