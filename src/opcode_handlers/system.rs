//! System opcodes (10): CREATE, CALL, CALLCODE, RETURN, DELEGATECALL,
//! CREATE2, STATICCALL, REVERT, INVALID, SELFDESTRUCT.

use crate::computation::{ChildOutcome, Computation};
use crate::constants::{CALL_GAS_RETENTION_DENOMINATOR, CALL_GAS_RETENTION_NUMERATOR, MAX_CALL_DEPTH};
use crate::errors::{require_not_static, ExceptionalHalt, OpcodeResult, VMError};
use crate::message::Message;
use crate::state::State;
use crate::transaction_context::TransactionContext;
use crate::types::{keccak, Address, Word};
use crate::validation::{u256_to_usize, validate_canonical_address, validate_uint64};
use bytes::Bytes;

pub fn op_create(frame: &mut Computation, state: &mut State, tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [value, mem_offset, mem_len] = *frame.stack.pop()?;
    create_common(frame, state, tx_ctx, value, mem_offset, mem_len, None)
}

pub fn op_create2(frame: &mut Computation, state: &mut State, tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [value, mem_offset, mem_len, salt] = *frame.stack.pop()?;
    create_common(frame, state, tx_ctx, value, mem_offset, mem_len, Some(salt))
}

fn create_common(
    frame: &mut Computation,
    state: &mut State,
    tx_ctx: &TransactionContext,
    value: Word,
    mem_offset: Word,
    mem_len: Word,
    salt: Option<Word>,
) -> Result<OpcodeResult, VMError> {
    require_not_static(frame.message.is_static)?;

    let offset = u256_to_usize(mem_offset).unwrap_or(usize::MAX);
    let len = u256_to_usize(mem_len).unwrap_or(usize::MAX);
    frame.memory.extend(offset, len)?;
    let init_code = Bytes::copy_from_slice(frame.memory.load_range(offset, len)?);

    if frame.message.depth >= MAX_CALL_DEPTH {
        frame.stack.push_zero()?;
        return Ok(OpcodeResult::Continue);
    }

    let sender = frame.message.storage_address;
    let sender_nonce = state.get_nonce(sender)?;
    let new_address = match salt {
        None => create_address(sender, sender_nonce),
        Some(salt) => create2_address(sender, salt, &init_code),
    };
    state.increment_nonce(sender)?;

    let new_account = state.get_account(new_address)?;
    if new_account.has_code() || new_account.nonce != 0 {
        frame.stack.push_zero()?;
        return Ok(OpcodeResult::Continue);
    }

    if !value.is_zero() && state.get_balance(sender)? < value {
        frame.stack.push_zero()?;
        return Ok(OpcodeResult::Continue);
    }

    // Recorded before running init code, not after, so a constructor that
    // SELFDESTRUCTs itself still sees its own address as same-transaction.
    tx_ctx.record_contract_created(new_address);

    let outer = state.snapshot()?;
    if !value.is_zero() {
        transfer_value(state, sender, new_address, value)?;
    }

    let child_msg = Message {
        gas: all_but_one_64th(frame.message.gas),
        to: None,
        sender,
        value,
        data: Bytes::new(),
        code: init_code,
        code_address: new_address,
        storage_address: new_address,
        create_address: Some(new_address),
        depth: frame.message.depth + 1,
        is_static: false,
        should_transfer_value: !value.is_zero(),
    };

    let outcome = frame.apply_child_computation(state, tx_ctx, child_msg);
    if outcome.is_error {
        state.revert(outer)?;
        frame.stack.push_zero()?;
    } else {
        state.commit(outer)?;
        frame.stack.push(Word::from_big_endian(new_address.as_bytes()))?;
    }
    Ok(OpcodeResult::Continue)
}

/// `keccak(rlp([sender, sender_nonce]))[12:]`, the legacy CREATE scheme.
pub(crate) fn create_address(sender: Address, sender_nonce: u64) -> Address {
    let mut stream = rlp::RlpStream::new_list(2);
    stream.append(&sender.as_bytes());
    stream.append(&sender_nonce);
    let hash = keccak(&stream.out());
    Address::from_slice(&hash.as_bytes()[12..])
}

/// `keccak(0xff ++ sender ++ salt ++ keccak(init_code))[12:]`.
fn create2_address(sender: Address, salt: Word, init_code: &[u8]) -> Address {
    let salt_bytes = salt.to_big_endian();
    let mut buf = Vec::with_capacity(1 + 20 + 32 + 32);
    buf.push(0xffu8);
    buf.extend_from_slice(sender.as_bytes());
    buf.extend_from_slice(&salt_bytes);
    buf.extend_from_slice(keccak(init_code).as_bytes());
    let hash = keccak(&buf);
    Address::from_slice(&hash.as_bytes()[12..])
}

/// EIP-150: at most `floor(available * 63 / 64)` of the current frame's
/// nominal gas may leave with a child call.
fn all_but_one_64th(available: u64) -> u64 {
    let capped = u128::from(available) * u128::from(CALL_GAS_RETENTION_NUMERATOR) / u128::from(CALL_GAS_RETENTION_DENOMINATOR);
    u64::try_from(capped).unwrap_or(available)
}

/// As `all_but_one_64th`, further capped by whatever the bytecode explicitly
/// requested on the stack (CALL/CALLCODE/DELEGATECALL/STATICCALL all take a
/// `gas` operand; CREATE/CREATE2 do not and always forward the full cap).
fn forwarded_gas(available: u64, requested: Word) -> u64 {
    let requested = validate_uint64(requested).unwrap_or(u64::MAX);
    requested.min(all_but_one_64th(available))
}

pub(crate) fn transfer_value(state: &mut State, from: Address, to: Address, value: Word) -> Result<(), VMError> {
    let from_balance = state.get_balance(from)?;
    state.set_balance(from, from_balance - value)?;
    let to_balance = state.get_balance(to)?;
    state.set_balance(to, to_balance + value)?;
    Ok(())
}

fn addr_bytes(word: Word) -> [u8; 20] {
    let full = word.to_big_endian();
    let mut out = [0u8; 20];
    #[allow(clippy::indexing_slicing, reason = "full is exactly 32 bytes")]
    out.copy_from_slice(&full[12..32]);
    out
}

/// Which addressing/value/staticness rule a CALL-family opcode follows; see
/// the four bullet points under "CALL / CALLCODE / DELEGATECALL / STATICCALL"
/// for the exact sender/to/value/static derivation each variant uses.
#[derive(Clone, Copy)]
enum CallKind {
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
}

pub fn op_call(frame: &mut Computation, state: &mut State, tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    call_common(frame, state, tx_ctx, CallKind::Call)
}

pub fn op_callcode(frame: &mut Computation, state: &mut State, tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    call_common(frame, state, tx_ctx, CallKind::CallCode)
}

pub fn op_delegatecall(frame: &mut Computation, state: &mut State, tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    call_common(frame, state, tx_ctx, CallKind::DelegateCall)
}

pub fn op_staticcall(frame: &mut Computation, state: &mut State, tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    call_common(frame, state, tx_ctx, CallKind::StaticCall)
}

fn call_common(frame: &mut Computation, state: &mut State, tx_ctx: &TransactionContext, kind: CallKind) -> Result<OpcodeResult, VMError> {
    let has_value_operand = matches!(kind, CallKind::Call | CallKind::CallCode);

    let (gas, popped_address, value, mem_in_off, mem_in_len, mem_out_off, mem_out_len) = if has_value_operand {
        let [gas, to, value, in_off, in_len, out_off, out_len] = *frame.stack.pop()?;
        (gas, to, value, in_off, in_len, out_off, out_len)
    } else {
        let [gas, to, in_off, in_len, out_off, out_len] = *frame.stack.pop()?;
        (gas, to, Word::zero(), in_off, in_len, out_off, out_len)
    };

    if matches!(kind, CallKind::Call) && !value.is_zero() {
        require_not_static(frame.message.is_static)?;
    }

    let popped_address = validate_canonical_address(&addr_bytes(popped_address))?;
    let mem_in_off = u256_to_usize(mem_in_off).unwrap_or(usize::MAX);
    let mem_in_len = u256_to_usize(mem_in_len).unwrap_or(usize::MAX);
    let mem_out_off = u256_to_usize(mem_out_off).unwrap_or(usize::MAX);
    let mem_out_len = u256_to_usize(mem_out_len).unwrap_or(usize::MAX);

    frame.memory.extend(mem_in_off, mem_in_len)?;
    let call_data = Bytes::copy_from_slice(frame.memory.load_range(mem_in_off, mem_in_len)?);
    frame.memory.extend(mem_out_off, mem_out_len)?;

    let (to, code_address, sender, value, is_static, should_transfer_value) = match kind {
        CallKind::Call => (
            popped_address,
            popped_address,
            frame.message.storage_address,
            value,
            frame.message.is_static,
            !value.is_zero(),
        ),
        CallKind::CallCode => (
            frame.message.storage_address,
            popped_address,
            frame.message.storage_address,
            value,
            frame.message.is_static,
            !value.is_zero(),
        ),
        CallKind::DelegateCall => (
            frame.message.storage_address,
            popped_address,
            frame.message.sender,
            frame.message.value,
            frame.message.is_static,
            false,
        ),
        CallKind::StaticCall => (
            popped_address,
            popped_address,
            frame.message.storage_address,
            Word::zero(),
            true,
            false,
        ),
    };

    if frame.message.depth >= MAX_CALL_DEPTH {
        frame.stack.push_zero()?;
        return Ok(OpcodeResult::Continue);
    }
    if should_transfer_value && state.get_balance(frame.message.storage_address)? < value {
        frame.stack.push_zero()?;
        return Ok(OpcodeResult::Continue);
    }

    let outer = state.snapshot()?;
    if should_transfer_value {
        transfer_value(state, frame.message.storage_address, to, value)?;
    }

    let child_msg = Message {
        gas: forwarded_gas(frame.message.gas, gas),
        to: Some(to),
        sender,
        value,
        data: call_data,
        code: state.get_code(code_address)?,
        code_address,
        storage_address: to,
        create_address: None,
        depth: frame.message.depth + 1,
        is_static,
        should_transfer_value,
    };

    let outcome: ChildOutcome = frame.apply_child_computation(state, tx_ctx, child_msg);
    if outcome.is_error {
        state.revert(outer)?;
        frame.stack.push_zero()?;
    } else {
        state.commit(outer)?;
        frame.stack.push(Word::from(1u8))?;
    }

    let copy_len = outcome.output.len().min(mem_out_len);
    #[allow(clippy::indexing_slicing, reason = "copy_len is clamped to output.len()")]
    frame.memory.store(mem_out_off, &outcome.output[..copy_len])?;

    Ok(OpcodeResult::Continue)
}

pub fn op_return(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [offset, size] = *frame.stack.pop()?;
    let offset = u256_to_usize(offset).unwrap_or(usize::MAX);
    let size = u256_to_usize(size).unwrap_or(usize::MAX);
    frame.memory.extend(offset, size)?;
    frame.output = Bytes::copy_from_slice(frame.memory.load_range(offset, size)?);
    Ok(OpcodeResult::Halt)
}

pub fn op_revert(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [offset, size] = *frame.stack.pop()?;
    let offset = u256_to_usize(offset).unwrap_or(usize::MAX);
    let size = u256_to_usize(size).unwrap_or(usize::MAX);
    frame.memory.extend(offset, size)?;
    frame.output = Bytes::copy_from_slice(frame.memory.load_range(offset, size)?);
    Ok(OpcodeResult::Error {
        error: ExceptionalHalt::Revert.into(),
    })
}

pub fn op_invalid_opcode(_frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    Err(ExceptionalHalt::InvalidInstruction { opcode: 0xfe }.into())
}

pub fn op_selfdestruct(frame: &mut Computation, state: &mut State, tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    require_not_static(frame.message.is_static)?;
    let beneficiary = validate_canonical_address(&addr_bytes(frame.stack.pop1()?))?;

    let contract = frame.message.storage_address;
    let balance = state.get_balance(contract)?;
    state.set_balance(contract, Word::zero())?;
    let beneficiary_balance = state.get_balance(beneficiary)?;
    state.set_balance(beneficiary, beneficiary_balance + balance)?;

    if tx_ctx.was_created_in_this_transaction(contract) {
        frame.accounts_to_delete.push(contract);
    }
    frame.beneficiaries.push(beneficiary);

    Ok(OpcodeResult::Halt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_store::InMemoryDatabase;
    use crate::execution_context::ExecutionContext;
    use crate::types::Account;

    fn blank_frame(storage_address: Address) -> Computation {
        let message = Message {
            gas: 1_000_000,
            to: Some(storage_address),
            sender: Address::zero(),
            value: Word::zero(),
            data: Bytes::new(),
            code: Bytes::new(),
            code_address: storage_address,
            storage_address,
            create_address: None,
            depth: 0,
            is_static: false,
            should_transfer_value: false,
        };
        Computation::new_for_test(message)
    }

    #[test]
    fn create_from_empty_account_with_empty_init_code_derives_the_expected_address() {
        let mut db = InMemoryDatabase::new();
        let oracle = crate::oracle::NullOracle;
        let mut state = State::new(&mut db, &oracle, ExecutionContext::genesis(1));
        let sender = Address::from_slice(&hex::decode("9bbfed6889322e016e0a02ee459d306fc19545d8").unwrap());
        state.set_balance(sender, Word::from(10)).unwrap();
        let tx_ctx = TransactionContext::new(Word::zero(), sender);
        let mut frame = blank_frame(sender);

        frame.stack.push(Word::zero()).unwrap();
        frame.stack.push(Word::zero()).unwrap();
        frame.stack.push(Word::zero()).unwrap();
        op_create(&mut frame, &mut state, &tx_ctx).unwrap();

        let expected = Address::from_slice(&hex::decode("43a61f3f4c73ea0d444c5c1c1a8544067a86219b").unwrap());
        assert_eq!(frame.stack.peek(), Some(Word::from_big_endian(expected.as_bytes())));
        assert_eq!(state.get_nonce(sender).unwrap(), 1);
    }

    #[test]
    fn selfdestruct_transfers_balance_and_zeroes_the_source() {
        let mut db = InMemoryDatabase::new();
        let oracle = crate::oracle::NullOracle;
        let mut state = State::new(&mut db, &oracle, ExecutionContext::genesis(1));
        let contract = Address::repeat_byte(0x11);
        let beneficiary = Address::repeat_byte(0x22);
        state.set_account(contract, Account { nonce: 1, ..Account::empty() });
        state.set_balance(contract, Word::from(100)).unwrap();
        let tx_ctx = TransactionContext::new(Word::zero(), Address::zero());
        tx_ctx.record_contract_created(contract);
        let mut frame = blank_frame(contract);
        frame.stack.push(Word::from_big_endian(beneficiary.as_bytes())).unwrap();

        op_selfdestruct(&mut frame, &mut state, &tx_ctx).unwrap();

        assert_eq!(state.get_balance(contract).unwrap(), Word::zero());
        assert_eq!(state.get_balance(beneficiary).unwrap(), Word::from(100));
        assert_eq!(frame.accounts_to_delete, vec![contract]);
        assert_eq!(frame.beneficiaries, vec![beneficiary]);
    }

    #[test]
    fn call_inside_staticcall_with_nonzero_value_is_write_protected() {
        let mut db = InMemoryDatabase::new();
        let oracle = crate::oracle::NullOracle;
        let mut state = State::new(&mut db, &oracle, ExecutionContext::genesis(1));
        let tx_ctx = TransactionContext::new(Word::zero(), Address::zero());
        let mut frame = blank_frame(Address::zero());
        frame.message.is_static = true;
        frame.stack.push(Word::zero()).unwrap(); // ret_size
        frame.stack.push(Word::zero()).unwrap(); // ret_offset
        frame.stack.push(Word::zero()).unwrap(); // args_size
        frame.stack.push(Word::zero()).unwrap(); // args_offset
        frame.stack.push(Word::from(1)).unwrap(); // value
        frame.stack.push(Word::from_big_endian(Address::repeat_byte(0x05).as_bytes())).unwrap(); // to
        frame.stack.push(Word::from(100_000)).unwrap(); // gas
        let err = op_call(&mut frame, &mut state, &tx_ctx).unwrap_err();
        assert!(matches!(err, VMError::ExceptionalHalt(ExceptionalHalt::WriteProtection)));
    }
}
