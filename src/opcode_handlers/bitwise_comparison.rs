//! Comparison and bitwise opcodes (14): LT, GT, SLT, SGT, EQ, ISZERO, AND,
//! OR, XOR, NOT, BYTE, SHL, SHR, SAR.

use crate::computation::Computation;
use crate::errors::{OpcodeResult, VMError};
use crate::state::State;
use crate::transaction_context::TransactionContext;
use ethereum_types::U256;

fn u256_from_bool(b: bool) -> U256 {
    if b {
        U256::one()
    } else {
        U256::zero()
    }
}

pub fn op_lt(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [lho, rho] = *frame.stack.pop()?;
    frame.stack.push(u256_from_bool(lho < rho))?;
    Ok(OpcodeResult::Continue)
}

pub fn op_gt(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [lho, rho] = *frame.stack.pop()?;
    frame.stack.push(u256_from_bool(lho > rho))?;
    Ok(OpcodeResult::Continue)
}

pub fn op_slt(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [lho, rho] = *frame.stack.pop()?;
    let lho_negative = lho.bit(255);
    let rho_negative = rho.bit(255);
    let result = if lho_negative == rho_negative {
        u256_from_bool(lho < rho)
    } else {
        u256_from_bool(lho_negative)
    };
    frame.stack.push(result)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_sgt(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [lho, rho] = *frame.stack.pop()?;
    let lho_negative = lho.bit(255);
    let rho_negative = rho.bit(255);
    let result = if lho_negative == rho_negative {
        u256_from_bool(lho > rho)
    } else {
        u256_from_bool(rho_negative)
    };
    frame.stack.push(result)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_eq(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [lho, rho] = *frame.stack.pop()?;
    frame.stack.push(u256_from_bool(lho == rho))?;
    Ok(OpcodeResult::Continue)
}

pub fn op_iszero(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [operand] = *frame.stack.pop()?;
    frame.stack.push(u256_from_bool(operand.is_zero()))?;
    Ok(OpcodeResult::Continue)
}

pub fn op_and(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [a, b] = *frame.stack.pop()?;
    frame.stack.push(a & b)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_or(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [a, b] = *frame.stack.pop()?;
    frame.stack.push(a | b)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_xor(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [a, b] = *frame.stack.pop()?;
    frame.stack.push(a ^ b)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_not(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let a = frame.stack.pop1()?;
    frame.stack.push(!a)?;
    Ok(OpcodeResult::Continue)
}

/// BYTE(i, x): byte at position `i` from the high end of `x`; `i >= 32 => 0`.
pub fn op_byte(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [index, value] = *frame.stack.pop()?;
    if index >= U256::from(32) {
        frame.stack.push_zero()?;
        return Ok(OpcodeResult::Continue);
    }
    let index = index.low_u32() as usize;
    #[allow(clippy::arithmetic_side_effects, reason = "index < 32")]
    let byte_from_low_end = 31 - index;
    frame.stack.push(U256::from(value.byte(byte_from_low_end)))?;
    Ok(OpcodeResult::Continue)
}

pub fn op_shl(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [shift, value] = *frame.stack.pop()?;
    if shift < U256::from(256) {
        frame.stack.push(value << shift)?;
    } else {
        frame.stack.push_zero()?;
    }
    Ok(OpcodeResult::Continue)
}

pub fn op_shr(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [shift, value] = *frame.stack.pop()?;
    if shift < U256::from(256) {
        frame.stack.push(value >> shift)?;
    } else {
        frame.stack.push_zero()?;
    }
    Ok(OpcodeResult::Continue)
}

/// Arithmetic right shift: fills with the sign bit instead of zero.
pub fn op_sar(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [shift, value] = *frame.stack.pop()?;
    let is_negative = value.bit(255);
    let result = if shift >= U256::from(256) {
        if is_negative {
            U256::max_value()
        } else {
            U256::zero()
        }
    } else if is_negative {
        let shifted = value >> shift;
        let fill = U256::max_value() << (U256::from(256) - shift);
        shifted | fill
    } else {
        value >> shift
    };
    frame.stack.push(result)?;
    Ok(OpcodeResult::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_store::InMemoryDatabase;
    use crate::execution_context::ExecutionContext;
    use crate::message::Message;
    use crate::oracle::NullOracle;
    use crate::types::{Address, Word};
    use bytes::Bytes;

    fn blank_frame() -> Computation {
        let message = Message {
            gas: 1_000_000,
            to: Some(Address::zero()),
            sender: Address::zero(),
            value: Word::zero(),
            data: Bytes::new(),
            code: Bytes::new(),
            code_address: Address::zero(),
            storage_address: Address::zero(),
            create_address: None,
            depth: 0,
            is_static: false,
            should_transfer_value: false,
        };
        Computation::new_for_test(message)
    }

    #[test]
    fn shr_by_4_on_0xff() {
        let mut db = InMemoryDatabase::new();
        let oracle = NullOracle;
        let mut state = State::new(&mut db, &oracle, ExecutionContext::genesis(1));
        let tx_ctx = TransactionContext::new(Word::zero(), Address::zero());
        let mut frame = blank_frame();
        frame.stack.push(Word::from(0xff)).unwrap();
        frame.stack.push(Word::from(4)).unwrap();
        op_shr(&mut frame, &mut state, &tx_ctx).unwrap();
        assert_eq!(frame.stack.peek(), Some(Word::from(0x0f)));
    }

    #[test]
    fn sar_of_negative_one_by_any_shift_stays_all_ones() {
        let mut db = InMemoryDatabase::new();
        let oracle = NullOracle;
        let mut state = State::new(&mut db, &oracle, ExecutionContext::genesis(1));
        let tx_ctx = TransactionContext::new(Word::zero(), Address::zero());
        let mut frame = blank_frame();
        let minus_one = U256::max_value();
        frame.stack.push(minus_one).unwrap();
        frame.stack.push(Word::from(4)).unwrap();
        op_sar(&mut frame, &mut state, &tx_ctx).unwrap();
        assert_eq!(frame.stack.peek(), Some(minus_one));
    }
}
