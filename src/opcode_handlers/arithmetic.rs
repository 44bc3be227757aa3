//! Arithmetic opcodes (11): ADD, SUB, MUL, DIV, SDIV, MOD, SMOD, ADDMOD,
//! MULMOD, EXP, SIGNEXTEND. All wrap mod 2^256 unless noted.

use crate::computation::Computation;
use crate::errors::OpcodeResult;
use crate::errors::VMError;
use crate::state::State;
use crate::transaction_context::TransactionContext;
use ethereum_types::{U256, U512};

pub fn op_add(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [augend, addend] = *frame.stack.pop()?;
    frame.stack.push(augend.overflowing_add(addend).0)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_sub(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [minuend, subtrahend] = *frame.stack.pop()?;
    frame.stack.push(minuend.overflowing_sub(subtrahend).0)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_mul(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [multiplicand, multiplier] = *frame.stack.pop()?;
    frame.stack.push(multiplicand.overflowing_mul(multiplier).0)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_div(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [dividend, divisor] = *frame.stack.pop()?;
    let quotient = dividend.checked_div(divisor).unwrap_or_default();
    frame.stack.push(quotient)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_sdiv(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [dividend, divisor] = *frame.stack.pop()?;
    if divisor.is_zero() || dividend.is_zero() {
        frame.stack.push_zero()?;
        return Ok(OpcodeResult::Continue);
    }

    let abs_dividend = abs(dividend);
    let abs_divisor = abs(divisor);

    let quotient = match abs_dividend.checked_div(abs_divisor) {
        Some(quot) => {
            let quotient_is_negative = is_negative(dividend) ^ is_negative(divisor);
            if quotient_is_negative {
                negate(quot)
            } else {
                quot
            }
        }
        None => U256::zero(),
    };
    frame.stack.push(quotient)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_mod(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [dividend, divisor] = *frame.stack.pop()?;
    frame.stack.push(dividend.checked_rem(divisor).unwrap_or_default())?;
    Ok(OpcodeResult::Continue)
}

pub fn op_smod(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [unchecked_dividend, unchecked_divisor] = *frame.stack.pop()?;
    if unchecked_divisor.is_zero() || unchecked_dividend.is_zero() {
        frame.stack.push_zero()?;
        return Ok(OpcodeResult::Continue);
    }

    let divisor = abs(unchecked_divisor);
    let dividend = abs(unchecked_dividend);

    let Some(unchecked_remainder) = dividend.checked_rem(divisor) else {
        frame.stack.push_zero()?;
        return Ok(OpcodeResult::Continue);
    };

    let remainder = if is_negative(unchecked_dividend) {
        negate(unchecked_remainder)
    } else {
        unchecked_remainder
    };
    frame.stack.push(remainder)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_addmod(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [augend, addend, modulus] = *frame.stack.pop()?;
    if modulus.is_zero() {
        frame.stack.push_zero()?;
        return Ok(OpcodeResult::Continue);
    }
    let sum: U512 = U512::from(augend) + U512::from(addend);
    #[allow(clippy::arithmetic_side_effects, reason = "modulus checked non-zero above")]
    let sum_mod = sum % U512::from(modulus);
    #[allow(clippy::expect_used, reason = "result of % a U256 modulus always fits in a U256")]
    let sum_mod: U256 = sum_mod.try_into().expect("reduced by a U256 modulus");
    frame.stack.push(sum_mod)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_mulmod(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [multiplicand, multiplier, modulus] = *frame.stack.pop()?;
    if modulus.is_zero() {
        frame.stack.push_zero()?;
        return Ok(OpcodeResult::Continue);
    }
    let product = multiplicand.full_mul(multiplier);
    #[allow(clippy::arithmetic_side_effects, reason = "modulus checked non-zero above")]
    let product_mod = product % U512::from(modulus);
    #[allow(clippy::expect_used, reason = "result of % a U256 modulus always fits in a U256")]
    let product_mod: U256 = product_mod.try_into().expect("reduced by a U256 modulus");
    frame.stack.push(product_mod)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_exp(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [base, exponent] = *frame.stack.pop()?;
    frame.stack.push(base.overflowing_pow(exponent).0)?;
    Ok(OpcodeResult::Continue)
}

pub fn op_signextend(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let [byte_size_minus_one, value_to_extend] = *frame.stack.pop()?;
    if byte_size_minus_one > U256::from(31) {
        frame.stack.push(value_to_extend)?;
        return Ok(OpcodeResult::Continue);
    }
    #[allow(clippy::arithmetic_side_effects, reason = "byte_size_minus_one <= 31, so this can't overflow")]
    let sign_bit_index = byte_size_minus_one * 8 + 7;

    let sign_bit = (value_to_extend >> sign_bit_index) & U256::one();
    #[allow(clippy::arithmetic_side_effects, reason = "sign_bit_index <= 255")]
    let mask = (U256::one() << sign_bit_index) - U256::one();

    let result = if sign_bit.is_zero() {
        value_to_extend & mask
    } else {
        value_to_extend | !mask
    };
    frame.stack.push(result)?;
    Ok(OpcodeResult::Continue)
}

fn is_negative(value: U256) -> bool {
    value.bit(255)
}

fn negate(value: U256) -> U256 {
    (!value).overflowing_add(U256::one()).0
}

fn abs(value: U256) -> U256 {
    if is_negative(value) {
        negate(value)
    } else {
        value
    }
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

    fn frame_for(code: Vec<u8>) -> Computation {
        let message = Message {
            gas: 1_000_000,
            to: Some(Address::zero()),
            sender: Address::zero(),
            value: Word::zero(),
            data: Bytes::new(),
            code: Bytes::from(code),
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
    fn add_wraps() {
        let mut db = InMemoryDatabase::new();
        let oracle = NullOracle;
        let mut state = State::new(&mut db, &oracle, ExecutionContext::genesis(1));
        let tx_ctx = TransactionContext::new(Word::zero(), Address::zero());
        let mut frame = frame_for(vec![]);
        frame.stack.push(Word::from(1)).unwrap();
        frame.stack.push(Word::from(1)).unwrap();
        op_add(&mut frame, &mut state, &tx_ctx).unwrap();
        assert_eq!(frame.stack.peek(), Some(Word::from(2)));
    }

    #[test]
    fn sdiv_of_most_negative_by_minus_one_pins() {
        let mut db = InMemoryDatabase::new();
        let oracle = NullOracle;
        let mut state = State::new(&mut db, &oracle, ExecutionContext::genesis(1));
        let tx_ctx = TransactionContext::new(Word::zero(), Address::zero());
        let mut frame = frame_for(vec![]);
        let minus_two = !Word::one() + Word::one();
        let minus_one = !Word::zero();
        frame.stack.push(minus_two).unwrap();
        frame.stack.push(minus_one).unwrap();
        op_sdiv(&mut frame, &mut state, &tx_ctx).unwrap();
        assert_eq!(frame.stack.peek(), Some(Word::from(2)));
    }
}
