//! PUSH0 and the generic const-sized PUSH1..PUSH32.

use crate::computation::Computation;
use crate::errors::{OpcodeResult, VMError};
use crate::state::State;
use crate::transaction_context::TransactionContext;
use crate::types::Word;

pub fn op_push0(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    frame.stack.push_zero()?;
    Ok(OpcodeResult::Continue)
}

/// Reads the next `N` code bytes (zero-padded past the end of the code),
/// pushes them as a big-endian integer, and advances the PC by `N`.
pub fn op_push<const N: usize>(frame: &mut Computation, _state: &mut State, _tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    let bytes = frame.code_stream.read(N);
    frame.stack.push(Word::from_big_endian(&bytes))?;
    Ok(OpcodeResult::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_store::InMemoryDatabase;
    use crate::execution_context::ExecutionContext;
    use crate::message::Message;
    use crate::oracle::NullOracle;
    use crate::types::Address;
    use bytes::Bytes;

    fn blank_frame(code: Vec<u8>) -> Computation {
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
        let mut frame = Computation::new_for_test(message);
        frame.code_stream.pc = 1;
        frame
    }

    #[test]
    fn push32_of_all_ff_is_two_to_the_256_minus_one() {
        let mut db = InMemoryDatabase::new();
        let oracle = NullOracle;
        let mut state = State::new(&mut db, &oracle, ExecutionContext::genesis(1));
        let tx_ctx = TransactionContext::new(Word::zero(), Address::zero());
        let mut code = vec![0x7f];
        code.extend_from_slice(&[0xff; 32]);
        let mut frame = blank_frame(code);
        op_push::<32>(&mut frame, &mut state, &tx_ctx).unwrap();
        assert_eq!(frame.stack.peek(), Some(Word::max_value()));
        assert_eq!(frame.code_stream.pc, 33);
    }
}
