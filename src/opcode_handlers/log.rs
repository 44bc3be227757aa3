//! LOG0..LOG4.

use crate::computation::Computation;
use crate::errors::{require_not_static, OpcodeResult, VMError};
use crate::state::State;
use crate::transaction_context::TransactionContext;
use crate::types::LogEntry;
use crate::validation::u256_to_usize;
use bytes::Bytes;

/// Pops `(offset, len)` then `N` topics, and appends a log entry tagged
/// with the transaction-global emission sequence. Forbidden inside a
/// STATICCALL subtree.
pub fn op_log<const N: usize>(frame: &mut Computation, _state: &mut State, tx_ctx: &TransactionContext) -> Result<OpcodeResult, VMError> {
    require_not_static(frame.message.is_static)?;

    let [offset, size] = *frame.stack.pop()?;
    let topics = *frame.stack.pop::<N>()?;

    let offset = u256_to_usize(offset).unwrap_or(usize::MAX);
    let size = u256_to_usize(size).unwrap_or(usize::MAX);
    frame.memory.extend(offset, size)?;
    let data = frame.memory.load_range(offset, size)?.to_vec();

    frame.logs.push(LogEntry {
        sequence_number: tx_ctx.next_log_sequence(),
        address: frame.message.storage_address,
        topics: topics.to_vec(),
        data: Bytes::from(data),
    });
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
    fn log0_inside_staticcall_is_write_protected() {
        let mut db = InMemoryDatabase::new();
        let oracle = NullOracle;
        let mut state = State::new(&mut db, &oracle, ExecutionContext::genesis(1));
        let tx_ctx = TransactionContext::new(Word::zero(), Address::zero());
        let mut frame = blank_frame();
        frame.message.is_static = true;
        frame.stack.push(Word::zero()).unwrap();
        frame.stack.push(Word::zero()).unwrap();
        let err = op_log::<0>(&mut frame, &mut state, &tx_ctx).unwrap_err();
        assert!(matches!(
            err,
            VMError::ExceptionalHalt(crate::errors::ExceptionalHalt::WriteProtection)
        ));
    }

    #[test]
    fn three_log0_emissions_are_sequenced_in_order() {
        let mut db = InMemoryDatabase::new();
        let oracle = NullOracle;
        let mut state = State::new(&mut db, &oracle, ExecutionContext::genesis(1));
        let tx_ctx = TransactionContext::new(Word::zero(), Address::zero());
        let mut frame = blank_frame();
        frame.memory.extend(0, 32).unwrap();
        frame.memory.store(0, b"hello").unwrap();
        for _ in 0..3 {
            frame.stack.push(Word::from(5)).unwrap();
            frame.stack.push(Word::zero()).unwrap();
            op_log::<0>(&mut frame, &mut state, &tx_ctx).unwrap();
        }
        let logs = frame.get_raw_log_entries();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].sequence_number, 0);
        assert_eq!(logs[2].sequence_number, 2);
        assert_eq!(logs[0].data.as_ref(), b"hello");
    }
}
