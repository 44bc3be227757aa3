//! # fevm
//!
//! A pure Rust implementation of a simplified Cancun-era Ethereum Virtual
//! Machine bytecode interpreter.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        execute_bytecode                       │
//! │   ┌────────────┐   ┌──────────────┐   ┌────────────────────┐ │
//! │   │  Message   │   │ Computation  │   │ TransactionContext │ │
//! │   └────────────┘   └──────────────┘   └────────────────────┘ │
//! │                                                                │
//! │   ┌────────────┐   ┌──────────────┐   ┌────────────────────┐ │
//! │   │   Stack    │   │    Memory    │   │     CodeStream     │ │
//! │   └────────────┘   └──────────────┘   └────────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                            State                               │
//! │   four journaled tiers (account, storage, code, transient)    │
//! │              over a caller-supplied `Database`                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key components
//!
//! - [`computation::Computation`]: the per-call execution frame, stack,
//!   memory and dispatch loop live here
//! - [`state::State`]: the journaled facade over account/storage/code/
//!   transient data, with snapshot/revert/commit checkpointing
//! - [`opcodes`]: the fixed 256-entry opcode dispatch table
//! - [`opcode_handlers`]: one module per opcode category
//! - [`precompiles`]: the fixed precompile address map, 0x01..=0x0a
//! - [`db`]: the backing `Database` trait and an in-memory implementation
//! - [`oracle`]: the ancestor block-hash collaborator `BLOCKHASH` queries
//!
//! ## Usage
//!
//! ```
//! use fevm::db::memory_store::InMemoryDatabase;
//! use fevm::execution_context::ExecutionContext;
//! use fevm::oracle::NullOracle;
//! use fevm::types::{Address, Word};
//!
//! let mut db = InMemoryDatabase::new();
//! let oracle = NullOracle;
//! let code = bytes::Bytes::from_static(&[0x60, 0x01, 0x60, 0x01, 0x01, 0x00]); // PUSH1 1 PUSH1 1 ADD STOP
//!
//! let computation = fevm::execute_bytecode(
//!     Address::zero(),
//!     Word::zero(),
//!     1_000_000,
//!     None,
//!     Address::zero(),
//!     Word::zero(),
//!     bytes::Bytes::new(),
//!     code,
//!     None,
//!     &mut db,
//!     &oracle,
//!     ExecutionContext::genesis(1),
//! );
//! assert!(computation.is_success());
//! ```

pub mod code_stream;
pub mod computation;
pub mod constants;
pub mod db;
pub mod errors;
pub mod execution_context;
pub mod journal;
pub mod memory;
pub mod message;
pub mod opcode_handlers;
pub mod opcodes;
pub mod oracle;
pub mod precompiles;
pub mod stack;
pub mod state;
pub mod transaction_context;
pub mod types;
pub mod validation;

use crate::computation::Computation;
use crate::db::Database;
use crate::execution_context::ExecutionContext;
use crate::message::Message;
use crate::oracle::BlockHashOracle;
use crate::state::State;
use crate::transaction_context::TransactionContext;
use crate::types::{Address, Code, Word};
use bytes::Bytes;

/// Runs a single top-level call or contract creation to completion.
///
/// Builds a [`Message`] and a [`TransactionContext`] from the given
/// parameters, wraps `db`/`oracle`/`context` in a [`State`], and dispatches
/// the call through [`Computation::apply_message`] (or
/// [`Computation::apply_create_message`] when `to` is `None`). The returned
/// `Computation` carries `is_success`/`is_error`, `output`, the collected
/// logs, and the accounts scheduled for deletion and their beneficiaries.
///
/// `code_address` lets a caller run code that differs from the account at
/// `to` (DELEGATECALL-style execution at the top level); when omitted it
/// defaults to `to`, or to a freshly-derived address when `to` is `None`.
#[allow(clippy::too_many_arguments)]
pub fn execute_bytecode(
    origin: Address,
    gas_price: Word,
    gas: u64,
    to: Option<Address>,
    sender: Address,
    value: Word,
    data: Bytes,
    code: Code,
    code_address: Option<Address>,
    db: &mut dyn Database,
    oracle: &dyn BlockHashOracle,
    context: ExecutionContext,
) -> Computation {
    let tx_ctx = TransactionContext::new(gas_price, origin);
    let mut state = State::new(db, oracle, context);

    match to {
        Some(storage_address) => {
            let message = Message {
                gas,
                to,
                sender,
                value,
                data,
                code_address: code_address.unwrap_or(storage_address),
                code,
                storage_address,
                create_address: None,
                depth: 0,
                is_static: false,
                should_transfer_value: !value.is_zero(),
            };
            if !value.is_zero() {
                let _ = opcode_handlers::system::transfer_value(&mut state, sender, storage_address, value);
            }
            Computation::apply_message(&mut state, &tx_ctx, message)
        }
        None => {
            let sender_nonce = state.get_nonce(sender).unwrap_or(0);
            let new_address = opcode_handlers::system::create_address(sender, sender_nonce);
            let _ = state.increment_nonce(sender);
            tx_ctx.record_contract_created(new_address);
            if !value.is_zero() {
                let _ = opcode_handlers::system::transfer_value(&mut state, sender, new_address, value);
            }
            let message = Message {
                gas,
                to: None,
                sender,
                value,
                data,
                code_address: code_address.unwrap_or(new_address),
                code,
                storage_address: new_address,
                create_address: Some(new_address),
                depth: 0,
                is_static: false,
                should_transfer_value: !value.is_zero(),
            };
            Computation::apply_create_message(&mut state, &tx_ctx, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_store::InMemoryDatabase;
    use crate::oracle::NullOracle;

    #[test]
    fn add_of_one_and_one_halts_successfully() {
        let mut db = InMemoryDatabase::new();
        let oracle = NullOracle;
        let code = Bytes::from_static(&[0x60, 0x01, 0x60, 0x01, 0x01, 0x00]);

        let computation = execute_bytecode(
            Address::zero(),
            Word::zero(),
            1_000_000,
            Some(Address::repeat_byte(0x42)),
            Address::zero(),
            Word::zero(),
            Bytes::new(),
            code,
            None,
            &mut db,
            &oracle,
            ExecutionContext::genesis(1),
        );

        assert!(computation.is_success());
    }

    #[test]
    fn create_with_empty_init_code_deploys_empty_code_and_increments_the_sender_nonce() {
        let mut db = InMemoryDatabase::new();
        let oracle = NullOracle;
        let sender = Address::repeat_byte(0x07);

        let computation = execute_bytecode(
            sender,
            Word::zero(),
            1_000_000,
            None,
            sender,
            Word::zero(),
            Bytes::new(),
            Bytes::new(),
            None,
            &mut db,
            &oracle,
            ExecutionContext::genesis(1),
        );

        assert!(computation.is_success());
        assert_eq!(computation.output.len(), 0);
    }
}
