//! The per-frame execution state, dispatch loop, and child-frame lifecycle.
//!
//! Each `Computation` owns its own stack, memory and code stream; children
//! are owned directly in a `Vec` rather than referenced by arena index,
//! since `State` is threaded through every call by mutable reference
//! instead of being owned by any one frame -- there is no back-edge to
//! model, so plain ownership already gives the acyclic tree the redesign
//! notes ask for.

use crate::code_stream::CodeStream;
use crate::constants::MAX_CALL_DEPTH;
use crate::errors::{ExceptionalHalt, OpcodeResult, VMError};
use crate::memory::Memory;
use crate::message::Message;
use crate::opcodes::dispatch;
use crate::precompiles;
use crate::stack::Stack;
use crate::state::State;
use crate::transaction_context::TransactionContext;
use crate::types::{Address, LogEntry};
use bytes::Bytes;

pub struct Computation {
    pub message: Message,
    pub code_stream: CodeStream,
    pub stack: Stack,
    pub memory: Memory,
    /// The most recent child call's output, visible to RETURNDATASIZE/COPY.
    pub return_data: Bytes,
    /// This frame's own output (what RETURN/REVERT set, or a CREATE
    /// sub-frame's deployed-code candidate).
    pub output: Bytes,
    pub error: Option<VMError>,
    pub logs: Vec<LogEntry>,
    pub accounts_to_delete: Vec<Address>,
    pub beneficiaries: Vec<Address>,
    pub children: Vec<Computation>,
}

impl Computation {
    fn new(message: Message) -> Self {
        let code_stream = CodeStream::new(message.code.clone());
        Self {
            message,
            code_stream,
            stack: Stack::new(),
            memory: Memory::new(),
            return_data: Bytes::new(),
            output: Bytes::new(),
            error: None,
            logs: Vec::new(),
            accounts_to_delete: Vec::new(),
            beneficiaries: Vec::new(),
            children: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn new_for_test(message: Message) -> Self {
        Self::new(message)
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// `true` if this error is a REVERT, which (unlike every other error
    /// kind) keeps its output visible to the caller.
    fn preserves_output(error: &VMError) -> bool {
        !error.flags().erases_return_data
    }

    /// Runs a message to completion: precompile short-circuit, or the
    /// linear opcode dispatch loop with a snapshot taken on entry and
    /// reverted/committed on exit.
    pub fn apply_message(state: &mut State, tx_ctx: &TransactionContext, message: Message) -> Computation {
        tracing::debug!(
            depth = message.depth,
            to = ?message.to,
            is_static = message.is_static,
            "COMPUTATION STARTING"
        );

        let mut frame = Computation::new(message);

        if frame.message.depth > MAX_CALL_DEPTH {
            frame.error = Some(ExceptionalHalt::DepthExceeded.into());
            return frame;
        }

        if let Some(result) = precompiles::try_execute(frame.message.code_address, &frame.message.data) {
            match result {
                Ok(output) => frame.output = output,
                Err(e) => frame.error = Some(e),
            }
            return frame;
        }

        let snapshot = match state.snapshot() {
            Ok(s) => s,
            Err(e) => {
                frame.error = Some(crate::errors::ValidationError::from(e).into());
                return frame;
            }
        };

        frame.run_dispatch_loop(state, tx_ctx);

        let commit_result = if frame.is_error() {
            state.revert(snapshot)
        } else {
            state.commit(snapshot)
        };
        if let Err(e) = commit_result {
            // Only reachable if our own checkpoint bookkeeping is broken;
            // surface it as the frame's error rather than panicking.
            frame.error = Some(e.into());
        }

        tracing::debug!(error = ?frame.error, "COMPUTATION ENDED");
        frame
    }

    /// Like `apply_message`, but on success the frame's output is stored
    /// as the deployed code at `message.create_address` rather than
    /// returned to the caller as call-return data.
    pub fn apply_create_message(
        state: &mut State,
        tx_ctx: &TransactionContext,
        message: Message,
    ) -> Computation {
        let create_address = message.create_address;
        let mut frame = Computation::apply_message(state, tx_ctx, message);
        if frame.is_success() {
            if let Some(address) = create_address {
                let code = std::mem::take(&mut frame.output);
                if let Err(e) = state.set_code(address, code) {
                    frame.error = Some(e.into());
                }
                tx_ctx.record_contract_created(address);
            }
        }
        frame
    }

    fn run_dispatch_loop(&mut self, state: &mut State, tx_ctx: &TransactionContext) {
        loop {
            if self.code_stream.pc >= self.code_stream.len() {
                break;
            }
            let opcode = self.code_stream.current_opcode();
            self.code_stream.pc += 1;
            let handler = dispatch(opcode);
            match handler(self, state, tx_ctx) {
                Ok(OpcodeResult::Continue) => continue,
                Ok(OpcodeResult::Halt) => break,
                Ok(OpcodeResult::Error { error }) => {
                    self.apply_error(error);
                    break;
                }
                Err(e) => {
                    self.apply_error(e);
                    break;
                }
            }
        }
    }

    fn apply_error(&mut self, error: VMError) {
        if !Self::preserves_output(&error) {
            self.output = Bytes::new();
        }
        self.error = Some(error);
    }

    /// Runs `child_msg` as a nested frame, records it in `children`, and
    /// folds its return data into this frame's `return_data`. Returns a
    /// summary of the child's outcome for the calling system-opcode
    /// handler to act on.
    pub fn apply_child_computation(
        &mut self,
        state: &mut State,
        tx_ctx: &TransactionContext,
        child_msg: Message,
    ) -> ChildOutcome {
        let child = if child_msg.is_create() {
            Computation::apply_create_message(state, tx_ctx, child_msg)
        } else {
            Computation::apply_message(state, tx_ctx, child_msg)
        };
        let is_error = child.is_error();
        self.return_data = if is_error
            && !Self::preserves_output(child.error.as_ref().expect("is_error() guarantees this"))
        {
            Bytes::new()
        } else {
            child.output.clone()
        };
        let outcome = ChildOutcome {
            is_error,
            output: child.output.clone(),
            new_address: child.message.create_address,
        };
        self.children.push(child);
        outcome
    }

    /// Union of this frame's and every non-errored descendant's scheduled
    /// deletions, de-duplicated.
    pub fn get_accounts_for_deletion(&self) -> Vec<Address> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        self.collect_accounts_for_deletion(&mut seen, &mut out);
        out
    }

    fn collect_accounts_for_deletion(&self, seen: &mut std::collections::HashSet<Address>, out: &mut Vec<Address>) {
        if self.is_error() {
            return;
        }
        for address in &self.accounts_to_delete {
            if seen.insert(*address) {
                out.push(*address);
            }
        }
        for child in &self.children {
            child.collect_accounts_for_deletion(seen, out);
        }
    }

    pub fn get_self_destruct_beneficiaries(&self) -> Vec<Address> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        self.collect_beneficiaries(&mut seen, &mut out);
        out
    }

    fn collect_beneficiaries(&self, seen: &mut std::collections::HashSet<Address>, out: &mut Vec<Address>) {
        if self.is_error() {
            return;
        }
        for address in &self.beneficiaries {
            if seen.insert(*address) {
                out.push(*address);
            }
        }
        for child in &self.children {
            child.collect_beneficiaries(seen, out);
        }
    }

    /// All logs from this frame and its non-errored descendants, ordered
    /// by transaction-global emission sequence.
    pub fn get_raw_log_entries(&self) -> Vec<LogEntry> {
        let mut out = Vec::new();
        self.collect_logs(&mut out);
        out.sort_by_key(|l| l.sequence_number);
        out
    }

    fn collect_logs(&self, out: &mut Vec<LogEntry>) {
        if self.is_error() {
            return;
        }
        out.extend(self.logs.iter().cloned());
        for child in &self.children {
            child.collect_logs(out);
        }
    }
}

/// What a system-opcode handler needs to know about a just-completed child
/// frame, without holding a second mutable borrow of the parent alive.
pub struct ChildOutcome {
    pub is_error: bool,
    pub output: Bytes,
    pub new_address: Option<Address>,
}
