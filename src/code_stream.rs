//! Wraps an immutable code blob with a mutable program counter and the
//! precomputed JUMPDEST-analysis bitmap used to validate jump targets.

use crate::types::Code;
use bitvec::vec::BitVec;

/// `PUSH1`'s opcode byte; every `PUSHn` (n = 1..=32) is `PUSH1 + (n - 1)`.
const PUSH1: u8 = 0x60;
const PUSH32: u8 = 0x7f;

#[derive(Debug, Clone)]
pub struct CodeStream {
    pub code: Code,
    pub pc: usize,
    /// `true` at byte `i` iff `i` starts a real instruction, i.e. is not
    /// inside the immediate-data span of a preceding PUSH.
    instruction_starts: BitVec,
}

impl CodeStream {
    pub fn new(code: Code) -> Self {
        let instruction_starts = analyze(&code);
        Self {
            code,
            pc: 0,
            instruction_starts,
        }
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// The opcode at the current PC, or `STOP` (0x00) if the PC has run
    /// past the end of the code -- bytecode execution halts implicitly by
    /// stream exhaustion rather than by an explicit trailing STOP.
    pub fn current_opcode(&self) -> u8 {
        self.code.get(self.pc).copied().unwrap_or(0x00)
    }

    pub fn peek(&self) -> u8 {
        self.current_opcode()
    }

    /// Reads `n` bytes starting at the current PC, zero-padding past the
    /// end of the code, and advances the PC by `n`.
    pub fn read(&mut self, n: usize) -> Vec<u8> {
        let mut out = vec![0u8; n];
        let start = self.pc;
        let end = (start + n).min(self.code.len());
        if start < end {
            let available = end - start;
            #[allow(clippy::indexing_slicing, reason = "start/end are both clamped to code.len()")]
            out[..available].copy_from_slice(&self.code[start..end]);
        }
        self.pc += n;
        out
    }

    /// A jump target is valid iff it is in bounds, starts a real
    /// instruction (not PUSH-immediate data), and that instruction is
    /// JUMPDEST (0x5b). Jumping into PUSH-data always fails regardless of
    /// the byte value found there.
    pub fn is_valid_jump_destination(&self, pos: usize) -> bool {
        pos < self.code.len()
            && self.instruction_starts.get(pos).map(|b| *b).unwrap_or(false)
            && self.code[pos] == 0x5b
    }
}

fn analyze(code: &[u8]) -> BitVec {
    let mut starts = BitVec::repeat(false, code.len());
    let mut i = 0usize;
    while i < code.len() {
        starts.set(i, true);
        let op = code[i];
        if (PUSH1..=PUSH32).contains(&op) {
            let data_len = (op - PUSH1) as usize + 1;
            i += 1 + data_len;
        } else {
            i += 1;
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jump_into_push_data_is_invalid() {
        // PUSH1 0x5b, JUMPDEST, STOP -- byte 1 is PUSH data that happens
        // to equal the JUMPDEST opcode; it must not be a valid target.
        let code: Code = vec![0x60, 0x5b, 0x5b, 0x00].into();
        let stream = CodeStream::new(code);
        assert!(!stream.is_valid_jump_destination(1));
        assert!(stream.is_valid_jump_destination(2));
    }

    #[test]
    fn reading_past_the_end_zero_pads() {
        let code: Code = vec![0x60].into();
        let mut stream = CodeStream::new(code);
        stream.pc = 1;
        assert_eq!(stream.read(1), vec![0]);
    }
}
