//! The opcode byte table: an enum for readable error messages/tracing, and
//! the dispatch table of function pointers the dispatch loop indexes into.
//!
//! Re-architected per the redesign notes from a dictionary of callables
//! keyed by opcode byte into a fixed 256-entry array of function pointers,
//! built once at load time; unknown/unassigned bytes map to `op_invalid`.

use crate::computation::Computation;
use crate::errors::{ExceptionalHalt, OpcodeResult, VMError};
use crate::opcode_handlers::*;
use crate::state::State;
use crate::transaction_context::TransactionContext;

/// Known Cancun opcodes. Not consulted by the dispatch loop itself (which
/// indexes the raw byte straight into `OPCODE_TABLE`) -- kept around for
/// diagnostics and tests that want a name instead of a hex byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    // Stop and arithmetic
    STOP = 0x00,
    ADD = 0x01,
    MUL = 0x02,
    SUB = 0x03,
    DIV = 0x04,
    SDIV = 0x05,
    MOD = 0x06,
    SMOD = 0x07,
    ADDMOD = 0x08,
    MULMOD = 0x09,
    EXP = 0x0a,
    SIGNEXTEND = 0x0b,

    // Comparison and bitwise
    LT = 0x10,
    GT = 0x11,
    SLT = 0x12,
    SGT = 0x13,
    EQ = 0x14,
    ISZERO = 0x15,
    AND = 0x16,
    OR = 0x17,
    XOR = 0x18,
    NOT = 0x19,
    BYTE = 0x1a,
    SHL = 0x1b,
    SHR = 0x1c,
    SAR = 0x1d,

    KECCAK256 = 0x20,

    // Environment
    ADDRESS = 0x30,
    BALANCE = 0x31,
    ORIGIN = 0x32,
    CALLER = 0x33,
    CALLVALUE = 0x34,
    CALLDATALOAD = 0x35,
    CALLDATASIZE = 0x36,
    CALLDATACOPY = 0x37,
    CODESIZE = 0x38,
    CODECOPY = 0x39,
    GASPRICE = 0x3a,
    EXTCODESIZE = 0x3b,
    EXTCODECOPY = 0x3c,
    RETURNDATASIZE = 0x3d,
    RETURNDATACOPY = 0x3e,
    EXTCODEHASH = 0x3f,

    // Block
    BLOCKHASH = 0x40,
    COINBASE = 0x41,
    TIMESTAMP = 0x42,
    NUMBER = 0x43,
    DIFFICULTY = 0x44,
    GASLIMIT = 0x45,
    CHAINID = 0x46,
    SELFBALANCE = 0x47,
    BASEFEE = 0x48,
    BLOBHASH = 0x49,
    BLOBBASEFEE = 0x4a,

    // Stack/memory/storage/flow
    POP = 0x50,
    MLOAD = 0x51,
    MSTORE = 0x52,
    MSTORE8 = 0x53,
    SLOAD = 0x54,
    SSTORE = 0x55,
    JUMP = 0x56,
    JUMPI = 0x57,
    PC = 0x58,
    MSIZE = 0x59,
    GAS = 0x5a,
    JUMPDEST = 0x5b,
    TLOAD = 0x5c,
    TSTORE = 0x5d,
    MCOPY = 0x5e,

    PUSH0 = 0x5f,
    PUSH1 = 0x60,
    PUSH32 = 0x7f,
    DUP1 = 0x80,
    DUP16 = 0x8f,
    SWAP1 = 0x90,
    SWAP16 = 0x9f,

    LOG0 = 0xa0,
    LOG4 = 0xa4,

    CREATE = 0xf0,
    CALL = 0xf1,
    CALLCODE = 0xf2,
    RETURN = 0xf3,
    DELEGATECALL = 0xf4,
    CREATE2 = 0xf5,
    STATICCALL = 0xfa,
    REVERT = 0xfd,
    INVALID = 0xfe,
    SELFDESTRUCT = 0xff,
}

pub type OpcodeHandler =
    fn(&mut Computation, &mut State, &TransactionContext) -> Result<OpcodeResult, VMError>;

pub fn dispatch(opcode: u8) -> OpcodeHandler {
    OPCODE_TABLE[opcode as usize]
}

fn op_invalid(
    frame: &mut Computation,
    _state: &mut State,
    _tx_ctx: &TransactionContext,
) -> Result<OpcodeResult, VMError> {
    let opcode = frame.code_stream.code.get(frame.code_stream.pc.wrapping_sub(1)).copied().unwrap_or(0xfe);
    Err(ExceptionalHalt::InvalidInstruction { opcode }.into())
}

static OPCODE_TABLE: [OpcodeHandler; 256] = build_table();

const fn build_table() -> [OpcodeHandler; 256] {
    let mut table: [OpcodeHandler; 256] = [op_invalid; 256];

    table[0x00] = stack_memory_storage_flow::op_stop;
    table[0x01] = arithmetic::op_add;
    table[0x02] = arithmetic::op_mul;
    table[0x03] = arithmetic::op_sub;
    table[0x04] = arithmetic::op_div;
    table[0x05] = arithmetic::op_sdiv;
    table[0x06] = arithmetic::op_mod;
    table[0x07] = arithmetic::op_smod;
    table[0x08] = arithmetic::op_addmod;
    table[0x09] = arithmetic::op_mulmod;
    table[0x0a] = arithmetic::op_exp;
    table[0x0b] = arithmetic::op_signextend;

    table[0x10] = bitwise_comparison::op_lt;
    table[0x11] = bitwise_comparison::op_gt;
    table[0x12] = bitwise_comparison::op_slt;
    table[0x13] = bitwise_comparison::op_sgt;
    table[0x14] = bitwise_comparison::op_eq;
    table[0x15] = bitwise_comparison::op_iszero;
    table[0x16] = bitwise_comparison::op_and;
    table[0x17] = bitwise_comparison::op_or;
    table[0x18] = bitwise_comparison::op_xor;
    table[0x19] = bitwise_comparison::op_not;
    table[0x1a] = bitwise_comparison::op_byte;
    table[0x1b] = bitwise_comparison::op_shl;
    table[0x1c] = bitwise_comparison::op_shr;
    table[0x1d] = bitwise_comparison::op_sar;

    table[0x20] = keccak::op_keccak256;

    table[0x30] = environment::op_address;
    table[0x31] = environment::op_balance;
    table[0x32] = environment::op_origin;
    table[0x33] = environment::op_caller;
    table[0x34] = environment::op_callvalue;
    table[0x35] = environment::op_calldataload;
    table[0x36] = environment::op_calldatasize;
    table[0x37] = environment::op_calldatacopy;
    table[0x38] = environment::op_codesize;
    table[0x39] = environment::op_codecopy;
    table[0x3a] = environment::op_gasprice;
    table[0x3b] = environment::op_extcodesize;
    table[0x3c] = environment::op_extcodecopy;
    table[0x3d] = environment::op_returndatasize;
    table[0x3e] = environment::op_returndatacopy;
    table[0x3f] = environment::op_extcodehash;

    table[0x40] = block::op_blockhash;
    table[0x41] = block::op_coinbase;
    table[0x42] = block::op_timestamp;
    table[0x43] = block::op_number;
    table[0x44] = block::op_difficulty;
    table[0x45] = block::op_gaslimit;
    table[0x46] = block::op_chainid;
    table[0x47] = block::op_selfbalance;
    table[0x48] = block::op_basefee;
    table[0x49] = block::op_blobhash;
    table[0x4a] = block::op_blobbasefee;

    table[0x50] = stack_memory_storage_flow::op_pop;
    table[0x51] = stack_memory_storage_flow::op_mload;
    table[0x52] = stack_memory_storage_flow::op_mstore;
    table[0x53] = stack_memory_storage_flow::op_mstore8;
    table[0x54] = stack_memory_storage_flow::op_sload;
    table[0x55] = stack_memory_storage_flow::op_sstore;
    table[0x56] = stack_memory_storage_flow::op_jump;
    table[0x57] = stack_memory_storage_flow::op_jumpi;
    table[0x58] = stack_memory_storage_flow::op_pc;
    table[0x59] = stack_memory_storage_flow::op_msize;
    table[0x5a] = stack_memory_storage_flow::op_gas;
    table[0x5b] = stack_memory_storage_flow::op_jumpdest;
    table[0x5c] = stack_memory_storage_flow::op_tload;
    table[0x5d] = stack_memory_storage_flow::op_tstore;
    table[0x5e] = stack_memory_storage_flow::op_mcopy;

    table[0x5f] = push::op_push0;
    table[0x60] = push::op_push::<1>;
    table[0x61] = push::op_push::<2>;
    table[0x62] = push::op_push::<3>;
    table[0x63] = push::op_push::<4>;
    table[0x64] = push::op_push::<5>;
    table[0x65] = push::op_push::<6>;
    table[0x66] = push::op_push::<7>;
    table[0x67] = push::op_push::<8>;
    table[0x68] = push::op_push::<9>;
    table[0x69] = push::op_push::<10>;
    table[0x6a] = push::op_push::<11>;
    table[0x6b] = push::op_push::<12>;
    table[0x6c] = push::op_push::<13>;
    table[0x6d] = push::op_push::<14>;
    table[0x6e] = push::op_push::<15>;
    table[0x6f] = push::op_push::<16>;
    table[0x70] = push::op_push::<17>;
    table[0x71] = push::op_push::<18>;
    table[0x72] = push::op_push::<19>;
    table[0x73] = push::op_push::<20>;
    table[0x74] = push::op_push::<21>;
    table[0x75] = push::op_push::<22>;
    table[0x76] = push::op_push::<23>;
    table[0x77] = push::op_push::<24>;
    table[0x78] = push::op_push::<25>;
    table[0x79] = push::op_push::<26>;
    table[0x7a] = push::op_push::<27>;
    table[0x7b] = push::op_push::<28>;
    table[0x7c] = push::op_push::<29>;
    table[0x7d] = push::op_push::<30>;
    table[0x7e] = push::op_push::<31>;
    table[0x7f] = push::op_push::<32>;

    table[0x80] = dup_swap::op_dup::<1>;
    table[0x81] = dup_swap::op_dup::<2>;
    table[0x82] = dup_swap::op_dup::<3>;
    table[0x83] = dup_swap::op_dup::<4>;
    table[0x84] = dup_swap::op_dup::<5>;
    table[0x85] = dup_swap::op_dup::<6>;
    table[0x86] = dup_swap::op_dup::<7>;
    table[0x87] = dup_swap::op_dup::<8>;
    table[0x88] = dup_swap::op_dup::<9>;
    table[0x89] = dup_swap::op_dup::<10>;
    table[0x8a] = dup_swap::op_dup::<11>;
    table[0x8b] = dup_swap::op_dup::<12>;
    table[0x8c] = dup_swap::op_dup::<13>;
    table[0x8d] = dup_swap::op_dup::<14>;
    table[0x8e] = dup_swap::op_dup::<15>;
    table[0x8f] = dup_swap::op_dup::<16>;

    table[0x90] = dup_swap::op_swap::<1>;
    table[0x91] = dup_swap::op_swap::<2>;
    table[0x92] = dup_swap::op_swap::<3>;
    table[0x93] = dup_swap::op_swap::<4>;
    table[0x94] = dup_swap::op_swap::<5>;
    table[0x95] = dup_swap::op_swap::<6>;
    table[0x96] = dup_swap::op_swap::<7>;
    table[0x97] = dup_swap::op_swap::<8>;
    table[0x98] = dup_swap::op_swap::<9>;
    table[0x99] = dup_swap::op_swap::<10>;
    table[0x9a] = dup_swap::op_swap::<11>;
    table[0x9b] = dup_swap::op_swap::<12>;
    table[0x9c] = dup_swap::op_swap::<13>;
    table[0x9d] = dup_swap::op_swap::<14>;
    table[0x9e] = dup_swap::op_swap::<15>;
    table[0x9f] = dup_swap::op_swap::<16>;

    table[0xa0] = log::op_log::<0>;
    table[0xa1] = log::op_log::<1>;
    table[0xa2] = log::op_log::<2>;
    table[0xa3] = log::op_log::<3>;
    table[0xa4] = log::op_log::<4>;

    table[0xf0] = system::op_create;
    table[0xf1] = system::op_call;
    table[0xf2] = system::op_callcode;
    table[0xf3] = system::op_return;
    table[0xf4] = system::op_delegatecall;
    table[0xf5] = system::op_create2;
    table[0xfa] = system::op_staticcall;
    table[0xfd] = system::op_revert;
    table[0xfe] = system::op_invalid_opcode;
    table[0xff] = system::op_selfdestruct;

    table
}
