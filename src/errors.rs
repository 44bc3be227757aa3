//! Error taxonomy.
//!
//! Mirrors the three-tier split from the design: frame-local VM errors that
//! a `Computation` swallows into its own `_error` slot, validation errors
//! raised at API boundaries that are never caught internally, and database
//! failures that bubble straight to the caller.

use crate::types::Address;
use ethereum_types::U256;
use thiserror::Error;

/// Whether an `ExceptionalHalt` burns the remaining gas in a fully metered
/// implementation and/or erases the frame's return data. Gas accounting
/// itself is nominal (see `DESIGN.md`), but these flags still drive the
/// control-flow decisions the dispatch loop makes on error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorFlags {
    pub burns_gas: bool,
    pub erases_return_data: bool,
}

impl ErrorFlags {
    pub const NONE: Self = Self {
        burns_gas: false,
        erases_return_data: false,
    };
    pub const BURNS_AND_ERASES: Self = Self {
        burns_gas: true,
        erases_return_data: true,
    };
}

/// Exceptional conditions raised while executing a single frame.
///
/// These never escape `Computation::run`: the dispatch loop catches one,
/// records it into the frame's error slot, and decides revert/commit from
/// `ErrorFlags`, exactly as `Computation.__exit__` does in the reference
/// implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExceptionalHalt {
    #[error("stack underflow: required {required} items, had {available}")]
    InsufficientStack { required: usize, available: usize },

    #[error("stack overflow: pushing would exceed 1024 items")]
    FullStack,

    #[error("out of gas")]
    OutOfGas,

    #[error("invalid instruction 0x{opcode:02x}")]
    InvalidInstruction { opcode: u8 },

    #[error("invalid jump destination {destination}")]
    InvalidJumpDestination { destination: U256 },

    #[error("write protection: state-mutating opcode inside STATICCALL")]
    WriteProtection,

    #[error("contract creation collision at {address}")]
    ContractCreationCollision { address: Address },

    #[error("call depth exceeded 1024")]
    DepthExceeded,

    #[error("memory access out of bounds")]
    OutOfBounds,

    #[error("reverted")]
    Revert,
}

impl ExceptionalHalt {
    pub fn flags(&self) -> ErrorFlags {
        match self {
            ExceptionalHalt::OutOfGas | ExceptionalHalt::InvalidInstruction { .. } => {
                ErrorFlags::BURNS_AND_ERASES
            }
            _ => ErrorFlags::NONE,
        }
    }
}

/// Errors raised by the backing key/value store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DatabaseError {
    #[error("backing store I/O failure: {0}")]
    StoreFailure(String),
    #[error("block hash oracle failure: {0}")]
    OracleFailure(String),
}

/// Programmer errors raised at the boundary of public APIs (invalid
/// addresses, out-of-range integers, malformed byte strings). These are
/// never caught by a `Computation`'s dispatch loop.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("value {0} does not fit in a uint256")]
    NotUint256(String),
    #[error("address must be exactly 20 bytes, got {0}")]
    InvalidAddressLength(usize),
    #[error("expected a byte string")]
    NotBytes,
    #[error("expected length {expected}, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("value {value} exceeds bound {bound}")]
    ExceedsBound { value: String, bound: String },
    #[error("nonce {0} does not fit in a uint64")]
    NotUint64(U256),
    #[error("unknown checkpoint {0}")]
    UnknownCheckpoint(u64),
    #[error("cannot commit or discard the root checkpoint; use persist/clear instead")]
    RootCheckpoint,
    #[error("delete of key that was never accessed")]
    DeleteOfUnaccessedKey,
}

/// Internal invariant violations: things that "cannot happen" given the
/// crate's own bookkeeping (arithmetic overflow in index computations,
/// missing child-frame slots). Distinct from `ExceptionalHalt` because
/// these indicate a bug in this crate, not a property of the executed
/// bytecode.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InternalError {
    #[error("arithmetic overflow while computing {0}")]
    Overflow(&'static str),
    #[error("missing checkpoint state: {0}")]
    MissingCheckpoint(&'static str),
    #[error("invariant violated: {0}")]
    Invariant(&'static str),
}

/// The top-level error type threaded through opcode handlers and the
/// dispatch loop via `?`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VMError {
    #[error(transparent)]
    ExceptionalHalt(#[from] ExceptionalHalt),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl VMError {
    /// `true` for everything except an internal bug -- mirrors the
    /// source's distinction between "the bytecode did something invalid"
    /// and "our own bookkeeping broke".
    pub fn is_exceptional_halt(&self) -> bool {
        matches!(self, VMError::ExceptionalHalt(_))
    }

    pub fn flags(&self) -> ErrorFlags {
        match self {
            VMError::ExceptionalHalt(e) => e.flags(),
            _ => ErrorFlags::NONE,
        }
    }
}

/// The outcome of a single opcode handler invocation, replacing the
/// source's exception-as-control-flow pattern for `Halt`/`REVERT` with an
/// explicit result the dispatch loop switches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpcodeResult {
    /// Keep stepping the dispatch loop.
    Continue,
    /// Stop the loop without error (RETURN, STOP, or fall-off-the-end).
    Halt,
    /// Stop the loop with an error recorded in the frame (REVERT or any
    /// `ExceptionalHalt`). Whether the caller still sees this frame's output
    /// (REVERT does, every other error kind doesn't) is decided by the
    /// dispatch loop from `error.flags().erases_return_data`, not here.
    Error { error: VMError },
}

pub type OpcodeHandlerResult = Result<OpcodeResult, VMError>;

/// Guards a state-mutating opcode: fails with `WriteProtection` if the
/// current frame is inside a STATICCALL subtree.
pub fn require_not_static(is_static: bool) -> Result<(), VMError> {
    if is_static {
        Err(ExceptionalHalt::WriteProtection.into())
    } else {
        Ok(())
    }
}
