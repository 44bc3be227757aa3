//! The immutable per-call descriptor a `Computation` frame is built from.

use crate::types::{Address, Code, Word};

#[derive(Debug, Clone)]
pub struct Message {
    pub gas: u64,
    /// `None` for CREATE/CREATE2, where the target address does not exist
    /// until the frame completes.
    pub to: Option<Address>,
    pub sender: Address,
    pub value: Word,
    pub data: bytes::Bytes,
    pub code: Code,
    /// The address whose code is executing (differs from `storage_address`
    /// under CALLCODE/DELEGATECALL).
    pub code_address: Address,
    /// The address whose storage/balance this frame reads and writes.
    pub storage_address: Address,
    /// The address a CREATE/CREATE2 frame is about to deploy to.
    pub create_address: Option<Address>,
    pub depth: usize,
    pub is_static: bool,
    pub should_transfer_value: bool,
}

impl Message {
    pub fn is_create(&self) -> bool {
        self.to.is_none()
    }
}
