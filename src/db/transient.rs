//! Transient storage (EIP-1153): an in-memory-only overlay keyed by
//! `(address, slot)`, with no backing store at all -- it is wiped wholesale
//! at the start of every transaction rather than persisted.

use crate::errors::ValidationError;
use crate::journal::{Journal, Overlay};
use crate::types::{Address, Word};

#[derive(Default)]
pub struct TransientDB {
    journal: Journal<(Address, Word), Word>,
}

impl TransientDB {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, address: Address, slot: Word) -> Word {
        match self.journal.get(&(address, slot)) {
            Overlay::Value(v) => v,
            Overlay::Deleted | Overlay::Absent => Word::zero(),
        }
    }

    pub fn set(&mut self, address: Address, slot: Word, value: Word) {
        if value.is_zero() {
            let _ = self.journal.delete(&(address, slot));
        } else {
            self.journal.set((address, slot), value);
        }
    }

    pub fn record_with_id(&mut self, id: u64) -> Result<(), ValidationError> {
        self.journal.record_with_id(id)
    }

    pub fn commit(&mut self, id: u64) -> Result<(), ValidationError> {
        self.journal.commit(id)
    }

    pub fn discard(&mut self, id: u64) -> Result<(), ValidationError> {
        self.journal.discard(id)
    }

    /// Wipes every transient slot. Called once at the start of each
    /// transaction -- transient storage never outlives it.
    pub fn clear_for_new_transaction(&mut self) {
        self.journal = Journal::new();
    }
}
