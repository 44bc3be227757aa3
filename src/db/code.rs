//! Contract bytecode store, keyed by `keccak(code)`. Writing the same
//! bytes twice is idempotent since the key is derived from the value.

use super::Database;
use crate::errors::{DatabaseError, ValidationError};
use crate::journal::{Journal, Overlay};
use crate::types::{Code, Hash32, keccak};

#[derive(Default)]
pub struct CodeDB {
    journal: Journal<Hash32, Code>,
}

impl CodeDB {
    pub fn new() -> Self {
        Self {
            journal: Journal::with_accessed_tracking(),
        }
    }

    pub fn get(&mut self, db: &dyn Database, code_hash: Hash32) -> Result<Code, DatabaseError> {
        match self.journal.get(&code_hash) {
            Overlay::Value(code) => Ok(code),
            Overlay::Deleted => Ok(Code::new()),
            Overlay::Absent => db.get_code(code_hash),
        }
    }

    /// Stores `code` and returns its hash. Idempotent: re-storing the same
    /// bytes is a no-op beyond recomputing the (identical) hash.
    pub fn set(&mut self, code: Code) -> Hash32 {
        let hash = keccak(&code);
        self.journal.set(hash, code);
        hash
    }

    pub fn delete(&mut self, code_hash: Hash32) -> Result<(), ValidationError> {
        self.journal.delete(&code_hash)
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

    pub fn persist(&mut self, db: &mut dyn Database) {
        let mut pending_sets = Vec::new();
        self.journal.persist(
            |hash, code| pending_sets.push((*hash, code.clone())),
            |_hash| {},
        );
        for (hash, code) in pending_sets {
            let _ = db.set_code(hash, code);
        }
    }
}
