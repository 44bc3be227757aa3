//! Per-account persistent storage: one `Journal<Word, Word>` per touched
//! address, so a single checkpoint id can be recorded across every address
//! an outer `State::snapshot` has touched so far (storage journals created
//! for addresses touched only *after* the snapshot have nothing to roll
//! back to, and are dropped wholesale on revert instead).

use super::Database;
use crate::errors::{DatabaseError, ValidationError};
use crate::journal::{Journal, Overlay};
use crate::types::{Address, Word};
use rustc_hash::FxHashMap;

#[derive(Default)]
pub struct AccountStorageDB {
    per_address: FxHashMap<Address, Journal<Word, Word>>,
}

impl AccountStorageDB {
    pub fn new() -> Self {
        Self::default()
    }

    fn journal_mut(&mut self, address: Address) -> &mut Journal<Word, Word> {
        self.per_address.entry(address).or_default()
    }

    pub fn get(
        &mut self,
        db: &dyn Database,
        address: Address,
        slot: Word,
    ) -> Result<Word, DatabaseError> {
        match self.journal_mut(address).get(&slot) {
            Overlay::Value(v) => Ok(v),
            Overlay::Deleted => Ok(Word::zero()),
            Overlay::Absent => db.get_storage(address, slot),
        }
    }

    /// Writing zero to an already-empty slot is a no-op; writing zero to a
    /// non-empty slot deletes it (so a later read falls through to zero
    /// without leaving a needless `Value(0)` entry behind).
    pub fn set(
        &mut self,
        db: &dyn Database,
        address: Address,
        slot: Word,
        value: Word,
    ) -> Result<(), DatabaseError> {
        if value.is_zero() {
            let current = self.get(db, address, slot)?;
            if current.is_zero() {
                return Ok(());
            }
            // The key was definitely accessed by the `get` above.
            let _ = self.journal_mut(address).delete(&slot);
            return Ok(());
        }
        self.journal_mut(address).set(slot, value);
        Ok(())
    }

    pub fn record_with_id(&mut self, id: u64) -> Result<(), ValidationError> {
        for journal in self.per_address.values_mut() {
            journal.record_with_id(id)?;
        }
        Ok(())
    }

    pub fn commit(&mut self, id: u64) -> Result<(), ValidationError> {
        for journal in self.per_address.values_mut() {
            if journal.contains_checkpoint(id) {
                journal.commit(id)?;
            }
        }
        Ok(())
    }

    pub fn discard(&mut self, id: u64) -> Result<(), ValidationError> {
        let mut to_drop = Vec::new();
        for (address, journal) in self.per_address.iter_mut() {
            if journal.contains_checkpoint(id) {
                journal.discard(id)?;
            } else {
                to_drop.push(*address);
            }
        }
        for address in to_drop {
            self.per_address.remove(&address);
        }
        Ok(())
    }

    pub fn persist(&mut self, db: &mut dyn Database) {
        for (address, journal) in self.per_address.iter_mut() {
            let address = *address;
            let mut pending_sets = Vec::new();
            let mut pending_deletes = Vec::new();
            journal.persist(
                |slot, value| pending_sets.push((*slot, *value)),
                |slot| pending_deletes.push(*slot),
            );
            for (slot, value) in pending_sets {
                let _ = db.set_storage(address, slot, value);
            }
            for slot in pending_deletes {
                let _ = db.delete_storage(address, slot);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_store::InMemoryDatabase;

    #[test]
    fn zero_write_to_empty_slot_is_noop_and_round_trips() {
        let db = InMemoryDatabase::new();
        let mut storage = AccountStorageDB::new();
        let addr = Address::repeat_byte(0x01);
        storage.set(&db, addr, 1.into(), Word::zero()).unwrap();
        assert_eq!(storage.get(&db, addr, 1.into()).unwrap(), Word::zero());
    }

    #[test]
    fn discard_drops_journal_created_after_snapshot() {
        let db = InMemoryDatabase::new();
        let mut storage = AccountStorageDB::new();
        let addr_before = Address::repeat_byte(0x01);
        let addr_after = Address::repeat_byte(0x02);

        storage.set(&db, addr_before, 1.into(), 7.into()).unwrap();
        let cp = crate::journal::next_checkpoint_id();
        storage.record_with_id(cp).unwrap();

        storage.set(&db, addr_before, 1.into(), 99.into()).unwrap();
        storage.set(&db, addr_after, 1.into(), 5.into()).unwrap();

        storage.discard(cp).unwrap();
        assert_eq!(storage.get(&db, addr_before, 1.into()).unwrap(), 7.into());
        assert_eq!(storage.get(&db, addr_after, 1.into()).unwrap(), Word::zero());
    }
}
