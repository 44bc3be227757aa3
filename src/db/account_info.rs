//! Per-address account metadata (nonce, balance, code hash, storage root),
//! journaled over the backing store. Tracks accessed addresses so that a
//! `delete` of an address nobody ever read or wrote is rejected, exactly as
//! the reference journal's "accessed" bookkeeping does.

use super::Database;
use crate::errors::{DatabaseError, ValidationError};
use crate::journal::{Journal, Overlay};
use crate::types::{Account, Address};

#[derive(Default)]
pub struct AccountInfoDB {
    journal: Journal<Address, Account>,
}

impl AccountInfoDB {
    pub fn new() -> Self {
        Self {
            journal: Journal::with_accessed_tracking(),
        }
    }

    pub fn get(&mut self, db: &dyn Database, address: Address) -> Result<Account, DatabaseError> {
        match self.journal.get(&address) {
            Overlay::Value(account) => Ok(account),
            Overlay::Deleted => Ok(Account::empty()),
            Overlay::Absent => db.get_account(address),
        }
    }

    pub fn set(&mut self, address: Address, account: Account) {
        self.journal.set(address, account);
    }

    pub fn delete(&mut self, address: Address) -> Result<(), ValidationError> {
        self.journal.delete(&address)
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
        let mut pending_deletes = Vec::new();
        self.journal.persist(
            |addr, acc| pending_sets.push((*addr, *acc)),
            |addr| pending_deletes.push(*addr),
        );
        for (addr, acc) in pending_sets {
            let _ = db.set_account(addr, acc);
        }
        for addr in pending_deletes {
            let _ = db.delete_account(addr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_store::InMemoryDatabase;

    #[test]
    fn unread_address_cannot_be_deleted() {
        let mut accounts = AccountInfoDB::new();
        assert!(accounts.delete(Address::zero()).is_err());
    }

    #[test]
    fn snapshot_revert_restores_prior_balance() {
        let db = InMemoryDatabase::new();
        let mut accounts = AccountInfoDB::new();
        let addr = Address::repeat_byte(0x11);
        let mut acc = accounts.get(&db, addr).unwrap();
        acc.balance = 10.into();
        accounts.set(addr, acc);

        let cp = crate::journal::next_checkpoint_id();
        accounts.record_with_id(cp).unwrap();
        let mut acc2 = accounts.get(&db, addr).unwrap();
        acc2.balance = 999.into();
        accounts.set(addr, acc2);

        accounts.discard(cp).unwrap();
        let restored = accounts.get(&db, addr).unwrap();
        assert_eq!(restored.balance, 10.into());
    }
}
