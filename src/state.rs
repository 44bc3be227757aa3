//! The `State` facade: a uniform API over the four journals, tied to a
//! state-root token for snapshot/revert/commit, plus block context and the
//! EIP-2929 warm-address/storage bookkeeping.

use crate::constants::BLOCK_HASH_WINDOW;
use crate::db::account_info::AccountInfoDB;
use crate::db::account_storage::AccountStorageDB;
use crate::db::code::CodeDB;
use crate::db::transient::TransientDB;
use crate::db::Database;
use crate::errors::{DatabaseError, ValidationError};
use crate::execution_context::ExecutionContext;
use crate::oracle::BlockHashOracle;
use crate::types::{Account, Address, Code, Hash32, Word};
use std::collections::HashSet;

/// An opaque token identifying a point in state history a `revert`/`commit`
/// pair is anchored to. The checkpoint id is the only part that matters
/// for correctness; `state_root` is carried for interface completeness
/// (see `DESIGN.md` on stub state roots) and is just the checkpoint id
/// reinterpreted as 32 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub state_root: Hash32,
    checkpoint_id: u64,
}

pub struct State<'a> {
    pub db: &'a mut dyn Database,
    pub oracle: &'a dyn BlockHashOracle,
    pub context: ExecutionContext,
    accounts: AccountInfoDB,
    storage: AccountStorageDB,
    code: CodeDB,
    transient: TransientDB,
    warm_addresses: HashSet<Address>,
    warm_storage: HashSet<(Address, Word)>,
}

impl<'a> State<'a> {
    pub fn new(db: &'a mut dyn Database, oracle: &'a dyn BlockHashOracle, context: ExecutionContext) -> Self {
        Self {
            db,
            oracle,
            context,
            accounts: AccountInfoDB::new(),
            storage: AccountStorageDB::new(),
            code: CodeDB::new(),
            transient: TransientDB::new(),
            warm_addresses: HashSet::new(),
            warm_storage: HashSet::new(),
        }
    }

    pub fn get_account(&mut self, address: Address) -> Result<Account, DatabaseError> {
        self.accounts.get(self.db, address)
    }

    pub fn set_account(&mut self, address: Address, account: Account) {
        self.accounts.set(address, account);
    }

    pub fn get_balance(&mut self, address: Address) -> Result<Word, DatabaseError> {
        Ok(self.get_account(address)?.balance)
    }

    pub fn set_balance(&mut self, address: Address, balance: Word) -> Result<(), DatabaseError> {
        let mut account = self.get_account(address)?;
        account.balance = balance;
        self.set_account(address, account);
        Ok(())
    }

    pub fn get_nonce(&mut self, address: Address) -> Result<u64, DatabaseError> {
        Ok(self.get_account(address)?.nonce)
    }

    pub fn increment_nonce(&mut self, address: Address) -> Result<u64, DatabaseError> {
        let mut account = self.get_account(address)?;
        account.nonce = account.nonce.saturating_add(1);
        let nonce = account.nonce;
        self.set_account(address, account);
        Ok(nonce)
    }

    pub fn get_code(&mut self, address: Address) -> Result<Code, DatabaseError> {
        let account = self.get_account(address)?;
        self.code.get(self.db, account.code_hash)
    }

    pub fn get_code_by_hash(&mut self, code_hash: Hash32) -> Result<Code, DatabaseError> {
        self.code.get(self.db, code_hash)
    }

    pub fn set_code(&mut self, address: Address, code: Code) -> Result<(), DatabaseError> {
        let hash = self.code.set(code);
        let mut account = self.get_account(address)?;
        account.code_hash = hash;
        self.set_account(address, account);
        Ok(())
    }

    pub fn get_storage(&mut self, address: Address, slot: Word) -> Result<Word, DatabaseError> {
        self.storage.get(self.db, address, slot)
    }

    pub fn set_storage(&mut self, address: Address, slot: Word, value: Word) -> Result<(), DatabaseError> {
        self.storage.set(self.db, address, slot, value)
    }

    pub fn get_transient(&mut self, address: Address, slot: Word) -> Word {
        self.transient.get(address, slot)
    }

    pub fn set_transient(&mut self, address: Address, slot: Word, value: Word) {
        self.transient.set(address, slot, value);
    }

    pub fn clear_transient_for_new_transaction(&mut self) {
        self.transient.clear_for_new_transaction();
        self.warm_addresses.clear();
        self.warm_storage.clear();
    }

    pub fn is_address_warm(&self, address: Address) -> bool {
        self.warm_addresses.contains(&address) || is_precompile(address)
    }

    pub fn mark_address_warm(&mut self, address: Address) {
        self.warm_addresses.insert(address);
    }

    pub fn is_storage_warm(&self, address: Address, slot: Word) -> bool {
        self.warm_storage.contains(&(address, slot))
    }

    pub fn mark_storage_warm(&mut self, address: Address, slot: Word) {
        self.warm_storage.insert((address, slot));
    }

    /// Returns the hash of block `n` if it lies within the 256-block
    /// window preceding the current block; `None` otherwise, including
    /// when the oracle itself has no answer.
    pub fn get_ancestor_hash(&self, n: u64) -> Option<Hash32> {
        let current = self.context.block_number;
        if n >= current {
            return None;
        }
        let distance = current - n;
        if distance == 0 || distance > BLOCK_HASH_WINDOW {
            return None;
        }
        self.oracle.get_block_hash(n).ok().flatten()
    }

    /// Records a joint checkpoint across the account-info, storage, code
    /// and transient tiers, all sharing one id so a single `revert`/
    /// `commit` rolls back (or locks in) all four together.
    pub fn snapshot(&mut self) -> Result<Snapshot, ValidationError> {
        let id = crate::journal::next_checkpoint_id();
        self.accounts.record_with_id(id)?;
        self.storage.record_with_id(id)?;
        self.code.record_with_id(id)?;
        self.transient.record_with_id(id)?;
        let mut root_bytes = [0u8; 32];
        root_bytes[24..].copy_from_slice(&id.to_be_bytes());
        Ok(Snapshot {
            state_root: Hash32::from(root_bytes),
            checkpoint_id: id,
        })
    }

    pub fn revert(&mut self, snapshot: Snapshot) -> Result<(), ValidationError> {
        self.accounts.discard(snapshot.checkpoint_id)?;
        self.storage.discard(snapshot.checkpoint_id)?;
        self.code.discard(snapshot.checkpoint_id)?;
        self.transient.discard(snapshot.checkpoint_id)?;
        Ok(())
    }

    pub fn commit(&mut self, snapshot: Snapshot) -> Result<(), ValidationError> {
        self.accounts.commit(snapshot.checkpoint_id)?;
        self.storage.commit(snapshot.checkpoint_id)?;
        self.code.commit(snapshot.checkpoint_id)?;
        self.transient.commit(snapshot.checkpoint_id)?;
        Ok(())
    }

    /// Flushes every journal's overlay diff down to the backing store.
    pub fn persist(&mut self) {
        self.accounts.persist(self.db);
        self.storage.persist(self.db);
        self.code.persist(self.db);
    }
}

fn is_precompile(address: Address) -> bool {
    let bytes = address.as_bytes();
    bytes[..19].iter().all(|b| *b == 0) && (1..=10).contains(&bytes[19])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_store::InMemoryDatabase;
    use crate::oracle::NullOracle;

    #[test]
    fn snapshot_revert_round_trips_balance() {
        let mut db = InMemoryDatabase::new();
        let oracle = NullOracle;
        let mut state = State::new(&mut db, &oracle, ExecutionContext::genesis(1));
        let addr = Address::repeat_byte(0x09);
        state.set_balance(addr, Word::from(10)).unwrap();

        let snap = state.snapshot().unwrap();
        state.set_balance(addr, Word::from(999)).unwrap();
        state.revert(snap).unwrap();

        assert_eq!(state.get_balance(addr).unwrap(), Word::from(10));
    }

    #[test]
    fn commit_then_discard_of_ancestor_fails() {
        let mut db = InMemoryDatabase::new();
        let oracle = NullOracle;
        let mut state = State::new(&mut db, &oracle, ExecutionContext::genesis(1));
        let outer = state.snapshot().unwrap();
        let inner = state.snapshot().unwrap();
        state.commit(inner).unwrap();
        state.commit(outer).unwrap();
        assert!(state.revert(outer).is_err());
    }
}
