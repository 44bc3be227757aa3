//! An in-memory `Database` implementation, suitable for tests and the
//! example binary. A production embedder would swap this for a
//! trie-backed or RPC-backed store without touching the interpreter.

use super::Database;
use crate::errors::DatabaseError;
use crate::types::{Account, Address, Code, Hash32, Word};
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub struct InMemoryDatabase {
    accounts: FxHashMap<Address, Account>,
    storage: FxHashMap<(Address, Word), Word>,
    code: FxHashMap<Hash32, Code>,
    block_hashes: FxHashMap<u64, Hash32>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_block_hash(&mut self, number: u64, hash: Hash32) {
        self.block_hashes.insert(number, hash);
    }
}

impl Database for InMemoryDatabase {
    fn get_account(&self, address: Address) -> Result<Account, DatabaseError> {
        Ok(self.accounts.get(&address).copied().unwrap_or_default())
    }

    fn get_storage(&self, address: Address, slot: Word) -> Result<Word, DatabaseError> {
        Ok(self
            .storage
            .get(&(address, slot))
            .copied()
            .unwrap_or_else(Word::zero))
    }

    fn get_code(&self, code_hash: Hash32) -> Result<Code, DatabaseError> {
        Ok(self.code.get(&code_hash).cloned().unwrap_or_default())
    }

    fn get_block_hash(&self, block_number: u64) -> Result<Option<Hash32>, DatabaseError> {
        Ok(self.block_hashes.get(&block_number).copied())
    }

    fn set_account(&mut self, address: Address, account: Account) -> Result<(), DatabaseError> {
        self.accounts.insert(address, account);
        Ok(())
    }

    fn delete_account(&mut self, address: Address) -> Result<(), DatabaseError> {
        self.accounts.remove(&address);
        Ok(())
    }

    fn set_storage(
        &mut self,
        address: Address,
        slot: Word,
        value: Word,
    ) -> Result<(), DatabaseError> {
        self.storage.insert((address, slot), value);
        Ok(())
    }

    fn delete_storage(&mut self, address: Address, slot: Word) -> Result<(), DatabaseError> {
        self.storage.remove(&(address, slot));
        Ok(())
    }

    fn set_code(&mut self, code_hash: Hash32, code: Code) -> Result<(), DatabaseError> {
        self.code.insert(code_hash, code);
        Ok(())
    }
}
