//! The backing key/value store and the four journals layered over it.

pub mod account_info;
pub mod account_storage;
pub mod code;
pub mod memory_store;
pub mod transient;

use crate::errors::DatabaseError;
use crate::types::{Account, Address, Code, Hash32, Word};

/// The externally-supplied persistence tier. A `K -> V` sink with three
/// logical tables (account, account storage, code); trie construction,
/// SQL engines, and RPC-backed stores are all valid implementations, and
/// out of scope for this crate.
pub trait Database {
    fn get_account(&self, address: Address) -> Result<Account, DatabaseError>;
    fn get_storage(&self, address: Address, slot: Word) -> Result<Word, DatabaseError>;
    fn get_code(&self, code_hash: Hash32) -> Result<Code, DatabaseError>;
    fn get_block_hash(&self, block_number: u64) -> Result<Option<Hash32>, DatabaseError>;

    fn set_account(&mut self, address: Address, account: Account) -> Result<(), DatabaseError>;
    fn delete_account(&mut self, address: Address) -> Result<(), DatabaseError>;
    fn set_storage(&mut self, address: Address, slot: Word, value: Word)
    -> Result<(), DatabaseError>;
    fn delete_storage(&mut self, address: Address, slot: Word) -> Result<(), DatabaseError>;
    fn set_code(&mut self, code_hash: Hash32, code: Code) -> Result<(), DatabaseError>;
}
