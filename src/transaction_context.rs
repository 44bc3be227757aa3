//! Immutable per-transaction descriptor shared by every frame spawned
//! while executing it, plus the log sequence counter and the
//! same-transaction creation bookkeeping EIP-6780 needs.

use crate::types::{Address, Hash32};
use std::cell::Cell;
use std::collections::HashSet;

pub struct TransactionContext {
    pub gas_price: ethereum_types::U256,
    pub origin: Address,
    pub blob_versioned_hashes: Vec<Hash32>,
    log_counter: Cell<u64>,
    /// Addresses whose contract code was deployed by a CREATE/CREATE2
    /// within this transaction. SELFDESTRUCT (post-Cancun, EIP-6780) only
    /// schedules a deletion for addresses found here.
    contracts_created: std::cell::RefCell<HashSet<Address>>,
}

impl TransactionContext {
    pub fn new(gas_price: ethereum_types::U256, origin: Address) -> Self {
        Self {
            gas_price,
            origin,
            blob_versioned_hashes: Vec::new(),
            log_counter: Cell::new(0),
            contracts_created: std::cell::RefCell::new(HashSet::new()),
        }
    }

    pub fn with_blob_hashes(mut self, hashes: Vec<Hash32>) -> Self {
        self.blob_versioned_hashes = hashes;
        self
    }

    /// Assigns and returns the next transaction-global log sequence number.
    pub fn next_log_sequence(&self) -> u64 {
        let next = self.log_counter.get();
        self.log_counter.set(next + 1);
        next
    }

    pub fn record_contract_created(&self, address: Address) {
        self.contracts_created.borrow_mut().insert(address);
    }

    pub fn was_created_in_this_transaction(&self, address: Address) -> bool {
        self.contracts_created.borrow().contains(&address)
    }
}
