//! Checkpoint-stacked overlay over an underlying key/value store.
//!
//! This is the shared primitive behind every tier of state: account info,
//! per-address storage, code, and transient storage each wrap one
//! `Journal<K, V>` (storage wraps one per touched address). Checkpoint ids
//! are handed out from a single crate-global monotonic counter so that a
//! `State`-level `snapshot()` can record one id across all four tiers and
//! use it to roll back (or commit) all of them together.

use crate::errors::ValidationError;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CHECKPOINT_ID: AtomicU64 = AtomicU64::new(1);

/// Checkpoint 0 is reserved for the journal's base state and can never be
/// committed or discarded directly (`commit`/`discard` of it is an error;
/// use `persist`/`clear` instead).
pub const ROOT_CHECKPOINT: u64 = 0;

/// Allocates the next globally-unique checkpoint id.
pub fn next_checkpoint_id() -> u64 {
    NEXT_CHECKPOINT_ID.fetch_add(1, Ordering::Relaxed)
}

/// What a key resolved to in the overlay, before consulting the base store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay<V> {
    /// The key has this value in the overlay.
    Value(V),
    /// The key was explicitly deleted in the overlay; do not fall through
    /// to the base store.
    Deleted,
    /// The key has never been touched in the overlay; the caller should
    /// consult the base store.
    Absent,
}

/// The value to restore a key to when discarding a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Prior<V> {
    /// The key wasn't present in the overlay before this checkpoint; on
    /// discard, remove it from the overlay so reads fall through to the
    /// base store again.
    RevertToDb,
    /// The key was an explicit tombstone before this checkpoint.
    Deleted,
    /// The key had this concrete overlay value before this checkpoint.
    Value(V),
}

struct CheckpointFrame<K, V> {
    id: u64,
    changeset: FxHashMap<K, Prior<V>>,
}

/// A checkpointed overlay over a `K -> V` mapping.
pub struct Journal<K, V> {
    current_values: FxHashMap<K, V>,
    deleted: std::collections::HashSet<K>,
    stack: Vec<CheckpointFrame<K, V>>,
    /// Keys that have been read or written at least once. Used by journals
    /// (account info, code) where deleting an unaccessed key is an error.
    accessed: std::collections::HashSet<K>,
    track_accessed: bool,
}

impl<K, V> Journal<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            current_values: FxHashMap::default(),
            deleted: std::collections::HashSet::new(),
            stack: vec![CheckpointFrame {
                id: ROOT_CHECKPOINT,
                changeset: FxHashMap::default(),
            }],
            accessed: std::collections::HashSet::new(),
            track_accessed: false,
        }
    }

    pub fn with_accessed_tracking() -> Self {
        let mut j = Self::new();
        j.track_accessed = true;
        j
    }

    /// Records a new checkpoint and returns its id.
    pub fn record(&mut self) -> u64 {
        let id = next_checkpoint_id();
        self.stack.push(CheckpointFrame {
            id,
            changeset: FxHashMap::default(),
        });
        id
    }

    /// Records a checkpoint under a caller-supplied id, so several journals
    /// can share one id (used by `State::snapshot` to roll back the
    /// account-info, storage, code and transient tiers together).
    pub fn record_with_id(&mut self, id: u64) -> Result<(), ValidationError> {
        if self.stack.iter().any(|f| f.id == id) {
            return Err(ValidationError::UnknownCheckpoint(id));
        }
        self.stack.push(CheckpointFrame {
            id,
            changeset: FxHashMap::default(),
        });
        Ok(())
    }

    fn overlay_entry(&self, key: &K) -> Overlay<V>
    where
        V: Clone,
    {
        if self.deleted.contains(key) {
            Overlay::Deleted
        } else if let Some(v) = self.current_values.get(key) {
            Overlay::Value(v.clone())
        } else {
            Overlay::Absent
        }
    }

    pub fn get(&mut self, key: &K) -> Overlay<V> {
        if self.track_accessed {
            self.accessed.insert(key.clone());
        }
        self.overlay_entry(key)
    }

    /// Like `get` but does not mark the key as accessed; used internally
    /// and by read-only inspection helpers.
    pub fn peek(&self, key: &K) -> Overlay<V> {
        self.overlay_entry(key)
    }

    fn capture_prior(&mut self, key: &K) {
        let needs_prior = !self
            .stack
            .last()
            .expect("journal always has at least the root checkpoint")
            .changeset
            .contains_key(key);
        let prior = if needs_prior {
            Some(match self.overlay_entry(key) {
                Overlay::Value(v) => Prior::Value(v),
                Overlay::Deleted => Prior::Deleted,
                Overlay::Absent => Prior::RevertToDb,
            })
        } else {
            None
        };
        let top = self
            .stack
            .last_mut()
            .expect("journal always has at least the root checkpoint");
        if let Entry::Vacant(e) = top.changeset.entry(key.clone()) {
            if let Some(prior) = prior {
                e.insert(prior);
            }
        }
    }

    pub fn set(&mut self, key: K, value: V) {
        if self.track_accessed {
            self.accessed.insert(key.clone());
        }
        self.capture_prior(&key);
        self.deleted.remove(&key);
        self.current_values.insert(key, value);
    }

    pub fn delete(&mut self, key: &K) -> Result<(), ValidationError> {
        if self.track_accessed && !self.accessed.contains(key) {
            return Err(ValidationError::DeleteOfUnaccessedKey);
        }
        self.capture_prior(key);
        self.current_values.remove(key);
        self.deleted.insert(key.clone());
        Ok(())
    }

    /// Pops all checkpoints on or above `cp`, keeping `current_values` as
    /// is. Checkpoints below `cp` remain reachable for a later discard.
    pub fn commit(&mut self, cp: u64) -> Result<(), ValidationError> {
        if cp == ROOT_CHECKPOINT {
            return Err(ValidationError::RootCheckpoint);
        }
        let pos = self.position_of(cp)?;
        self.stack.truncate(pos);
        Ok(())
    }

    /// Pops checkpoints back through and including `cp`, applying their
    /// revert-changesets in reverse (newest-first) order so that the
    /// oldest touched checkpoint's captured prior value wins.
    pub fn discard(&mut self, cp: u64) -> Result<(), ValidationError> {
        if cp == ROOT_CHECKPOINT {
            return Err(ValidationError::RootCheckpoint);
        }
        let pos = self.position_of(cp)?;
        let popped: Vec<_> = self.stack.drain(pos..).collect();
        for frame in popped.into_iter().rev() {
            for (key, prior) in frame.changeset {
                match prior {
                    Prior::RevertToDb => {
                        self.current_values.remove(&key);
                        self.deleted.remove(&key);
                    }
                    Prior::Deleted => {
                        self.current_values.remove(&key);
                        self.deleted.insert(key);
                    }
                    Prior::Value(v) => {
                        self.deleted.remove(&key);
                        self.current_values.insert(key, v);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn contains_checkpoint(&self, cp: u64) -> bool {
        self.stack.iter().any(|f| f.id == cp)
    }

    fn position_of(&self, cp: u64) -> Result<usize, ValidationError> {
        self.stack
            .iter()
            .position(|f| f.id == cp)
            .ok_or(ValidationError::UnknownCheckpoint(cp))
    }

    /// `true` if there is at least one checkpoint above the root, i.e. this
    /// journal has uncommitted, discardable state.
    pub fn has_open_checkpoint(&self) -> bool {
        self.stack.len() > 1
    }

    /// Applies the overlay diff to a base store via the given writers, then
    /// resets to a single root checkpoint.
    pub fn persist<SetFn, DelFn>(&mut self, mut set_in_base: SetFn, mut delete_in_base: DelFn)
    where
        SetFn: FnMut(&K, &V),
        DelFn: FnMut(&K),
    {
        for (k, v) in self.current_values.iter() {
            set_in_base(k, v);
        }
        for k in self.deleted.iter() {
            delete_in_base(k);
        }
        self.current_values.clear();
        self.deleted.clear();
        self.accessed.clear();
        self.stack = vec![CheckpointFrame {
            id: ROOT_CHECKPOINT,
            changeset: FxHashMap::default(),
        }];
    }

    /// Snapshots the full overlay verbatim and resets it to empty, as if
    /// the underlying store had just been wiped. The special checkpoint's
    /// revert-changeset captures the prior `current_values`/`deleted`
    /// state so a subsequent `discard` restores it.
    pub fn clear(&mut self) -> u64 {
        let id = next_checkpoint_id();
        let mut changeset = FxHashMap::default();
        for (k, v) in self.current_values.drain() {
            changeset.insert(k, Prior::Value(v));
        }
        for k in self.deleted.drain() {
            changeset.insert(k, Prior::Deleted);
        }
        self.stack.push(CheckpointFrame { id, changeset });
        id
    }
}

impl<K, V> Default for Journal<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
