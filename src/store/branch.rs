//! Scoped state branch (snapshot / rollback)
//!
//! A `BranchStore` buffers every write on top of a parent store. `commit`
//! flushes the buffer into the parent as one unit; dropping the branch
//! without committing discards it, leaving the parent untouched. Branches
//! nest: a branch is itself a `KvStore`.

use std::collections::BTreeMap;

use super::KvStore;

pub struct BranchStore<'a> {
    parent: &'a mut dyn KvStore,
    /// `None` marks a pending delete
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> BranchStore<'a> {
    pub fn new(parent: &'a mut dyn KvStore) -> Self {
        Self {
            parent,
            pending: BTreeMap::new(),
        }
    }

    /// Number of buffered writes and deletes
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Apply all buffered writes to the parent, in key order.
    pub fn commit(self) {
        let BranchStore { parent, pending } = self;
        for (key, value) in pending {
            match value {
                Some(v) => parent.set(&key, v),
                None => parent.delete(&key),
            }
        }
    }

    /// Drop all buffered writes.
    pub fn discard(self) {}
}

impl KvStore for BranchStore<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.pending.get(key) {
            Some(buffered) => buffered.clone(),
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        self.pending.insert(key.to_vec(), Some(value));
    }

    fn delete(&mut self, key: &[u8]) {
        self.pending.insert(key.to_vec(), None);
    }

    fn prefix_entries(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.prefix_entries(prefix).into_iter().collect();
        let overlay = self
            .pending
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix));
        for (key, value) in overlay {
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        merged.into_iter().collect()
    }
}
