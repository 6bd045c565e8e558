//! Durable state access
//!
//! The engine never owns its state. Every read and write goes through an
//! ordered key-value store supplied by the host state machine. Iteration is
//! always in ascending key order so every replica walks records identically.

pub mod branch;
pub mod codec;
pub mod keys;
pub mod memory;

pub use branch::BranchStore;
pub use memory::MemStore;

/// Ordered key-value store with prefix iteration.
///
/// Writes are infallible at this level: the host store either applies them or
/// aborts the whole block.
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    fn set(&mut self, key: &[u8], value: Vec<u8>);

    fn delete(&mut self, key: &[u8]);

    /// All entries whose key starts with `prefix`, ascending by key
    fn prefix_entries(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)>;

    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Delete every entry under `prefix`
    fn delete_prefix(&mut self, prefix: &[u8]) {
        let keys: Vec<Vec<u8>> = self
            .prefix_entries(prefix)
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        for key in keys {
            self.delete(&key);
        }
    }
}
