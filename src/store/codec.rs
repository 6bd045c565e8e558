//! Record codec
//!
//! Persisted records are serde types encoded as JSON. The only contract is
//! that a record read back equals the record written.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::KvStore;
use crate::error::Result;

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Read and decode a record, `None` when the key is absent
pub fn load<T: DeserializeOwned>(store: &dyn KvStore, key: &[u8]) -> Result<Option<T>> {
    store.get(key).map(|bz| decode(&bz)).transpose()
}

pub fn save<T: Serialize>(store: &mut dyn KvStore, key: &[u8], value: &T) -> Result<()> {
    let bz = encode(value)?;
    store.set(key, bz);
    Ok(())
}

/// Decode every record under `prefix`, in key order
pub fn load_all<T: DeserializeOwned>(store: &dyn KvStore, prefix: &[u8]) -> Result<Vec<T>> {
    store
        .prefix_entries(prefix)
        .iter()
        .map(|(_, bz)| decode(bz))
        .collect()
}
