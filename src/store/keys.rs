//! Key layout. One single-byte prefix per persisted entity.
//!
//! Composite keys join denoms with a 0x00 separator; validated denoms never
//! contain that byte, so prefix scans cannot bleed across entries.

use crate::types::{Denom, DenomPair};

pub const PREFIX_TOKEN_PAIR_ROUTES: &[u8] = &[0x01];
pub const PREFIX_BASE_DENOMS: &[u8] = &[0x02];
pub const PREFIX_DENOM_PAIR_POOL: &[u8] = &[0x03];
pub const KEY_ENGINE_CONFIG: &[u8] = &[0x04];
pub const KEY_POINT_COUNTER: &[u8] = &[0x05];
pub const PREFIX_DEVELOPER_FEES: &[u8] = &[0x06];
pub const KEY_MODULE_GENESIS_TIME: &[u8] = &[0x07];
pub const KEY_NUMBER_OF_TRADES: &[u8] = &[0x08];
pub const PREFIX_PROFITS_BY_DENOM: &[u8] = &[0x09];

const SEPARATOR: u8 = 0x00;

fn join(prefix: &[u8], parts: &[&str]) -> Vec<u8> {
    let mut key = prefix.to_vec();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            key.push(SEPARATOR);
        }
        key.extend_from_slice(part.as_bytes());
    }
    key
}

pub fn token_pair_routes(pair: &DenomPair) -> Vec<u8> {
    join(
        PREFIX_TOKEN_PAIR_ROUTES,
        &[pair.token_a.as_str(), pair.token_b.as_str()],
    )
}

/// Big-endian index keeps list order equal to key order
pub fn base_denom(index: u64) -> Vec<u8> {
    let mut key = PREFIX_BASE_DENOMS.to_vec();
    key.extend_from_slice(&index.to_be_bytes());
    key
}

pub fn denom_pair_pool(base: &Denom, counter: &Denom) -> Vec<u8> {
    join(PREFIX_DENOM_PAIR_POOL, &[base.as_str(), counter.as_str()])
}

/// Prefix of every cached pool entry for `base`
pub fn denom_pair_pool_prefix(base: &Denom) -> Vec<u8> {
    let mut key = join(PREFIX_DENOM_PAIR_POOL, &[base.as_str()]);
    key.push(SEPARATOR);
    key
}

pub fn developer_fees(denom: &Denom) -> Vec<u8> {
    join(PREFIX_DEVELOPER_FEES, &[denom.as_str()])
}

pub fn profits_by_denom(denom: &Denom) -> Vec<u8> {
    join(PREFIX_PROFITS_BY_DENOM, &[denom.as_str()])
}
