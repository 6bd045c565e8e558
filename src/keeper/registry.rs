//! Route Registry
//!
//! Registered cyclic routes per token pair, the priority-ordered base denom
//! list, and the highest-liquidity pool index.
//!
//! Design:
//!     - Pair keys are canonical, so (A, B) and (B, A) hit the same record
//!     - Base denoms are stored one per big-endian index; replacing the list
//!       deletes the old entries first, so a shorter list leaves no tail
//!     - The pool index is a cache: missing entries only skip a candidate
//!     - List-all walks are for genesis export and queries, never the hot path

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{EngineError, Result};
use crate::store::{codec, keys, KvStore};
use crate::types::{ArbRoute, BaseDenom, Denom, DenomPair, DenomPairPool, PoolId, TokenPairArbRoutes};

// ---------------------------------------------------------------------------
// Token pair routes
// ---------------------------------------------------------------------------

pub fn get_routes(store: &dyn KvStore, a: &Denom, b: &Denom) -> Result<TokenPairArbRoutes> {
    let pair = DenomPair::canonical(a, b);
    codec::load(store, &keys::token_pair_routes(&pair))?
        .ok_or_else(|| EngineError::not_found(format!("no routes found for token pair {}", pair)))
}

/// Replace the routes registered for the pair (a, b).
///
/// Every route must be a valid cycle of at most `max_hops` hops that trades
/// through the pair itself. An empty list removes the record.
pub fn set_routes(
    store: &mut dyn KvStore,
    a: &Denom,
    b: &Denom,
    routes: Vec<ArbRoute>,
    max_hops: usize,
) -> Result<()> {
    if a == b {
        return Err(EngineError::invalid(format!("token pair {}/{} is degenerate", a, b)));
    }
    let pair = DenomPair::canonical(a, b);
    for route in &routes {
        route.validate(max_hops)?;
        if !route.hops.iter().any(|hop| hop.touches(a, b)) {
            return Err(EngineError::invalid(format!(
                "route {} never trades the pair {}",
                route, pair
            )));
        }
    }

    let key = keys::token_pair_routes(&pair);
    if routes.is_empty() {
        store.delete(&key);
        debug!("Routes cleared for {}", pair);
        return Ok(());
    }

    debug!("Registering {} routes for {}", routes.len(), pair);
    codec::save(store, &key, &TokenPairArbRoutes { pair, routes })
}

/// All registered routes, in canonical pair key order
pub fn get_all_routes(store: &dyn KvStore) -> Result<Vec<TokenPairArbRoutes>> {
    codec::load_all(store, keys::PREFIX_TOKEN_PAIR_ROUTES)
}

pub fn delete_all_routes(store: &mut dyn KvStore) {
    store.delete_prefix(keys::PREFIX_TOKEN_PAIR_ROUTES);
}

// ---------------------------------------------------------------------------
// Base denoms
// ---------------------------------------------------------------------------

/// Base denoms in priority order (index 0 = highest priority)
pub fn get_base_denoms(store: &dyn KvStore) -> Result<Vec<BaseDenom>> {
    codec::load_all(store, keys::PREFIX_BASE_DENOMS)
}

pub fn validate_base_denoms(base_denoms: &[BaseDenom]) -> Result<()> {
    if base_denoms.is_empty() {
        return Err(EngineError::invalid("base denom list must not be empty"));
    }
    let mut seen = BTreeSet::new();
    for base in base_denoms {
        if !seen.insert(&base.denom) {
            return Err(EngineError::invalid(format!(
                "base denom {} listed twice",
                base.denom
            )));
        }
        if base.step_size.is_zero() {
            return Err(EngineError::invalid(format!(
                "base denom {} has a zero step size",
                base.denom
            )));
        }
    }
    Ok(())
}

/// Replace the whole base denom list. List order is search priority.
pub fn set_base_denoms(store: &mut dyn KvStore, base_denoms: &[BaseDenom]) -> Result<()> {
    validate_base_denoms(base_denoms)?;

    let encoded = base_denoms
        .iter()
        .map(codec::encode)
        .collect::<Result<Vec<_>>>()?;

    store.delete_prefix(keys::PREFIX_BASE_DENOMS);
    for (index, bz) in encoded.into_iter().enumerate() {
        store.set(&keys::base_denom(index as u64), bz);
    }
    Ok(())
}

/// Position of `denom` in the priority list
pub fn base_denom_position(base_denoms: &[BaseDenom], denom: &Denom) -> Option<usize> {
    base_denoms.iter().position(|b| &b.denom == denom)
}

// ---------------------------------------------------------------------------
// Highest-liquidity pool index
// ---------------------------------------------------------------------------

pub fn get_highest_liquidity_pool(store: &dyn KvStore, base: &Denom, counter: &Denom) -> Result<PoolId> {
    let entry: Option<DenomPairPool> = codec::load(store, &keys::denom_pair_pool(base, counter))?;
    entry.map(|e| e.pool_id).ok_or_else(|| {
        EngineError::not_found(format!(
            "highest liquidity pool between base {} and match denom {} not found",
            base, counter
        ))
    })
}

pub fn set_highest_liquidity_pool(
    store: &mut dyn KvStore,
    base: &Denom,
    counter: &Denom,
    pool_id: PoolId,
) -> Result<()> {
    if base == counter {
        return Err(EngineError::invalid(format!("pool index entry {}/{} is degenerate", base, counter)));
    }
    let entry = DenomPairPool {
        base: base.clone(),
        counter: counter.clone(),
        pool_id,
    };
    codec::save(store, &keys::denom_pair_pool(base, counter), &entry)
}

pub fn get_all_denom_pair_pools(store: &dyn KvStore) -> Result<Vec<DenomPairPool>> {
    codec::load_all(store, keys::PREFIX_DENOM_PAIR_POOL)
}

/// Drop every cached pool for `base` (used when the base list changes)
pub fn delete_all_pools_for_base(store: &mut dyn KvStore, base: &Denom) {
    store.delete_prefix(&keys::denom_pair_pool_prefix(base));
}
