//! Point Budget Ledger
//!
//! Meters the work the engine does per transaction and per block. A pool
//! point stands in for simulation + execution time: each hop costs the
//! weight of its pool type, each cycle a flat overhead on top.
//!
//! Design:
//!     - The block counter resets lazily, the first time a height is seen
//!     - `try_consume` either debits in full or leaves state untouched
//!     - Ceiling setters validate before writing; nothing applies partially

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::params::{self, EngineConfig};
use crate::collaborators::PricingEngine;
use crate::error::{EngineError, Result};
use crate::store::{codec, keys, KvStore};
use crate::types::{ArbRoute, BudgetState, PoolWeights};

/// Persisted per-block consumption
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointCounter {
    pub consumed: u64,
    pub latest_block_height: u64,
}

pub fn load_counter(store: &dyn KvStore) -> Result<PointCounter> {
    codec::load(store, keys::KEY_POINT_COUNTER)?
        .ok_or_else(|| EngineError::not_found("point counter has not been initialized at genesis"))
}

pub fn save_counter(store: &mut dyn KvStore, counter: &PointCounter) -> Result<()> {
    codec::save(store, keys::KEY_POINT_COUNTER, counter)
}

pub fn budget_state(store: &dyn KvStore) -> Result<BudgetState> {
    let config = params::load_config(store)?;
    let counter = load_counter(store)?;
    Ok(BudgetState {
        max_points_per_tx: config.max_points_per_tx,
        max_points_per_block: config.max_points_per_block,
        consumed_points_this_block: counter.consumed,
        latest_block_height: counter.latest_block_height,
    })
}

/// Reset the counter when a new height is observed. Returns true on reset.
///
/// Repeated calls at the same height are no-ops. A height below the recorded
/// one is ignored: heights only move forward.
pub fn begin_block(store: &mut dyn KvStore, height: u64) -> Result<bool> {
    let counter = load_counter(store)?;
    if height == counter.latest_block_height {
        return Ok(false);
    }
    if height < counter.latest_block_height {
        warn!(
            "Ignoring block height {} below recorded height {}",
            height, counter.latest_block_height
        );
        return Ok(false);
    }

    debug!(
        "Point budget reset at height {} ({} points used at height {})",
        height, counter.consumed, counter.latest_block_height
    );
    save_counter(
        store,
        &PointCounter {
            consumed: 0,
            latest_block_height: height,
        },
    )?;
    Ok(true)
}

pub fn remaining_block_budget(store: &dyn KvStore) -> Result<u64> {
    Ok(budget_state(store)?.remaining_block_budget())
}

/// Points a single transaction may still spend: `min(per-tx, block remaining)`
pub fn available_for_tx(store: &dyn KvStore) -> Result<u64> {
    let state = budget_state(store)?;
    Ok(state.max_points_per_tx.min(state.remaining_block_budget()))
}

/// Debit `points` if they fit both the per-tx cap and what is left of the
/// block budget. On failure nothing is written.
pub fn try_consume(store: &mut dyn KvStore, points: u64) -> Result<()> {
    let state = budget_state(store)?;
    let remaining = state.remaining_block_budget();
    if points > state.max_points_per_tx || points > remaining {
        return Err(EngineError::BudgetExceeded {
            requested: points,
            remaining: remaining.min(state.max_points_per_tx),
        });
    }
    save_counter(
        store,
        &PointCounter {
            consumed: state.consumed_points_this_block + points,
            latest_block_height: state.latest_block_height,
        },
    )
}

/// Sum of hop pool weights plus the per-cycle overhead
pub fn estimate_cost(
    store: &dyn KvStore,
    config: &EngineConfig,
    pricing: &dyn PricingEngine,
    route: &ArbRoute,
) -> Result<u64> {
    let mut cost = config.search.cycle_overhead_points;
    for hop in &route.hops {
        let pool_type = pricing
            .pool_type(store, hop.pool_id)
            .map_err(|e| EngineError::not_found(format!("pool {}: {}", hop.pool_id, e)))?;
        let weight = config
            .pool_weights
            .weight(pool_type)
            .ok_or_else(|| EngineError::not_found(format!("no point weight for {} pools", pool_type)))?;
        cost = cost.saturating_add(weight);
    }
    Ok(cost)
}

// ---------------------------------------------------------------------------
// Ceilings and weights
// ---------------------------------------------------------------------------

pub fn set_max_points_per_tx(store: &mut dyn KvStore, points: u64) -> Result<()> {
    params::validate_points_per_tx(points)?;
    let mut config = params::load_config(store)?;
    if points > config.max_points_per_block {
        return Err(EngineError::invalid(format!(
            "max points per tx ({}) may not exceed max points per block ({})",
            points, config.max_points_per_block
        )));
    }
    config.max_points_per_tx = points;
    params::save_config(store, &config)?;
    info!("Max points per tx set to {}", points);
    Ok(())
}

/// Lowering the block ceiling below what was already consumed clamps the
/// counter, so `consumed <= max_points_per_block` keeps holding.
pub fn set_max_points_per_block(store: &mut dyn KvStore, points: u64) -> Result<()> {
    params::validate_points_per_block(points)?;
    let mut config = params::load_config(store)?;
    if points < config.max_points_per_tx {
        return Err(EngineError::invalid(format!(
            "max points per block ({}) may not be below max points per tx ({})",
            points, config.max_points_per_tx
        )));
    }
    let mut counter = load_counter(store)?;
    config.max_points_per_block = points;
    params::save_config(store, &config)?;
    if counter.consumed > points {
        counter.consumed = points;
        save_counter(store, &counter)?;
    }
    info!("Max points per block set to {}", points);
    Ok(())
}

/// Merge `weights` into the configured table
pub fn set_pool_weights(store: &mut dyn KvStore, weights: &PoolWeights) -> Result<()> {
    params::validate_pool_weights(weights)?;
    let mut config = params::load_config(store)?;
    for (pool_type, weight) in &weights.0 {
        config.pool_weights.0.insert(*pool_type, *weight);
    }
    params::save_config(store, &config)?;
    info!("Pool weights updated: {:?}", config.pool_weights.0);
    Ok(())
}
