//! Genesis import / export
//!
//! The full persisted state of the engine as one serde document. Import
//! validates everything before the first write; export walks the store in
//! key order, so exporting the same state twice yields identical JSON.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::budget::{self, PointCounter};
use super::params::{self, EngineConfig};
use super::{fees, registry, stats};
use crate::error::{EngineError, Result};
use crate::store::KvStore;
use crate::types::{BaseDenom, Coin, DenomPair, DenomPairPool, TokenPairArbRoutes};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    pub config: EngineConfig,
    #[serde(default)]
    pub token_pair_arb_routes: Vec<TokenPairArbRoutes>,
    #[serde(default)]
    pub base_denoms: Vec<BaseDenom>,
    #[serde(default)]
    pub denom_pair_pools: Vec<DenomPairPool>,
    #[serde(default)]
    pub developer_fees: Vec<Coin>,
    #[serde(default)]
    pub point_counter: PointCounter,
    pub module_genesis_time: DateTime<Utc>,
    #[serde(default)]
    pub number_of_trades: u64,
    #[serde(default)]
    pub profits: Vec<Coin>,
}

impl Default for GenesisState {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            token_pair_arb_routes: Vec::new(),
            base_denoms: Vec::new(),
            denom_pair_pools: Vec::new(),
            developer_fees: Vec::new(),
            point_counter: PointCounter::default(),
            module_genesis_time: DateTime::<Utc>::default(),
            number_of_trades: 0,
            profits: Vec::new(),
        }
    }
}

impl GenesisState {
    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;

        if !self.base_denoms.is_empty() {
            registry::validate_base_denoms(&self.base_denoms)?;
        }

        let mut pairs = BTreeSet::new();
        for entry in &self.token_pair_arb_routes {
            let canonical = DenomPair::canonical(&entry.pair.token_a, &entry.pair.token_b);
            if canonical != entry.pair {
                return Err(EngineError::invalid(format!(
                    "token pair {} is not in canonical order",
                    entry.pair
                )));
            }
            if !pairs.insert(&entry.pair) {
                return Err(EngineError::invalid(format!(
                    "token pair {} listed twice",
                    entry.pair
                )));
            }
            if entry.routes.is_empty() {
                return Err(EngineError::invalid(format!(
                    "token pair {} has no routes",
                    entry.pair
                )));
            }
            if entry.pair.token_a == entry.pair.token_b {
                return Err(EngineError::invalid(format!("token pair {} is degenerate", entry.pair)));
            }
            for route in &entry.routes {
                route.validate(self.config.search.max_hops)?;
                if !route
                    .hops
                    .iter()
                    .any(|hop| hop.touches(&entry.pair.token_a, &entry.pair.token_b))
                {
                    return Err(EngineError::invalid(format!(
                        "route {} never trades the pair {}",
                        route, entry.pair
                    )));
                }
            }
        }

        let mut pools = BTreeSet::new();
        for entry in &self.denom_pair_pools {
            if entry.base == entry.counter || !pools.insert((&entry.base, &entry.counter)) {
                return Err(EngineError::invalid(format!(
                    "invalid pool index entry {}/{}",
                    entry.base, entry.counter
                )));
            }
        }

        unique_denoms(&self.developer_fees, "developer fees")?;
        unique_denoms(&self.profits, "profits")?;
        for fee in &self.developer_fees {
            let booked = self
                .profits
                .iter()
                .find(|p| p.denom == fee.denom)
                .map(|p| p.amount)
                .unwrap_or_default();
            if fee.amount > booked {
                return Err(EngineError::invalid(format!(
                    "developer fees {} exceed booked profit {}",
                    fee, booked
                )));
            }
        }

        if self.point_counter.consumed > self.config.max_points_per_block {
            return Err(EngineError::invalid(format!(
                "consumed points {} exceed max points per block {}",
                self.point_counter.consumed, self.config.max_points_per_block
            )));
        }
        Ok(())
    }
}

fn unique_denoms(coins: &[Coin], what: &str) -> Result<()> {
    let mut seen = BTreeSet::new();
    for coin in coins {
        if !seen.insert(&coin.denom) {
            return Err(EngineError::invalid(format!(
                "{} list {} twice",
                what, coin.denom
            )));
        }
    }
    Ok(())
}

/// Validate `genesis`, then write every record.
pub fn init_genesis(store: &mut dyn KvStore, genesis: &GenesisState) -> Result<()> {
    genesis.validate()?;

    params::save_config(store, &genesis.config)?;
    budget::save_counter(store, &genesis.point_counter)?;
    fees::set_module_genesis_time(store, genesis.module_genesis_time)?;

    let max_hops = genesis.config.search.max_hops;
    for entry in &genesis.token_pair_arb_routes {
        registry::set_routes(
            store,
            &entry.pair.token_a,
            &entry.pair.token_b,
            entry.routes.clone(),
            max_hops,
        )?;
    }
    if !genesis.base_denoms.is_empty() {
        registry::set_base_denoms(store, &genesis.base_denoms)?;
    }
    for entry in &genesis.denom_pair_pools {
        registry::set_highest_liquidity_pool(store, &entry.base, &entry.counter, entry.pool_id)?;
    }
    for fee in &genesis.developer_fees {
        fees::set_developer_fees(store, fee)?;
    }
    stats::set_number_of_trades(store, genesis.number_of_trades)?;
    for profit in &genesis.profits {
        stats::set_profit(store, profit)?;
    }

    info!(
        "Genesis loaded: {} token pairs, {} base denoms, {} cached pools",
        genesis.token_pair_arb_routes.len(),
        genesis.base_denoms.len(),
        genesis.denom_pair_pools.len()
    );
    Ok(())
}

pub fn export_genesis(store: &dyn KvStore) -> Result<GenesisState> {
    Ok(GenesisState {
        config: params::load_config(store)?,
        token_pair_arb_routes: registry::get_all_routes(store)?,
        base_denoms: registry::get_base_denoms(store)?,
        denom_pair_pools: registry::get_all_denom_pair_pools(store)?,
        developer_fees: fees::get_all_developer_fees(store)?,
        point_counter: budget::load_counter(store)?,
        module_genesis_time: fees::get_module_genesis_time(store)?,
        number_of_trades: stats::get_number_of_trades(store)?,
        profits: stats::get_all_profits(store)?,
    })
}
