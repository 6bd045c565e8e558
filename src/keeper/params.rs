//! Engine configuration aggregate
//!
//! Every tunable lives in one record, loaded per operation and written back
//! whole after validation. Nothing here is cached in process memory.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::store::{codec, keys, KvStore};
use crate::types::{AccountId, PoolWeights};

/// Upper bound for `max_points_per_tx`
pub const MAX_POINTS_PER_TX_CEILING: u64 = 50;
/// Upper bound for `max_points_per_block`
pub const MAX_POINTS_PER_BLOCK_CEILING: u64 = 200;
/// A pool weight above the tx ceiling could never fit any transaction
pub const MAX_POOL_WEIGHT: u64 = MAX_POINTS_PER_TX_CEILING;
/// Longest cycle the registry accepts
pub const MAX_HOPS_CEILING: usize = 6;

const BPS_DENOMINATOR: u32 = 10_000;

/// Search tuning, fixed at genesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Flat cost added to every cycle on top of its pool weights
    pub cycle_overhead_points: u64,
    /// Longest admissible cycle
    pub max_hops: usize,
    /// Binary search iterations when sizing the input amount
    pub max_search_iterations: u32,
    /// Largest input, as a multiple of the base denom step size
    pub max_input_multiplier: u64,
    /// Also build cycles from the highest-liquidity pool index
    #[serde(default)]
    pub liquidity_cycles: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            cycle_overhead_points: 1,
            max_hops: 3,
            max_search_iterations: 16,
            max_input_multiplier: 10_000,
            liquidity_cycles: false,
        }
    }
}

impl SearchParams {
    pub fn validate(&self) -> Result<()> {
        if !(2..=MAX_HOPS_CEILING).contains(&self.max_hops) {
            return Err(EngineError::invalid(format!(
                "max_hops must be between 2 and {}",
                MAX_HOPS_CEILING
            )));
        }
        if self.cycle_overhead_points > MAX_POINTS_PER_TX_CEILING {
            return Err(EngineError::invalid(format!(
                "cycle_overhead_points must be at most {}",
                MAX_POINTS_PER_TX_CEILING
            )));
        }
        if !(1..=64).contains(&self.max_search_iterations) {
            return Err(EngineError::invalid("max_search_iterations must be between 1 and 64"));
        }
        if self.max_input_multiplier == 0 {
            return Err(EngineError::invalid("max_input_multiplier must be positive"));
        }
        Ok(())
    }
}

/// Developer share of profit while the module is younger than `until_day`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTier {
    /// Exclusive upper bound in days since module genesis; `None` = forever
    pub until_day: Option<u64>,
    pub developer_share: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeveloperFeeSchedule {
    pub tiers: Vec<FeeTier>,
}

impl Default for DeveloperFeeSchedule {
    /// 20% in year one, 10% in year two, 5% afterwards
    fn default() -> Self {
        Self {
            tiers: vec![
                FeeTier {
                    until_day: Some(365),
                    developer_share: Decimal::new(20, 2),
                },
                FeeTier {
                    until_day: Some(730),
                    developer_share: Decimal::new(10, 2),
                },
                FeeTier {
                    until_day: None,
                    developer_share: Decimal::new(5, 2),
                },
            ],
        }
    }
}

impl DeveloperFeeSchedule {
    pub fn validate(&self) -> Result<()> {
        let Some(last) = self.tiers.last() else {
            return Err(EngineError::invalid("developer fee schedule has no tiers"));
        };
        if last.until_day.is_some() {
            return Err(EngineError::invalid(
                "last developer fee tier must be open-ended",
            ));
        }
        let mut previous: Option<u64> = None;
        for tier in &self.tiers {
            if tier.developer_share < Decimal::ZERO || tier.developer_share > Decimal::ONE {
                return Err(EngineError::invalid(format!(
                    "developer share {} outside [0, 1]",
                    tier.developer_share
                )));
            }
            if tier.developer_share.scale() > 4 {
                return Err(EngineError::invalid(format!(
                    "developer share {} has more than 4 decimal places",
                    tier.developer_share
                )));
            }
            if let Some(day) = tier.until_day {
                if previous.is_some_and(|p| day <= p) {
                    return Err(EngineError::invalid(
                        "developer fee tiers must be strictly increasing",
                    ));
                }
                previous = Some(day);
            } else if !std::ptr::eq(tier, last) {
                return Err(EngineError::invalid(
                    "only the last developer fee tier may be open-ended",
                ));
            }
        }
        Ok(())
    }

    /// Developer share in basis points for a module `days` old
    pub fn share_bps(&self, days: u64) -> u32 {
        let share = self
            .tiers
            .iter()
            .find(|t| t.until_day.map_or(true, |until| days < until))
            .map(|t| t.developer_share)
            .unwrap_or(Decimal::ZERO);
        (share * Decimal::from(BPS_DENOMINATOR))
            .trunc()
            .to_u32()
            .unwrap_or(0)
            .min(BPS_DENOMINATOR)
    }
}

/// Everything governance and the admin can tune
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub enabled: bool,
    pub admin_account: Option<AccountId>,
    pub developer_account: Option<AccountId>,
    pub max_points_per_tx: u64,
    pub max_points_per_block: u64,
    pub pool_weights: PoolWeights,
    pub search: SearchParams,
    pub developer_fee_schedule: DeveloperFeeSchedule,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            admin_account: None,
            developer_account: None,
            max_points_per_tx: 18,
            max_points_per_block: 100,
            pool_weights: PoolWeights::default(),
            search: SearchParams::default(),
            developer_fee_schedule: DeveloperFeeSchedule::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        validate_points_per_tx(self.max_points_per_tx)?;
        validate_points_per_block(self.max_points_per_block)?;
        if self.max_points_per_tx > self.max_points_per_block {
            return Err(EngineError::invalid(format!(
                "max points per tx ({}) exceeds max points per block ({})",
                self.max_points_per_tx, self.max_points_per_block
            )));
        }
        validate_pool_weights(&self.pool_weights)?;
        self.search.validate()?;
        self.developer_fee_schedule.validate()
    }
}

pub fn validate_points_per_tx(points: u64) -> Result<()> {
    if points == 0 || points > MAX_POINTS_PER_TX_CEILING {
        return Err(EngineError::invalid(format!(
            "max pool points per tx must be between 1 and {}",
            MAX_POINTS_PER_TX_CEILING
        )));
    }
    Ok(())
}

pub fn validate_points_per_block(points: u64) -> Result<()> {
    if points == 0 || points > MAX_POINTS_PER_BLOCK_CEILING {
        return Err(EngineError::invalid(format!(
            "max pool points per block must be between 1 and {}",
            MAX_POINTS_PER_BLOCK_CEILING
        )));
    }
    Ok(())
}

pub fn validate_pool_weights(weights: &PoolWeights) -> Result<()> {
    for (pool_type, weight) in &weights.0 {
        if *weight == 0 || *weight > MAX_POOL_WEIGHT {
            return Err(EngineError::invalid(format!(
                "{} pool weight must be between 1 and {}",
                pool_type, MAX_POOL_WEIGHT
            )));
        }
    }
    Ok(())
}

pub fn load_config(store: &dyn KvStore) -> Result<EngineConfig> {
    codec::load(store, keys::KEY_ENGINE_CONFIG)?
        .ok_or_else(|| EngineError::not_found("engine config has not been initialized at genesis"))
}

/// Validate, then write the whole aggregate. Invalid configs are never stored.
pub fn save_config(store: &mut dyn KvStore, config: &EngineConfig) -> Result<()> {
    config.validate()?;
    codec::save(store, keys::KEY_ENGINE_CONFIG, config)
}
