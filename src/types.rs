//! Core data structures
//!
//! Denominations, accounts, pool hops, cyclic routes and the persisted
//! records of the arbitrage engine.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{EngineError, Result};

/// Pool identifier assigned by the AMM
pub type PoolId = u64;

/// Asset denomination (e.g. "uosmo", "ibc/27394F...")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Denom(String);

impl Denom {
    /// Parse and validate a denomination.
    ///
    /// Rules: 3-128 chars, leading ASCII letter, then letters, digits or one
    /// of `/ : . _ -`.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        validate_denom(&raw)?;
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Denom {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Denom {
    type Error = EngineError;

    fn try_from(raw: String) -> Result<Self> {
        Self::new(raw)
    }
}

impl From<Denom> for String {
    fn from(denom: Denom) -> Self {
        denom.0
    }
}

pub fn validate_denom(raw: &str) -> Result<()> {
    let len = raw.len();
    if !(3..=128).contains(&len) {
        return Err(EngineError::invalid(format!(
            "denom '{}' must be 3-128 characters",
            raw
        )));
    }
    let mut chars = raw.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return Err(EngineError::invalid(format!(
            "denom '{}' must start with a letter",
            raw
        )));
    }
    if let Some(bad) = chars.find(|c| !(c.is_ascii_alphanumeric() || "/:._-".contains(*c))) {
        return Err(EngineError::invalid(format!(
            "denom '{}' contains invalid character '{}'",
            raw, bad
        )));
    }
    Ok(())
}

/// Account address (bech32-style, lowercase)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.is_empty() || raw.len() > 128 {
            return Err(EngineError::invalid("account address must be 1-128 characters"));
        }
        if !raw.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
            return Err(EngineError::invalid(format!(
                "account address '{}' must be lowercase alphanumeric",
                raw
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccountId {
    type Error = EngineError;

    fn try_from(raw: String) -> Result<Self> {
        Self::new(raw)
    }
}

impl From<AccountId> for String {
    fn from(account: AccountId) -> Self {
        account.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An amount of one denomination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: Denom,
    pub amount: U256,
}

impl Coin {
    pub fn new(denom: Denom, amount: U256) -> Self {
        Self { denom, amount }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// AMM pool families. Each family has its own point weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolType {
    Balancer,
    Stable,
    Concentrated,
}

impl fmt::Display for PoolType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PoolType::Balancer => write!(f, "balancer"),
            PoolType::Stable => write!(f, "stable"),
            PoolType::Concentrated => write!(f, "concentrated"),
        }
    }
}

/// One swap through a single pool, in a fixed direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hop {
    pub pool_id: PoolId,
    pub denom_in: Denom,
    pub denom_out: Denom,
}

impl Hop {
    pub fn new(pool_id: PoolId, denom_in: Denom, denom_out: Denom) -> Self {
        Self {
            pool_id,
            denom_in,
            denom_out,
        }
    }

    /// True if this hop trades between `a` and `b` (either direction)
    pub fn touches(&self, a: &Denom, b: &Denom) -> bool {
        (&self.denom_in == a && &self.denom_out == b) || (&self.denom_in == b && &self.denom_out == a)
    }
}

impl fmt::Display for Hop {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-[{}]->{}", self.denom_in, self.pool_id, self.denom_out)
    }
}

/// Closed trading cycle starting and ending in a base denom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArbRoute {
    pub hops: Vec<Hop>,
}

impl ArbRoute {
    pub fn new(hops: Vec<Hop>) -> Self {
        Self { hops }
    }

    /// Denom the cycle starts and ends in
    pub fn base_denom(&self) -> Option<&Denom> {
        self.hops.first().map(|h| &h.denom_in)
    }

    /// Structural validation: hop count within `[2, max_hops]`, consecutive
    /// hops chain, and the last hop returns to the starting denom.
    pub fn validate(&self, max_hops: usize) -> Result<()> {
        if self.hops.len() < 2 || self.hops.len() > max_hops {
            return Err(EngineError::invalid(format!(
                "route must have between 2 and {} hops, got {}",
                max_hops,
                self.hops.len()
            )));
        }
        for hop in &self.hops {
            if hop.denom_in == hop.denom_out {
                return Err(EngineError::invalid(format!("hop {} swaps a denom into itself", hop)));
            }
        }
        for pair in self.hops.windows(2) {
            if pair[0].denom_out != pair[1].denom_in {
                return Err(EngineError::invalid(format!(
                    "hop {} does not chain into hop {}",
                    pair[0], pair[1]
                )));
            }
        }
        let first = &self.hops[0];
        let last = &self.hops[self.hops.len() - 1];
        if first.denom_in != last.denom_out {
            return Err(EngineError::invalid(format!(
                "route starting in {} ends in {}",
                first.denom_in, last.denom_out
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ArbRoute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ids: Vec<String> = self.hops.iter().map(|h| h.pool_id.to_string()).collect();
        match self.base_denom() {
            Some(base) => write!(f, "{} via pools [{}]", base, ids.join(",")),
            None => write!(f, "empty route"),
        }
    }
}

/// Canonically ordered pair of denominations
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DenomPair {
    pub token_a: Denom,
    pub token_b: Denom,
}

impl DenomPair {
    /// Orders the two denoms so `(a, b)` and `(b, a)` produce the same pair
    pub fn canonical(a: &Denom, b: &Denom) -> Self {
        let (token_a, token_b) = if a <= b {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        };
        Self { token_a, token_b }
    }
}

impl fmt::Display for DenomPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.token_a, self.token_b)
    }
}

/// All registered cycles for one canonical pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPairArbRoutes {
    pub pair: DenomPair,
    pub routes: Vec<ArbRoute>,
}

/// A base denomination plus the input granularity used when sizing trades
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseDenom {
    pub denom: Denom,
    pub step_size: U256,
}

/// Cached highest-liquidity pool between a base denom and a counter denom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenomPairPool {
    pub base: Denom,
    pub counter: Denom,
    pub pool_id: PoolId,
}

/// Point cost per pool type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolWeights(pub BTreeMap<PoolType, u64>);

impl PoolWeights {
    pub fn weight(&self, pool_type: PoolType) -> Option<u64> {
        self.0.get(&pool_type).copied()
    }
}

impl Default for PoolWeights {
    /// Balancer 2, stable 5, concentrated 2
    fn default() -> Self {
        Self(BTreeMap::from([
            (PoolType::Balancer, 2),
            (PoolType::Stable, 5),
            (PoolType::Concentrated, 2),
        ]))
    }
}

/// Read-only view of the point budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetState {
    pub max_points_per_tx: u64,
    pub max_points_per_block: u64,
    pub consumed_points_this_block: u64,
    pub latest_block_height: u64,
}

impl BudgetState {
    pub fn remaining_block_budget(&self) -> u64 {
        self.max_points_per_block
            .saturating_sub(self.consumed_points_this_block)
    }
}

/// The trade that triggers a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapEvent {
    pub pool_id: PoolId,
    pub denom_in: Denom,
    pub denom_out: Denom,
}
