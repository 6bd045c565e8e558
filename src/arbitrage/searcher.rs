//! Arbitrage Searcher
//!
//! Given the pair a just-executed trade touched, collects the admissible
//! cycles, sizes and prices each one with dry-run quotes, and picks one.
//!
//! Design:
//!     - Candidates come from the route registry; highest-liquidity cycles
//!       are added only when `SearchParams::liquidity_cycles` is set
//!     - A cycle is admissible only if its point cost fits what the
//!       transaction may still spend. If routes exist but none fits, the
//!       search reports the budget, not a lack of profit
//!     - Ranking: profit descending, then route position, then base denom
//!       position. Every input is read in key order, so replicas agree
//!     - Quotes never write; the search leaves state exactly as it found it
//!     - Work per search is at most `2 * max_search_iterations + 1` route
//!       quotes per admissible cycle

use std::cmp::Reverse;

use alloy_primitives::U256;
use tracing::debug;

use crate::collaborators::PricingEngine;
use crate::error::{EngineError, Result};
use crate::keeper::budget;
use crate::keeper::params::{EngineConfig, SearchParams};
use crate::keeper::registry;
use crate::store::KvStore;
use crate::types::{ArbRoute, BaseDenom, Denom, Hop, SwapEvent};

/// Where a candidate cycle came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSource {
    Registered,
    HighestLiquidity,
}

/// A priced, sized cycle ready for execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub route: ArbRoute,
    pub source: RouteSource,
    /// Position of the route in its source. Registered routes keep their
    /// registry order; liquidity cycles share one slot after all of them,
    /// so among themselves they rank by base denom position
    pub route_index: usize,
    /// Position of the route's base denom in the priority list
    pub base_position: usize,
    pub amount_in: U256,
    /// Quoted output of every hop, in order
    pub hop_outputs: Vec<U256>,
    pub simulated_profit: U256,
    /// Points the cycle costs
    pub cost: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Disabled,
    /// The block budget is spent, or what is left fits no route
    BudgetExhausted,
    NoRoutes,
    NotProfitable,
    Found(Candidate),
}

/// Dry-run result for one input amount
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub amount_in: U256,
    pub hop_outputs: Vec<U256>,
    /// Zero when the cycle returns less than it consumes
    pub profit: U256,
}

/// Thread `amount_in` through every hop of `route` using quotes only
pub fn quote_route(
    store: &dyn KvStore,
    pricing: &dyn PricingEngine,
    route: &ArbRoute,
    amount_in: U256,
) -> Result<Quote> {
    let mut amount = amount_in;
    let mut hop_outputs = Vec::with_capacity(route.hops.len());
    for hop in &route.hops {
        amount = pricing
            .quote(store, hop, amount)
            .map_err(|e| EngineError::not_found(format!("quote for {} failed: {}", hop, e)))?;
        hop_outputs.push(amount);
    }
    Ok(Quote {
        amount_in,
        hop_outputs,
        profit: amount.saturating_sub(amount_in),
    })
}

/// Size the input as `multiplier * step_size`, binary searching the
/// multiplier over `[1, max_input_multiplier]` for the profit peak.
///
/// Compares profit at `m` and `m + 1`; an equal profit moves towards the
/// smaller input.
pub fn find_optimal_input(
    store: &dyn KvStore,
    pricing: &dyn PricingEngine,
    route: &ArbRoute,
    step_size: U256,
    params: &SearchParams,
) -> Result<Quote> {
    let at = |multiplier: u64| quote_route(store, pricing, route, step_size.saturating_mul(U256::from(multiplier)));

    let mut lo = 1u64;
    let mut hi = params.max_input_multiplier.max(1);
    let mut iterations = 0;
    while lo < hi && iterations < params.max_search_iterations {
        let mid = lo + (hi - lo) / 2;
        if at(mid + 1)?.profit > at(mid)?.profit {
            lo = mid + 1;
        } else {
            hi = mid;
        }
        iterations += 1;
    }
    at(lo)
}

/// Cycles built around the swapped pool from the highest-liquidity index,
/// one per base denom. The swapped pool is traded against the direction of
/// the triggering trade.
pub fn liquidity_cycles(
    store: &dyn KvStore,
    swap: &SwapEvent,
    base_denoms: &[BaseDenom],
    max_hops: usize,
) -> Result<Vec<(usize, ArbRoute)>> {
    let back = Hop::new(swap.pool_id, swap.denom_out.clone(), swap.denom_in.clone());
    let mut cycles = Vec::new();

    for (position, base) in base_denoms.iter().enumerate() {
        let cached = |counter: &Denom| match registry::get_highest_liquidity_pool(store, &base.denom, counter) {
            Ok(pool_id) if pool_id != swap.pool_id => Ok(Some(pool_id)),
            Ok(_) | Err(EngineError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        };

        let hops = if base.denom == swap.denom_in {
            cached(&swap.denom_out)?
                .map(|entry| vec![Hop::new(entry, base.denom.clone(), swap.denom_out.clone()), back.clone()])
        } else if base.denom == swap.denom_out {
            cached(&swap.denom_in)?
                .map(|exit| vec![back.clone(), Hop::new(exit, swap.denom_in.clone(), base.denom.clone())])
        } else {
            match (cached(&swap.denom_out)?, cached(&swap.denom_in)?) {
                (Some(entry), Some(exit)) => Some(vec![
                    Hop::new(entry, base.denom.clone(), swap.denom_out.clone()),
                    back.clone(),
                    Hop::new(exit, swap.denom_in.clone(), base.denom.clone()),
                ]),
                _ => None,
            }
        };

        if let Some(hops) = hops {
            let route = ArbRoute::new(hops);
            if route.validate(max_hops).is_ok() {
                cycles.push((position, route));
            }
        }
    }
    Ok(cycles)
}

/// Find the best admissible cycle for the pair touched by `swap`.
pub fn search(
    store: &dyn KvStore,
    config: &EngineConfig,
    pricing: &dyn PricingEngine,
    swap: &SwapEvent,
) -> Result<SearchOutcome> {
    if !config.enabled {
        return Ok(SearchOutcome::Disabled);
    }
    if budget::remaining_block_budget(store)? == 0 {
        return Ok(SearchOutcome::BudgetExhausted);
    }
    let available = budget::available_for_tx(store)?;

    let registered = match registry::get_routes(store, &swap.denom_in, &swap.denom_out) {
        Ok(entry) => entry.routes,
        Err(EngineError::NotFound(_)) => Vec::new(),
        Err(e) => return Err(e),
    };
    let base_denoms = registry::get_base_denoms(store)?;

    let offset = registered.len();
    let mut routes: Vec<(RouteSource, usize, usize, ArbRoute)> = Vec::new();
    for (index, route) in registered.into_iter().enumerate() {
        let position = route
            .base_denom()
            .and_then(|base| registry::base_denom_position(&base_denoms, base));
        match position {
            Some(position) => routes.push((RouteSource::Registered, index, position, route)),
            None => debug!("Skipping route {}: base is not a configured base denom", route),
        }
    }
    if config.search.liquidity_cycles {
        for (position, route) in liquidity_cycles(store, swap, &base_denoms, config.search.max_hops)? {
            routes.push((RouteSource::HighestLiquidity, offset, position, route));
        }
    }
    if routes.is_empty() {
        return Ok(SearchOutcome::NoRoutes);
    }

    let mut candidates = Vec::with_capacity(routes.len());
    let mut over_budget = 0usize;
    for (source, route_index, base_position, route) in routes {
        let cost = match budget::estimate_cost(store, config, pricing, &route) {
            Ok(cost) => cost,
            Err(e) if e.is_recoverable() => {
                debug!("Skipping route {}: {}", route, e);
                continue;
            }
            Err(e) => return Err(e),
        };
        if cost > available {
            debug!("Skipping route {}: costs {} points, {} available", route, cost, available);
            over_budget += 1;
            continue;
        }
        let step_size = base_denoms[base_position].step_size;
        let quote = match find_optimal_input(store, pricing, &route, step_size, &config.search) {
            Ok(quote) => quote,
            Err(e) if e.is_recoverable() => {
                debug!("Skipping route {}: {}", route, e);
                continue;
            }
            Err(e) => return Err(e),
        };
        candidates.push(Candidate {
            route,
            source,
            route_index,
            base_position,
            amount_in: quote.amount_in,
            hop_outputs: quote.hop_outputs,
            simulated_profit: quote.profit,
            cost,
        });
    }

    if candidates.is_empty() && over_budget > 0 {
        debug!("{} routes cost more than the {} points available", over_budget, available);
        return Ok(SearchOutcome::BudgetExhausted);
    }

    match select(candidates) {
        Some(best) => {
            debug!(
                "Best cycle {}: input {}, simulated profit {}, cost {} points",
                best.route, best.amount_in, best.simulated_profit, best.cost
            );
            Ok(SearchOutcome::Found(best))
        }
        None => Ok(SearchOutcome::NotProfitable),
    }
}

/// Rank by profit descending, route position, then base denom position,
/// and take the first with a strictly positive profit.
pub fn select(mut candidates: Vec<Candidate>) -> Option<Candidate> {
    candidates.sort_by_key(|c| (Reverse(c.simulated_profit), c.route_index, c.base_position));
    candidates.into_iter().find(|c| !c.simulated_profit.is_zero())
}
