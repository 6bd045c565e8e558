//! Cycle Executor
//!
//! Runs a selected cycle against the AMM inside a state branch. The module
//! account borrows the input (mint), trades it around the cycle, repays it
//! (burn) and books what is left as profit.
//!
//! Order inside the branch:
//!     1. debit the point budget
//!     2. mint the input to the module account
//!     3. swap every hop, each output checked against its quote
//!     4. require final amount > input
//!     5. burn the input, book the profit, count the trade
//!
//! Any error drops the branch, so a failed attempt leaves no trace: not the
//! budget debit, not a partial swap.

use alloy_primitives::U256;
use tracing::{debug, info, warn};

use super::searcher::Candidate;
use crate::collaborators::{BalanceLedger, BlockContext, PricingEngine};
use crate::error::{EngineError, Result};
use crate::keeper::fees::{self, ProfitSplit};
use crate::keeper::{budget, stats};
use crate::store::{BranchStore, KvStore};
use crate::types::{AccountId, ArbRoute, Coin};

/// Outcome of a committed cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeResult {
    pub route: ArbRoute,
    pub amount_in: U256,
    pub amount_out: U256,
    pub profit: Coin,
    pub split: ProfitSplit,
    pub points: u64,
}

pub struct CycleExecutor<'a> {
    pricing: &'a dyn PricingEngine,
    bank: &'a dyn BalanceLedger,
    module_account: &'a AccountId,
}

impl<'a> CycleExecutor<'a> {
    pub fn new(pricing: &'a dyn PricingEngine, bank: &'a dyn BalanceLedger, module_account: &'a AccountId) -> Self {
        Self {
            pricing,
            bank,
            module_account,
        }
    }

    /// Execute `candidate` atomically: everything commits or nothing does.
    pub fn execute(
        &self,
        store: &mut dyn KvStore,
        ctx: &BlockContext,
        candidate: &Candidate,
    ) -> Result<TradeResult> {
        let mut branch = BranchStore::new(store);
        match self.run(&mut branch, ctx, candidate) {
            Ok(result) => {
                branch.commit();
                info!(
                    "✅ Cycle {} executed: profit {}, {} points",
                    result.route, result.profit, result.points
                );
                Ok(result)
            }
            Err(e) => {
                branch.discard();
                warn!("Cycle {} rolled back: {}", candidate.route, e);
                Err(e)
            }
        }
    }

    fn run(
        &self,
        store: &mut dyn KvStore,
        ctx: &BlockContext,
        candidate: &Candidate,
    ) -> Result<TradeResult> {
        let route = &candidate.route;
        let base = route
            .base_denom()
            .ok_or_else(|| EngineError::ExecutionFailure("route has no hops".to_string()))?
            .clone();
        if candidate.hop_outputs.len() != route.hops.len() {
            return Err(EngineError::ExecutionFailure(format!(
                "route {} has {} hops but {} quoted outputs",
                route,
                route.hops.len(),
                candidate.hop_outputs.len()
            )));
        }

        budget::try_consume(store, candidate.cost)?;

        let input = Coin::new(base.clone(), candidate.amount_in);
        self.bank
            .mint(store, self.module_account, &input)
            .map_err(|e| EngineError::ExecutionFailure(format!("mint {} failed: {}", input, e)))?;

        let mut amount = candidate.amount_in;
        for (hop, quoted) in route.hops.iter().zip(&candidate.hop_outputs) {
            let out = self
                .pricing
                .swap(store, self.module_account, hop, amount)
                .map_err(|e| EngineError::ExecutionFailure(format!("swap {} failed: {}", hop, e)))?;
            if out < *quoted {
                return Err(EngineError::ExecutionFailure(format!(
                    "swap {} returned {} below quoted {}",
                    hop, out, quoted
                )));
            }
            debug!("  {} : {} -> {}", hop, amount, out);
            amount = out;
        }

        if amount <= candidate.amount_in {
            return Err(EngineError::ExecutionFailure(format!(
                "cycle returned {} for input {}",
                amount, candidate.amount_in
            )));
        }

        self.bank
            .burn(store, self.module_account, &input)
            .map_err(|e| EngineError::ExecutionFailure(format!("burn {} failed: {}", input, e)))?;

        let profit = Coin::new(base, amount - candidate.amount_in);
        let split = fees::book_profit(store, ctx.time, &profit)?;
        stats::increment_number_of_trades(store)?;

        Ok(TradeResult {
            route: route.clone(),
            amount_in: candidate.amount_in,
            amount_out: amount,
            profit,
            split,
            points: candidate.cost,
        })
    }
}
