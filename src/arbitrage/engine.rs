//! Arbitrage Engine
//!
//! The post-trade hook and the public surface of the crate. Owns the
//! injected collaborators and the module accounts; all state lives in the
//! store handed to each call.
//!
//! Design:
//!     - `on_post_trade` never fails: errors become an outcome and a log line,
//!       the triggering transaction always goes through
//!     - The block budget resets lazily on the first trade at a new height
//!     - At most one cycle per triggering trade

use tracing::{debug, info, warn};

use super::executor::{CycleExecutor, TradeResult};
use super::searcher::{self, SearchOutcome};
use crate::collaborators::{BalanceLedger, BlockContext, PricingEngine};
use crate::error::{EngineError, Result};
use crate::keeper::{admin, budget, fees, genesis, params, registry, stats, GenesisState};
use crate::store::{BranchStore, KvStore};
use crate::types::{
    AccountId, ArbRoute, BaseDenom, BudgetState, Coin, Denom, PoolWeights, SwapEvent, TokenPairArbRoutes,
};

/// Accounts the engine acts for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineAccounts {
    /// Holds borrowed inputs during a cycle and every booked profit
    pub module: AccountId,
    /// Governance authority; configures the engine while no admin is set
    pub authority: AccountId,
}

/// What happened after a trade
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostTradeOutcome {
    Disabled,
    NoRoutes,
    BudgetExceeded,
    NotProfitable,
    Executed(TradeResult),
    /// The attempt was rolled back
    Failed(String),
}

pub struct ArbEngine<P: PricingEngine, B: BalanceLedger> {
    pricing: P,
    bank: B,
    accounts: EngineAccounts,
}

impl<P: PricingEngine, B: BalanceLedger> ArbEngine<P, B> {
    pub fn new(pricing: P, bank: B, accounts: EngineAccounts) -> Self {
        Self {
            pricing,
            bank,
            accounts,
        }
    }

    pub fn accounts(&self) -> &EngineAccounts {
        &self.accounts
    }

    pub fn pricing(&self) -> &P {
        &self.pricing
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    /// Post-processing hook, run after every ordinary trade.
    pub fn on_post_trade(
        &self,
        store: &mut dyn KvStore,
        ctx: &BlockContext,
        swap: &SwapEvent,
    ) -> PostTradeOutcome {
        match self.try_post_trade(store, ctx, swap) {
            Ok(outcome) => outcome,
            Err(EngineError::BudgetExceeded { requested, remaining }) => {
                debug!("Budget exceeded: requested {}, remaining {}", requested, remaining);
                PostTradeOutcome::BudgetExceeded
            }
            Err(e) => {
                warn!(
                    "Arbitrage after trade on pool {} at height {} failed: {}",
                    swap.pool_id, ctx.height, e
                );
                PostTradeOutcome::Failed(e.to_string())
            }
        }
    }

    fn try_post_trade(
        &self,
        store: &mut dyn KvStore,
        ctx: &BlockContext,
        swap: &SwapEvent,
    ) -> Result<PostTradeOutcome> {
        let config = params::load_config(store)?;
        if !config.enabled {
            return Ok(PostTradeOutcome::Disabled);
        }
        budget::begin_block(store, ctx.height)?;

        let candidate = match searcher::search(store, &config, &self.pricing, swap)? {
            SearchOutcome::Disabled => return Ok(PostTradeOutcome::Disabled),
            SearchOutcome::BudgetExhausted => {
                debug!("Block {} budget exhausted, skipping pool {}", ctx.height, swap.pool_id);
                return Ok(PostTradeOutcome::BudgetExceeded);
            }
            SearchOutcome::NoRoutes => return Ok(PostTradeOutcome::NoRoutes),
            SearchOutcome::NotProfitable => return Ok(PostTradeOutcome::NotProfitable),
            SearchOutcome::Found(candidate) => candidate,
        };

        let executor = CycleExecutor::new(&self.pricing, &self.bank, &self.accounts.module);
        Ok(PostTradeOutcome::Executed(executor.execute(store, ctx, &candidate)?))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn get_routes(&self, store: &dyn KvStore, a: &Denom, b: &Denom) -> Result<TokenPairArbRoutes> {
        registry::get_routes(store, a, b)
    }

    pub fn get_all_routes(&self, store: &dyn KvStore) -> Result<Vec<TokenPairArbRoutes>> {
        registry::get_all_routes(store)
    }

    pub fn get_base_denoms(&self, store: &dyn KvStore) -> Result<Vec<BaseDenom>> {
        registry::get_base_denoms(store)
    }

    pub fn get_budget_state(&self, store: &dyn KvStore) -> Result<BudgetState> {
        budget::budget_state(store)
    }

    pub fn get_developer_fees(&self, store: &dyn KvStore, denom: &Denom) -> Result<Coin> {
        fees::get_developer_fees(store, denom)
    }

    pub fn get_all_developer_fees(&self, store: &dyn KvStore) -> Result<Vec<Coin>> {
        fees::get_all_developer_fees(store)
    }

    pub fn get_number_of_trades(&self, store: &dyn KvStore) -> Result<u64> {
        stats::get_number_of_trades(store)
    }

    pub fn get_all_profits(&self, store: &dyn KvStore) -> Result<Vec<Coin>> {
        stats::get_all_profits(store)
    }

    pub fn export_genesis(&self, store: &dyn KvStore) -> Result<GenesisState> {
        genesis::export_genesis(store)
    }

    pub fn init_genesis(&self, store: &mut dyn KvStore, state: &GenesisState) -> Result<()> {
        genesis::init_genesis(store, state)
    }

    // -----------------------------------------------------------------------
    // Gated mutations
    // -----------------------------------------------------------------------

    pub fn set_enabled(&self, store: &mut dyn KvStore, caller: &AccountId, enabled: bool) -> Result<()> {
        admin::set_enabled(store, &self.accounts.authority, caller, enabled)
    }

    pub fn set_max_points_per_tx(&self, store: &mut dyn KvStore, caller: &AccountId, points: u64) -> Result<()> {
        admin::set_max_points_per_tx(store, &self.accounts.authority, caller, points)
    }

    pub fn set_max_points_per_block(&self, store: &mut dyn KvStore, caller: &AccountId, points: u64) -> Result<()> {
        admin::set_max_points_per_block(store, &self.accounts.authority, caller, points)
    }

    pub fn set_pool_weights(&self, store: &mut dyn KvStore, caller: &AccountId, weights: &PoolWeights) -> Result<()> {
        admin::set_pool_weights(store, &self.accounts.authority, caller, weights)
    }

    pub fn set_base_denoms(&self, store: &mut dyn KvStore, caller: &AccountId, base_denoms: &[BaseDenom]) -> Result<()> {
        admin::set_base_denoms(store, &self.accounts.authority, caller, base_denoms)
    }

    pub fn set_routes(
        &self,
        store: &mut dyn KvStore,
        caller: &AccountId,
        a: &Denom,
        b: &Denom,
        routes: Vec<ArbRoute>,
    ) -> Result<()> {
        admin::set_routes(store, &self.accounts.authority, caller, a, b, routes)
    }

    pub fn set_admin_account(&self, store: &mut dyn KvStore, caller: &AccountId, admin: AccountId) -> Result<()> {
        admin::set_admin_account(store, &self.accounts.authority, caller, admin)
    }

    pub fn set_developer_account(
        &self,
        store: &mut dyn KvStore,
        caller: &AccountId,
        developer: AccountId,
    ) -> Result<()> {
        admin::set_developer_account(store, &self.accounts.authority, caller, developer)
    }

    /// Pay every accrued developer fee to `caller`, all denoms or none.
    pub fn withdraw_developer_fees(&self, store: &mut dyn KvStore, caller: &AccountId) -> Result<Vec<Coin>> {
        let mut branch = BranchStore::new(store);
        let paid = fees::withdraw_developer_fees(&mut branch, &self.bank, &self.accounts.module, caller)?;
        branch.commit();
        info!("💸 Developer withdrawal: {} denoms", paid.len());
        Ok(paid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keeper::{EngineConfig, PointCounter};
    use crate::store::MemStore;
    use crate::testutil::{acct, coin, d, BonusAmm, FakeAmm, FakeBank};
    use crate::types::{Hop, PoolType};
    use alloy_primitives::U256;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::BTreeMap;

    fn genesis_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn accounts() -> EngineAccounts {
        EngineAccounts {
            module: acct("protorev"),
            authority: acct("gov"),
        }
    }

    fn osmo_atom_juno() -> ArbRoute {
        ArbRoute::new(vec![
            Hop::new(1, d("uosmo"), d("uatom")),
            Hop::new(2, d("uatom"), d("ujuno")),
            Hop::new(3, d("ujuno"), d("uosmo")),
        ])
    }

    /// Overhead 2 plus three balancer hops at 6 points: 20 points per cycle
    fn genesis() -> GenesisState {
        let mut config = EngineConfig {
            admin_account: Some(acct("admin")),
            developer_account: Some(acct("dev")),
            max_points_per_tx: 20,
            max_points_per_block: 100,
            pool_weights: PoolWeights(BTreeMap::from([
                (PoolType::Balancer, 6),
                (PoolType::Stable, 5),
                (PoolType::Concentrated, 2),
            ])),
            ..EngineConfig::default()
        };
        config.search.cycle_overhead_points = 2;
        GenesisState {
            config,
            token_pair_arb_routes: vec![TokenPairArbRoutes {
                pair: crate::types::DenomPair::canonical(&d("uatom"), &d("ujuno")),
                routes: vec![osmo_atom_juno()],
            }],
            base_denoms: vec![BaseDenom { denom: d("uosmo"), step_size: U256::from(1_000_000u64) }],
            point_counter: PointCounter::default(),
            module_genesis_time: genesis_time(),
            ..GenesisState::default()
        }
    }

    fn juno_to_atom() -> SwapEvent {
        SwapEvent { pool_id: 2, denom_in: d("ujuno"), denom_out: d("uatom") }
    }

    fn bonus_engine() -> ArbEngine<BonusAmm, FakeBank> {
        let amm = BonusAmm::new(&[
            (1, PoolType::Balancer, 1),
            (2, PoolType::Balancer, 1),
            (3, PoolType::Balancer, 1),
        ]);
        ArbEngine::new(amm, FakeBank, accounts())
    }

    #[test]
    fn test_five_cycles_then_budget_exceeded() {
        let engine = bonus_engine();
        let mut store = MemStore::new();
        engine.init_genesis(&mut store, &genesis()).unwrap();
        let ctx = BlockContext::new(10, genesis_time());

        for _ in 0..5 {
            let outcome = engine.on_post_trade(&mut store, &ctx, &juno_to_atom());
            assert!(matches!(outcome, PostTradeOutcome::Executed(ref r) if r.points == 20));
        }
        assert_eq!(engine.get_budget_state(&store).unwrap().consumed_points_this_block, 100);

        let before = store.clone();
        assert_eq!(
            engine.on_post_trade(&mut store, &ctx, &juno_to_atom()),
            PostTradeOutcome::BudgetExceeded
        );
        assert_eq!(store, before);
        assert_eq!(engine.get_number_of_trades(&store).unwrap(), 5);

        // the next block starts fresh
        let next = BlockContext::new(11, genesis_time());
        assert!(matches!(
            engine.on_post_trade(&mut store, &next, &juno_to_atom()),
            PostTradeOutcome::Executed(_)
        ));
        assert_eq!(engine.get_budget_state(&store).unwrap().consumed_points_this_block, 20);
    }

    #[test]
    fn test_leftover_budget_too_small_reports_budget_exceeded() {
        let engine = bonus_engine();
        let mut store = MemStore::new();
        let mut state = genesis();
        state.config.max_points_per_block = 90;
        engine.init_genesis(&mut store, &state).unwrap();
        let ctx = BlockContext::new(10, genesis_time());

        for _ in 0..4 {
            assert!(matches!(
                engine.on_post_trade(&mut store, &ctx, &juno_to_atom()),
                PostTradeOutcome::Executed(_)
            ));
        }
        assert_eq!(budget::remaining_block_budget(&store).unwrap(), 10);

        let before = store.clone();
        assert_eq!(
            engine.on_post_trade(&mut store, &ctx, &juno_to_atom()),
            PostTradeOutcome::BudgetExceeded
        );
        assert_eq!(store, before);
    }

    #[test]
    fn test_trade_imbalance_captured_on_real_pools() {
        let amm = FakeAmm::new();
        let mut store = MemStore::new();
        amm.create_pool(&mut store, 1, PoolType::Balancer, ("uosmo", 1_000_000_000), ("uatom", 1_000_000_000));
        amm.create_pool(&mut store, 2, PoolType::Balancer, ("uatom", 1_000_000_000), ("ujuno", 1_000_000_000));
        amm.create_pool(&mut store, 3, PoolType::Balancer, ("ujuno", 1_000_000_000), ("uosmo", 1_000_000_000));
        let engine = ArbEngine::new(amm, FakeBank, accounts());
        engine.init_genesis(&mut store, &genesis()).unwrap();

        // a user dumps juno for atom on pool 2, making atom -> juno cheap there
        let user = acct("user");
        engine.bank().credit(&mut store, &user, &coin("ujuno", 200_000_000));
        engine
            .pricing()
            .swap(&mut store, &user, &Hop::new(2, d("ujuno"), d("uatom")), U256::from(200_000_000u64))
            .unwrap();

        let ctx = BlockContext::new(3, genesis_time());
        let result = match engine.on_post_trade(&mut store, &ctx, &juno_to_atom()) {
            PostTradeOutcome::Executed(result) => result,
            other => panic!("expected execution, got {:?}", other),
        };
        assert!(result.profit.amount > U256::ZERO);

        let dev_fees = engine.get_developer_fees(&store, &d("uosmo")).unwrap();
        assert_eq!(dev_fees.amount + result.split.treasury.amount, result.profit.amount);
        let module_balance = engine.bank().balance(&store, &acct("protorev"), &d("uosmo"));
        assert_eq!(module_balance, result.profit.amount);
        assert_eq!(engine.get_all_profits(&store).unwrap(), vec![result.profit.clone()]);

        // developer fund pays out once, to the developer only
        assert!(engine.withdraw_developer_fees(&mut store, &acct("admin")).is_err());
        let paid = engine.withdraw_developer_fees(&mut store, &acct("dev")).unwrap();
        assert_eq!(paid, vec![dev_fees.clone()]);
        assert_eq!(engine.bank().balance(&store, &acct("dev"), &d("uosmo")), dev_fees.amount);
        assert!(engine.get_all_developer_fees(&store).unwrap().is_empty());
        // the treasury share stays behind in the module account
        assert_eq!(
            engine.bank().balance(&store, &acct("protorev"), &d("uosmo")),
            result.split.treasury.amount
        );
    }

    #[test]
    fn test_disabled_engine_touches_nothing() {
        let engine = bonus_engine();
        let mut store = MemStore::new();
        engine.init_genesis(&mut store, &genesis()).unwrap();
        engine.set_enabled(&mut store, &acct("admin"), false).unwrap();

        let before = store.clone();
        let ctx = BlockContext::new(10, genesis_time());
        assert_eq!(
            engine.on_post_trade(&mut store, &ctx, &juno_to_atom()),
            PostTradeOutcome::Disabled
        );
        assert_eq!(store, before);
    }

    #[test]
    fn test_untracked_pair_reports_no_routes() {
        let engine = bonus_engine();
        let mut store = MemStore::new();
        engine.init_genesis(&mut store, &genesis()).unwrap();
        let swap = SwapEvent { pool_id: 1, denom_in: d("uosmo"), denom_out: d("uatom") };
        assert_eq!(
            engine.on_post_trade(&mut store, &BlockContext::new(1, genesis_time()), &swap),
            PostTradeOutcome::NoRoutes
        );
    }

    #[test]
    fn test_failed_execution_is_swallowed() {
        let amm = FakeAmm::with_frozen(&[3]);
        let mut store = MemStore::new();
        amm.create_pool(&mut store, 1, PoolType::Balancer, ("uosmo", 1_000_000_000), ("uatom", 1_000_000_000));
        amm.create_pool(&mut store, 2, PoolType::Balancer, ("uatom", 1_000_000_000), ("ujuno", 1_400_000_000));
        amm.create_pool(&mut store, 3, PoolType::Balancer, ("ujuno", 1_000_000_000), ("uosmo", 1_000_000_000));
        let engine = ArbEngine::new(amm, FakeBank, accounts());
        engine.init_genesis(&mut store, &genesis()).unwrap();

        let ctx = BlockContext::new(4, genesis_time());
        let outcome = engine.on_post_trade(&mut store, &ctx, &juno_to_atom());
        assert!(matches!(outcome, PostTradeOutcome::Failed(_)));
        let state = engine.get_budget_state(&store).unwrap();
        assert_eq!(state.consumed_points_this_block, 0);
        assert_eq!(state.latest_block_height, 4);
        assert_eq!(engine.get_number_of_trades(&store).unwrap(), 0);
    }

    #[test]
    fn test_missing_genesis_fails_open() {
        let engine = bonus_engine();
        let mut store = MemStore::new();
        let outcome = engine.on_post_trade(&mut store, &BlockContext::new(1, genesis_time()), &juno_to_atom());
        assert!(matches!(outcome, PostTradeOutcome::Failed(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_non_admin_set_base_denoms_rejected() {
        let engine = bonus_engine();
        let mut store = MemStore::new();
        engine.init_genesis(&mut store, &genesis()).unwrap();
        let err = engine
            .set_base_denoms(
                &mut store,
                &acct("mallory"),
                &[BaseDenom { denom: d("uatom"), step_size: U256::from(1u64) }],
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::Unauthorized(_)));
        assert_eq!(engine.get_base_denoms(&store).unwrap(), genesis().base_denoms);
    }
}
