//! Fee Distributor
//!
//! Splits realized profit between the developer fund and the treasury.
//! The developer share follows the configured schedule, keyed on whole days
//! since module genesis (block time, never wall-clock time).
//!
//! Both shares stay in the module account. The developer share is also
//! credited to the withdrawable ledger; the treasury share is simply what
//! the ledger does not claim. Every booked profit is added to the cumulative
//! profit statistics, so developer fees can never exceed what was booked.

use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{params, stats};
use crate::collaborators::BalanceLedger;
use crate::error::{EngineError, Result};
use crate::store::{codec, keys, KvStore};
use crate::types::{AccountId, Coin, Denom};

const BPS_DENOMINATOR: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitSplit {
    pub developer: Coin,
    pub treasury: Coin,
}

pub fn get_module_genesis_time(store: &dyn KvStore) -> Result<DateTime<Utc>> {
    codec::load(store, keys::KEY_MODULE_GENESIS_TIME)?
        .ok_or_else(|| EngineError::not_found("module genesis time has not been set"))
}

pub fn set_module_genesis_time(store: &mut dyn KvStore, time: DateTime<Utc>) -> Result<()> {
    codec::save(store, keys::KEY_MODULE_GENESIS_TIME, &time)
}

/// Whole days between module genesis and `now`; zero if `now` is earlier
pub fn days_since_genesis(store: &dyn KvStore, now: DateTime<Utc>) -> Result<u64> {
    let genesis = get_module_genesis_time(store)?;
    Ok(now.signed_duration_since(genesis).num_days().max(0) as u64)
}

/// Split `profit` with `share_bps` basis points going to the developer.
/// The developer share rounds down; the treasury gets the remainder.
pub fn split_profit(profit: &Coin, share_bps: u32) -> ProfitSplit {
    let bps = U256::from(share_bps.min(BPS_DENOMINATOR as u32));
    let denominator = U256::from(BPS_DENOMINATOR);
    let developer = match profit.amount.checked_mul(bps) {
        Some(scaled) => scaled / denominator,
        None => (profit.amount / denominator) * bps,
    };
    ProfitSplit {
        developer: Coin::new(profit.denom.clone(), developer),
        treasury: Coin::new(profit.denom.clone(), profit.amount - developer),
    }
}

/// Book a realized profit already held by the module account.
///
/// No funds move: the developer share is credited to the withdrawable
/// ledger and the treasury share remains in the module's own balance.
pub fn book_profit(store: &mut dyn KvStore, now: DateTime<Utc>, profit: &Coin) -> Result<ProfitSplit> {
    let config = params::load_config(store)?;
    let days = days_since_genesis(store, now)?;
    let share_bps = config.developer_fee_schedule.share_bps(days);
    let split = split_profit(profit, share_bps);

    if !split.developer.amount.is_zero() {
        add_developer_fees(store, &split.developer)?;
    }
    stats::add_profit(store, profit)?;

    debug!(
        "Profit {} booked: developer {} ({} bps, day {}), treasury {}",
        profit, split.developer, share_bps, days, split.treasury
    );
    Ok(split)
}

pub fn get_developer_fees(store: &dyn KvStore, denom: &Denom) -> Result<Coin> {
    codec::load(store, &keys::developer_fees(denom))?
        .ok_or_else(|| EngineError::not_found(format!("developer fees for {} not found", denom)))
}

pub fn get_all_developer_fees(store: &dyn KvStore) -> Result<Vec<Coin>> {
    codec::load_all(store, keys::PREFIX_DEVELOPER_FEES)
}

pub fn set_developer_fees(store: &mut dyn KvStore, fees: &Coin) -> Result<()> {
    codec::save(store, &keys::developer_fees(&fees.denom), fees)
}

fn add_developer_fees(store: &mut dyn KvStore, fees: &Coin) -> Result<()> {
    let current = match get_developer_fees(store, &fees.denom) {
        Ok(coin) => coin.amount,
        Err(EngineError::NotFound(_)) => U256::ZERO,
        Err(e) => return Err(e),
    };
    let total = current
        .checked_add(fees.amount)
        .ok_or_else(|| EngineError::Store(format!("developer fees for {} overflow", fees.denom)))?;
    set_developer_fees(store, &Coin::new(fees.denom.clone(), total))
}

/// Pay out every accrued denom to the developer account and clear the ledger.
///
/// Only the configured developer account may call this. All transfers
/// happen before any ledger entry is removed; a failed transfer returns an
/// error and the caller discards the state branch.
pub fn withdraw_developer_fees(
    store: &mut dyn KvStore,
    bank: &dyn BalanceLedger,
    module: &AccountId,
    caller: &AccountId,
) -> Result<Vec<Coin>> {
    let config = params::load_config(store)?;
    match &config.developer_account {
        Some(developer) if developer == caller => {}
        Some(_) => {
            return Err(EngineError::Unauthorized(format!(
                "{} is not the developer account",
                caller
            )))
        }
        None => {
            return Err(EngineError::Unauthorized(
                "developer account has not been set".to_string(),
            ))
        }
    }

    let fees: Vec<Coin> = get_all_developer_fees(store)?
        .into_iter()
        .filter(|c| !c.amount.is_zero())
        .collect();
    for fee in &fees {
        bank.transfer(store, module, caller, fee)
            .map_err(|e| EngineError::ExecutionFailure(format!("developer withdrawal failed: {}", e)))?;
    }
    store.delete_prefix(keys::PREFIX_DEVELOPER_FEES);

    info!("Developer fees withdrawn by {}: {} denoms", caller, fees.len());
    Ok(fees)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keeper::params::EngineConfig;
    use crate::store::MemStore;
    use crate::testutil::{acct, coin, d, FakeBank};
    use chrono::{Duration, TimeZone};

    fn genesis_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn setup() -> (MemStore, FakeBank) {
        let mut store = MemStore::new();
        let config = EngineConfig {
            developer_account: Some(acct("dev")),
            ..EngineConfig::default()
        };
        params::save_config(&mut store, &config).unwrap();
        set_module_genesis_time(&mut store, genesis_time()).unwrap();
        (store, FakeBank)
    }

    #[test]
    fn test_split_rounds_down_for_developer() {
        let split = split_profit(&coin("uosmo", 1_001), 2_000);
        assert_eq!(split.developer, coin("uosmo", 200));
        assert_eq!(split.treasury, coin("uosmo", 801));

        let huge = Coin::new(d("uosmo"), U256::MAX);
        let split = split_profit(&huge, 500);
        assert_eq!(split.developer.amount + split.treasury.amount, U256::MAX);
    }

    #[test]
    fn test_book_profit_follows_schedule() {
        let (mut store, bank) = setup();
        let module = acct("module");
        bank.credit(&mut store, &module, &coin("uosmo", 3_000));

        let first = book_profit(&mut store, genesis_time(), &coin("uosmo", 1_000)).unwrap();
        let year_two = genesis_time() + Duration::days(400);
        let second = book_profit(&mut store, year_two, &coin("uosmo", 1_000)).unwrap();
        let later = genesis_time() + Duration::days(800);
        let third = book_profit(&mut store, later, &coin("uosmo", 1_000)).unwrap();

        // 200 + 100 + 50
        assert_eq!(get_developer_fees(&store, &d("uosmo")).unwrap(), coin("uosmo", 350));
        let treasury = first.treasury.amount + second.treasury.amount + third.treasury.amount;
        assert_eq!(treasury, U256::from(2_650u64));
        // nothing leaves the module account
        assert_eq!(bank.balance(&store, &module, &d("uosmo")), U256::from(3_000u64));
        assert_eq!(
            stats::get_profits_by_denom(&store, &d("uosmo")).unwrap(),
            coin("uosmo", 3_000)
        );
    }

    #[test]
    fn test_fee_conservation() {
        let (mut store, bank) = setup();
        let module = acct("module");
        let profits = [7u64, 1, 999, 12_345, 3];
        let booked: u64 = profits.iter().sum();
        bank.credit(&mut store, &module, &coin("uatom", booked));

        let mut treasury_total = U256::ZERO;
        for p in profits {
            treasury_total += book_profit(&mut store, genesis_time(), &coin("uatom", p)).unwrap().treasury.amount;
        }
        let dev = get_developer_fees(&store, &d("uatom")).unwrap().amount;
        assert_eq!(dev + treasury_total, U256::from(booked));
        assert_eq!(bank.balance(&store, &module, &d("uatom")), U256::from(booked));

        // after the developer is paid, the treasury share is what the module keeps
        withdraw_developer_fees(&mut store, &bank, &module, &acct("dev")).unwrap();
        assert_eq!(bank.balance(&store, &module, &d("uatom")), treasury_total);
    }

    #[test]
    fn test_withdraw_requires_developer() {
        let (mut store, bank) = setup();
        let module = acct("module");
        bank.credit(&mut store, &module, &coin("uosmo", 100));
        set_developer_fees(&mut store, &coin("uosmo", 100)).unwrap();

        let err = withdraw_developer_fees(&mut store, &bank, &module, &acct("mallory")).unwrap_err();
        assert!(matches!(err, EngineError::Unauthorized(_)));
        assert_eq!(get_developer_fees(&store, &d("uosmo")).unwrap(), coin("uosmo", 100));
    }

    #[test]
    fn test_withdraw_pays_and_zeroes_every_denom() {
        let (mut store, bank) = setup();
        let module = acct("module");
        let dev = acct("dev");
        bank.credit(&mut store, &module, &coin("uosmo", 100));
        bank.credit(&mut store, &module, &coin("uatom", 40));
        set_developer_fees(&mut store, &coin("uosmo", 100)).unwrap();
        set_developer_fees(&mut store, &coin("uatom", 40)).unwrap();

        let paid = withdraw_developer_fees(&mut store, &bank, &module, &dev).unwrap();
        assert_eq!(paid, vec![coin("uatom", 40), coin("uosmo", 100)]);
        assert!(get_all_developer_fees(&store).unwrap().is_empty());
        assert_eq!(bank.balance(&store, &dev, &d("uosmo")), U256::from(100u64));
        assert_eq!(bank.balance(&store, &dev, &d("uatom")), U256::from(40u64));
    }
}
