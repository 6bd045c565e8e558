//! Trade statistics: executed cycle count and cumulative profit per denom.

use alloy_primitives::U256;

use crate::error::{EngineError, Result};
use crate::store::{codec, keys, KvStore};
use crate::types::{Coin, Denom};

pub fn get_number_of_trades(store: &dyn KvStore) -> Result<u64> {
    Ok(codec::load(store, keys::KEY_NUMBER_OF_TRADES)?.unwrap_or(0))
}

pub fn increment_number_of_trades(store: &mut dyn KvStore) -> Result<u64> {
    let next = get_number_of_trades(store)? + 1;
    codec::save(store, keys::KEY_NUMBER_OF_TRADES, &next)?;
    Ok(next)
}

pub fn set_number_of_trades(store: &mut dyn KvStore, trades: u64) -> Result<()> {
    codec::save(store, keys::KEY_NUMBER_OF_TRADES, &trades)
}

/// Cumulative profit ever booked in `denom`
pub fn get_profits_by_denom(store: &dyn KvStore, denom: &Denom) -> Result<Coin> {
    codec::load(store, &keys::profits_by_denom(denom))?
        .ok_or_else(|| EngineError::not_found(format!("no profits recorded for {}", denom)))
}

pub fn get_all_profits(store: &dyn KvStore) -> Result<Vec<Coin>> {
    codec::load_all(store, keys::PREFIX_PROFITS_BY_DENOM)
}

pub fn set_profit(store: &mut dyn KvStore, total: &Coin) -> Result<()> {
    codec::save(store, &keys::profits_by_denom(&total.denom), total)
}

pub fn add_profit(store: &mut dyn KvStore, profit: &Coin) -> Result<()> {
    let current = match get_profits_by_denom(store, &profit.denom) {
        Ok(coin) => coin.amount,
        Err(EngineError::NotFound(_)) => U256::ZERO,
        Err(e) => return Err(e),
    };
    let total = current
        .checked_add(profit.amount)
        .ok_or_else(|| EngineError::Store(format!("profit counter for {} overflows", profit.denom)))?;
    set_profit(store, &Coin::new(profit.denom.clone(), total))
}
