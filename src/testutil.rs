//! Test doubles for the collaborator traits.
//!
//! `FakeAmm` is a constant-product AMM (0.3% fee) and `FakeBank` a balance
//! table; both keep their state in the store handed to them, so a discarded
//! branch rolls their effects back with everything else.

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::U256;
use anyhow::{anyhow, bail, ensure};
use serde::{Deserialize, Serialize};

use crate::collaborators::{BalanceLedger, PricingEngine};
use crate::store::{codec, KvStore};
use crate::types::{AccountId, Coin, Denom, Hop, PoolId, PoolType};

const PREFIX_FAKE_POOL: u8 = 0xF0;
const PREFIX_FAKE_BALANCE: u8 = 0xF1;

pub fn d(s: &str) -> Denom {
    Denom::new(s).unwrap()
}

pub fn acct(s: &str) -> AccountId {
    AccountId::new(s).unwrap()
}

pub fn coin(denom: &str, amount: u64) -> Coin {
    Coin::new(d(denom), U256::from(amount))
}

fn balance_key(account: &AccountId, denom: &Denom) -> Vec<u8> {
    let mut key = vec![PREFIX_FAKE_BALANCE];
    key.extend_from_slice(account.as_str().as_bytes());
    key.push(0);
    key.extend_from_slice(denom.as_str().as_bytes());
    key
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FakeBank;

impl FakeBank {
    fn set_balance(&self, store: &mut dyn KvStore, account: &AccountId, denom: &Denom, amount: U256) {
        let bz = codec::encode(&amount).unwrap();
        store.set(&balance_key(account, denom), bz);
    }

    pub fn credit(&self, store: &mut dyn KvStore, account: &AccountId, coin: &Coin) {
        let current = self.balance(store, account, &coin.denom);
        self.set_balance(store, account, &coin.denom, current + coin.amount);
    }

    pub fn debit(&self, store: &mut dyn KvStore, account: &AccountId, coin: &Coin) -> anyhow::Result<()> {
        let current = self.balance(store, account, &coin.denom);
        let next = current
            .checked_sub(coin.amount)
            .ok_or_else(|| anyhow!("insufficient funds: {} has {}, needs {}", account, current, coin))?;
        self.set_balance(store, account, &coin.denom, next);
        Ok(())
    }
}

impl BalanceLedger for FakeBank {
    fn balance(&self, store: &dyn KvStore, account: &AccountId, denom: &Denom) -> U256 {
        codec::load(store, &balance_key(account, denom))
            .unwrap()
            .unwrap_or(U256::ZERO)
    }

    fn transfer(
        &self,
        store: &mut dyn KvStore,
        from: &AccountId,
        to: &AccountId,
        coin: &Coin,
    ) -> anyhow::Result<()> {
        self.debit(store, from, coin)?;
        self.credit(store, to, coin);
        Ok(())
    }

    fn mint(&self, store: &mut dyn KvStore, to: &AccountId, coin: &Coin) -> anyhow::Result<()> {
        self.credit(store, to, coin);
        Ok(())
    }

    fn burn(&self, store: &mut dyn KvStore, from: &AccountId, coin: &Coin) -> anyhow::Result<()> {
        self.debit(store, from, coin)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FakePool {
    pool_type: PoolType,
    denom_a: Denom,
    reserve_a: U256,
    denom_b: Denom,
    reserve_b: U256,
}

impl FakePool {
    fn reserves(&self, hop: &Hop) -> anyhow::Result<(U256, U256)> {
        if hop.denom_in == self.denom_a && hop.denom_out == self.denom_b {
            Ok((self.reserve_a, self.reserve_b))
        } else if hop.denom_in == self.denom_b && hop.denom_out == self.denom_a {
            Ok((self.reserve_b, self.reserve_a))
        } else {
            bail!("pool {} does not trade {} -> {}", hop.pool_id, hop.denom_in, hop.denom_out)
        }
    }
}

fn pool_key(pool_id: PoolId) -> Vec<u8> {
    let mut key = vec![PREFIX_FAKE_POOL];
    key.extend_from_slice(&pool_id.to_be_bytes());
    key
}

fn amount_out(amount_in: U256, reserve_in: U256, reserve_out: U256) -> U256 {
    if amount_in.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() {
        return U256::ZERO;
    }
    let with_fee = amount_in * U256::from(997u64);
    (with_fee * reserve_out) / (reserve_in * U256::from(1000u64) + with_fee)
}

/// Constant-product AMM keeping pools in the store
#[derive(Debug, Clone, Default)]
pub struct FakeAmm {
    pub bank: FakeBank,
    /// Pools whose swaps fail (quotes still succeed)
    frozen: BTreeSet<PoolId>,
}

impl FakeAmm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frozen(pools: &[PoolId]) -> Self {
        Self {
            bank: FakeBank,
            frozen: pools.iter().copied().collect(),
        }
    }

    pub fn create_pool(
        &self,
        store: &mut dyn KvStore,
        pool_id: PoolId,
        pool_type: PoolType,
        a: (&str, u64),
        b: (&str, u64),
    ) {
        let pool = FakePool {
            pool_type,
            denom_a: d(a.0),
            reserve_a: U256::from(a.1),
            denom_b: d(b.0),
            reserve_b: U256::from(b.1),
        };
        codec::save(store, &pool_key(pool_id), &pool).unwrap();
    }

    fn load_pool(&self, store: &dyn KvStore, pool_id: PoolId) -> anyhow::Result<FakePool> {
        codec::load(store, &pool_key(pool_id))?.ok_or_else(|| anyhow!("pool {} does not exist", pool_id))
    }
}

impl PricingEngine for FakeAmm {
    fn quote(&self, store: &dyn KvStore, hop: &Hop, amount_in: U256) -> anyhow::Result<U256> {
        let pool = self.load_pool(store, hop.pool_id)?;
        let (reserve_in, reserve_out) = pool.reserves(hop)?;
        Ok(amount_out(amount_in, reserve_in, reserve_out))
    }

    fn swap(
        &self,
        store: &mut dyn KvStore,
        sender: &AccountId,
        hop: &Hop,
        amount_in: U256,
    ) -> anyhow::Result<U256> {
        ensure!(!self.frozen.contains(&hop.pool_id), "pool {} is frozen", hop.pool_id);
        let mut pool = self.load_pool(store, hop.pool_id)?;
        let (reserve_in, reserve_out) = pool.reserves(hop)?;
        let out = amount_out(amount_in, reserve_in, reserve_out);
        ensure!(!out.is_zero(), "swap through pool {} yields nothing", hop.pool_id);

        self.bank
            .debit(store, sender, &Coin::new(hop.denom_in.clone(), amount_in))?;
        self.bank
            .credit(store, sender, &Coin::new(hop.denom_out.clone(), out));

        if hop.denom_in == pool.denom_a {
            pool.reserve_a += amount_in;
            pool.reserve_b -= out;
        } else {
            pool.reserve_b += amount_in;
            pool.reserve_a -= out;
        }
        codec::save(store, &pool_key(hop.pool_id), &pool)?;
        Ok(out)
    }

    fn pool_type(&self, store: &dyn KvStore, pool_id: PoolId) -> anyhow::Result<PoolType> {
        Ok(self.load_pool(store, pool_id)?.pool_type)
    }
}

/// Every hop returns its input plus a fixed per-pool bonus. Profit of a
/// cycle is therefore the sum of its bonuses, independent of input size.
#[derive(Debug, Clone, Default)]
pub struct BonusAmm {
    pub bank: FakeBank,
    bonuses: BTreeMap<PoolId, u64>,
    pool_type: BTreeMap<PoolId, PoolType>,
}

impl BonusAmm {
    pub fn new(pools: &[(PoolId, PoolType, u64)]) -> Self {
        Self {
            bank: FakeBank,
            bonuses: pools.iter().map(|(id, _, bonus)| (*id, *bonus)).collect(),
            pool_type: pools.iter().map(|(id, ty, _)| (*id, *ty)).collect(),
        }
    }
}

impl PricingEngine for BonusAmm {
    fn quote(&self, _store: &dyn KvStore, hop: &Hop, amount_in: U256) -> anyhow::Result<U256> {
        let bonus = self
            .bonuses
            .get(&hop.pool_id)
            .ok_or_else(|| anyhow!("pool {} does not exist", hop.pool_id))?;
        Ok(amount_in + U256::from(*bonus))
    }

    fn swap(
        &self,
        store: &mut dyn KvStore,
        sender: &AccountId,
        hop: &Hop,
        amount_in: U256,
    ) -> anyhow::Result<U256> {
        let out = self.quote(store, hop, amount_in)?;
        self.bank
            .debit(store, sender, &Coin::new(hop.denom_in.clone(), amount_in))?;
        self.bank
            .credit(store, sender, &Coin::new(hop.denom_out.clone(), out));
        Ok(out)
    }

    fn pool_type(&self, _store: &dyn KvStore, pool_id: PoolId) -> anyhow::Result<PoolType> {
        self.pool_type
            .get(&pool_id)
            .copied()
            .ok_or_else(|| anyhow!("pool {} does not exist", pool_id))
    }
}
