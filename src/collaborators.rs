//! Collaborator interfaces
//!
//! Capabilities the engine borrows from sibling subsystems. They are injected
//! at construction and receive the store explicitly, so whatever they write
//! lands in the same branch the engine commits or discards.

use alloy_primitives::U256;
use chrono::{DateTime, Utc};

use crate::store::KvStore;
use crate::types::{AccountId, Coin, Denom, Hop, PoolId, PoolType};

/// AMM pricing and execution
pub trait PricingEngine {
    /// Output of swapping `amount_in` through `hop`. Must not write state.
    fn quote(&self, store: &dyn KvStore, hop: &Hop, amount_in: U256) -> anyhow::Result<U256>;

    /// Swap `amount_in` from `sender` through `hop`, crediting the output to
    /// `sender`. Mutates pool reserves and balances.
    fn swap(
        &self,
        store: &mut dyn KvStore,
        sender: &AccountId,
        hop: &Hop,
        amount_in: U256,
    ) -> anyhow::Result<U256>;

    fn pool_type(&self, store: &dyn KvStore, pool_id: PoolId) -> anyhow::Result<PoolType>;
}

/// Account balances
pub trait BalanceLedger {
    fn balance(&self, store: &dyn KvStore, account: &AccountId, denom: &Denom) -> U256;

    fn transfer(
        &self,
        store: &mut dyn KvStore,
        from: &AccountId,
        to: &AccountId,
        coin: &Coin,
    ) -> anyhow::Result<()>;

    fn mint(&self, store: &mut dyn KvStore, to: &AccountId, coin: &Coin) -> anyhow::Result<()>;

    fn burn(&self, store: &mut dyn KvStore, from: &AccountId, coin: &Coin) -> anyhow::Result<()>;
}

/// Consensus-agreed block header data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockContext {
    pub height: u64,
    pub time: DateTime<Utc>,
}

impl BlockContext {
    pub fn new(height: u64, time: DateTime<Utc>) -> Self {
        Self { height, time }
    }
}
