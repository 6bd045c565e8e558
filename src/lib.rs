//! Cyclic Arbitrage Engine
//!
//! Budget-metered detection and atomic execution of closed trading cycles,
//! run as post-processing after each trade in a deterministic replicated
//! state machine. The AMM, balances and the durable store are supplied by
//! the host through traits.

pub mod arbitrage;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod keeper;
pub mod logging;
pub mod store;
pub mod types;

#[cfg(test)]
mod testutil;

pub use arbitrage::{ArbEngine, EngineAccounts, PostTradeOutcome};
pub use collaborators::{BalanceLedger, BlockContext, PricingEngine};
pub use config::EngineSettings;
pub use error::{EngineError, Result};
pub use keeper::{EngineConfig, GenesisState};
pub use store::{BranchStore, KvStore, MemStore};
pub use types::{AccountId, ArbRoute, BaseDenom, Coin, Denom, Hop, PoolType, SwapEvent};
