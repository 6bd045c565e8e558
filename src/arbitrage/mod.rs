//! Arbitrage Module
//!
//! Cycle search, atomic execution and the post-trade hook tying them to the
//! persisted state in `keeper`.

pub mod engine;
pub mod executor;
pub mod searcher;

pub use engine::{ArbEngine, EngineAccounts, PostTradeOutcome};
pub use executor::{CycleExecutor, TradeResult};
pub use searcher::{Candidate, RouteSource, SearchOutcome};
