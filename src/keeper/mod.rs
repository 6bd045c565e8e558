//! Persisted engine state
//!
//! Free functions over a `KvStore`, one module per entity family. Nothing
//! here holds state between calls.

pub mod admin;
pub mod budget;
pub mod fees;
pub mod genesis;
pub mod params;
pub mod registry;
pub mod stats;

pub use budget::PointCounter;
pub use fees::ProfitSplit;
pub use genesis::{export_genesis, init_genesis, GenesisState};
pub use params::{DeveloperFeeSchedule, EngineConfig, FeeTier, SearchParams};
