//! Governance Admin
//!
//! Gated entry points for every configuration mutation. The caller check runs
//! before anything is read for writing, so an unauthorized call never changes
//! state.
//!
//! Authorization:
//!     - With an admin set, only the admin may configure the engine
//!     - With no admin set, the governance authority acts in its place
//!     - The authority may always rotate the admin account

use tracing::{info, warn};

use super::{budget, params, registry};
use crate::error::{EngineError, Result};
use crate::store::KvStore;
use crate::types::{AccountId, ArbRoute, BaseDenom, Denom, PoolWeights};

pub fn authorize(store: &dyn KvStore, authority: &AccountId, caller: &AccountId) -> Result<()> {
    let config = params::load_config(store)?;
    let allowed = match &config.admin_account {
        Some(admin) => admin == caller,
        None => authority == caller,
    };
    if !allowed {
        warn!("Rejected configuration change from {}", caller);
        return Err(EngineError::Unauthorized(format!(
            "{} is not the admin account",
            caller
        )));
    }
    Ok(())
}

pub fn set_enabled(
    store: &mut dyn KvStore,
    authority: &AccountId,
    caller: &AccountId,
    enabled: bool,
) -> Result<()> {
    authorize(store, authority, caller)?;
    let mut config = params::load_config(store)?;
    config.enabled = enabled;
    params::save_config(store, &config)?;
    info!("Engine {} by {}", if enabled { "enabled" } else { "disabled" }, caller);
    Ok(())
}

pub fn set_max_points_per_tx(
    store: &mut dyn KvStore,
    authority: &AccountId,
    caller: &AccountId,
    points: u64,
) -> Result<()> {
    authorize(store, authority, caller)?;
    budget::set_max_points_per_tx(store, points)
}

pub fn set_max_points_per_block(
    store: &mut dyn KvStore,
    authority: &AccountId,
    caller: &AccountId,
    points: u64,
) -> Result<()> {
    authorize(store, authority, caller)?;
    budget::set_max_points_per_block(store, points)
}

pub fn set_pool_weights(
    store: &mut dyn KvStore,
    authority: &AccountId,
    caller: &AccountId,
    weights: &PoolWeights,
) -> Result<()> {
    authorize(store, authority, caller)?;
    budget::set_pool_weights(store, weights)
}

/// Replace the base denom list. Cached pools of dropped bases are cleared.
pub fn set_base_denoms(
    store: &mut dyn KvStore,
    authority: &AccountId,
    caller: &AccountId,
    base_denoms: &[BaseDenom],
) -> Result<()> {
    authorize(store, authority, caller)?;
    let previous = registry::get_base_denoms(store)?;
    registry::set_base_denoms(store, base_denoms)?;
    for old in previous {
        if registry::base_denom_position(base_denoms, &old.denom).is_none() {
            registry::delete_all_pools_for_base(store, &old.denom);
        }
    }
    info!("Base denoms replaced by {}: {} entries", caller, base_denoms.len());
    Ok(())
}

pub fn set_routes(
    store: &mut dyn KvStore,
    authority: &AccountId,
    caller: &AccountId,
    a: &Denom,
    b: &Denom,
    routes: Vec<ArbRoute>,
) -> Result<()> {
    authorize(store, authority, caller)?;
    let max_hops = params::load_config(store)?.search.max_hops;
    registry::set_routes(store, a, b, routes, max_hops)
}

/// The current admin or the governance authority may rotate the admin.
pub fn set_admin_account(
    store: &mut dyn KvStore,
    authority: &AccountId,
    caller: &AccountId,
    admin: AccountId,
) -> Result<()> {
    if caller != authority {
        authorize(store, authority, caller)?;
    }
    let mut config = params::load_config(store)?;
    info!("Admin account set to {} by {}", admin, caller);
    config.admin_account = Some(admin);
    params::save_config(store, &config)
}

pub fn set_developer_account(
    store: &mut dyn KvStore,
    authority: &AccountId,
    caller: &AccountId,
    developer: AccountId,
) -> Result<()> {
    authorize(store, authority, caller)?;
    let mut config = params::load_config(store)?;
    info!("Developer account set to {} by {}", developer, caller);
    config.developer_account = Some(developer);
    params::save_config(store, &config)
}
