//! Engine Errors
//!
//! One error type for the whole engine. Callers of `on_post_trade` never see
//! these: the engine fails open and reports an outcome instead. Admin and
//! query callers get them directly.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Route, pool-index entry, account or record missing from state
    #[error("not found: {0}")]
    NotFound(String),

    #[error("point budget exceeded: requested {requested}, remaining {remaining}")]
    BudgetExceeded { requested: u64, remaining: u64 },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A hop failed, slipped below its quote, or the cycle did not profit.
    /// Always accompanied by a rollback of the attempt.
    #[error("execution failure: {0}")]
    ExecutionFailure(String),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("store error: {0}")]
    Store(String),
}

impl EngineError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid(what: impl Into<String>) -> Self {
        Self::InvalidConfig(what.into())
    }

    /// Failures the engine swallows (skips the attempt) instead of reporting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::BudgetExceeded { .. } | Self::ExecutionFailure(_)
        )
    }
}
