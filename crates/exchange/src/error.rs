//! Exchange error types.

use fleetgraph_api::FgError;
use std::sync::Arc;

/// Errors surfaced by the exchange module.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    /// Odometry was delivered with a duplicate or out-of-order keyframe
    /// id. The local graph is left untouched; accepting the sample would
    /// silently corrupt it.
    #[error("invalid odometry sequence - {ctx}")]
    InvalidSequence {
        /// Any context associated with this error.
        ctx: Arc<str>,
    },

    /// A fleetgraph error.
    #[error("FgError - {0}")]
    Fg(#[from] FgError),
}

impl ExchangeError {
    pub(crate) fn invalid_sequence(ctx: impl Into<Arc<str>>) -> Self {
        Self::InvalidSequence { ctx: ctx.into() }
    }
}

/// Result type for exchange operations.
pub type ExchangeResult<T> = Result<T, ExchangeError>;
