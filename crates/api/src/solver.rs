//! Nonlinear solver related types.

use crate::{BoxFut, FactorGraph, FgError, Values};
use std::sync::Arc;

/// Error produced by a [Solver].
#[derive(Debug, Clone, thiserror::Error)]
pub enum SolverError {
    /// The underlying solver did not converge.
    #[error("optimization diverged - {ctx}")]
    Divergence {
        /// Any context associated with the failure.
        ctx: Arc<str>,
    },

    /// A fleetgraph error.
    #[error("FgError - {0}")]
    Fg(#[from] FgError),
}

impl SolverError {
    /// Construct a divergence error.
    pub fn divergence(ctx: impl Into<Arc<str>>) -> Self {
        Self::Divergence { ctx: ctx.into() }
    }
}

/// Result type for [Solver] operations.
pub type SolverResult<T> = Result<T, SolverError>;

/// A black-box nonlinear least-squares solver.
///
/// The contract: given a factor graph and initial estimates for every
/// referenced pose variable, produce refined estimates. The output must be
/// deterministic for identical inputs. The internal algorithm is not part
/// of this api.
pub trait Solver: 'static + Send + Sync + std::fmt::Debug {
    /// Refine the estimates of `graph`'s pose variables.
    fn optimize(
        &self,
        graph: FactorGraph,
        initial: Values,
    ) -> BoxFut<'_, SolverResult<Values>>;
}

/// Trait-object [Solver].
pub type DynSolver = Arc<dyn Solver>;
