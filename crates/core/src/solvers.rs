//! Reference solver implementations.

use fleetgraph_api::{
    BoxFut, DynSolver, FactorGraph, Solver, SolverError, SolverResult,
    Values,
};
use std::sync::Arc;

/// A solver that returns the initial estimates unchanged.
///
/// Deterministic and always "converges". Useful as a stand-in where the
/// interesting behavior under test is the coordination protocol rather
/// than the numerics.
#[derive(Debug)]
pub struct IdentitySolver;

impl IdentitySolver {
    /// Construct a new [IdentitySolver].
    pub fn create() -> DynSolver {
        Arc::new(IdentitySolver)
    }
}

impl Solver for IdentitySolver {
    fn optimize(
        &self,
        graph: FactorGraph,
        initial: Values,
    ) -> BoxFut<'_, SolverResult<Values>> {
        Box::pin(async move {
            tracing::debug!(
                "identity solve over {} factors, {} estimates",
                graph.factor_count(),
                initial.len()
            );
            Ok(initial)
        })
    }
}

/// A solver that always reports divergence.
///
/// Useful for exercising the unsuccessful-round path.
#[derive(Debug)]
pub struct DivergentSolver;

impl DivergentSolver {
    /// Construct a new [DivergentSolver].
    pub fn create() -> DynSolver {
        Arc::new(DivergentSolver)
    }
}

impl Solver for DivergentSolver {
    fn optimize(
        &self,
        _graph: FactorGraph,
        _initial: Values,
    ) -> BoxFut<'_, SolverResult<Values>> {
        Box::pin(async move {
            Err(SolverError::divergence("divergent test solver"))
        })
    }
}
