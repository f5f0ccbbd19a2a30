//! Observability types published by the coordinator.

use crate::{FactorGraph, Values};
use std::sync::Arc;

/// What a waiting coordinator is waiting for.
///
/// The two waits share the deadline mechanism but are distinct states:
/// one means "no peers known yet", the other "peers known, graphs
/// pending".
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum WaitingOn {
    /// The answer to a discovery request.
    Discovery,

    /// Subgraph responses from the round's neighbors.
    Subgraphs,
}

/// The coordinator's round lifecycle state.
///
/// Exactly one value is active per robot at any time; the value is
/// published on every drive tick for external observability.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum OptimizerState {
    /// No round in progress.
    Idle,

    /// A round is blocked on an external answer.
    Waiting {
        /// Which answer the round is blocked on.
        on: WaitingOn,
    },

    /// Neighbors are known; subgraph requests are about to go out.
    Collecting,

    /// All contributions arrived; the merged graph is being optimized.
    Optimizing,
}

/// The outcome of one optimization round, published for monitoring and
/// debugging. Not part of the control protocol.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationReport {
    /// Whether the solver converged.
    pub success: bool,

    /// The merged factor graph that was handed to the solver.
    pub graph: FactorGraph,

    /// The refined estimates; empty when `success` is false.
    pub estimates: Values,
}

/// Sink for the coordinator's published outputs.
///
/// All methods have no-op default impls so implementations only pick up
/// what they care about.
pub trait ReportSink: 'static + Send + Sync + std::fmt::Debug {
    /// Notify the current optimizer state. Called once per drive tick.
    fn optimizer_state(&self, _state: OptimizerState) {
        // provided impl is a no-op
    }

    /// Notify the outcome of an optimization round.
    fn optimization_result(&self, _report: &OptimizationReport) {
        // provided impl is a no-op
    }
}

/// Trait-object [ReportSink].
pub type DynReportSink = Arc<dyn ReportSink>;

/// A report sink that discards everything.
#[derive(Debug)]
pub struct NoopReportSink;

impl ReportSink for NoopReportSink {}
