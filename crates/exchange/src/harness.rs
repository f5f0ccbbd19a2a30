//! Functional test harness for the subgraph exchange.
//!
//! Wires coordinators for several robots over an in-memory fleet: the
//! [fleetgraph_core] stub transport, discovery and solvers. Used by the
//! integration tests; not meant for production wiring.

use crate::{ExchangeConfig, PoseGraphExchange};
use fleetgraph_api::{
    DynSolver, OptimizationReport, OptimizerState, ReportSink, RobotId,
};
use fleetgraph_core::{MemTransportHub, StaticDiscovery};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A report sink that records everything published to it.
#[derive(Debug, Default)]
pub struct RecordingReportSink {
    states: Mutex<Vec<OptimizerState>>,
    results: Mutex<Vec<OptimizationReport>>,
}

impl RecordingReportSink {
    /// Every optimizer state published so far, in order.
    pub fn states(&self) -> Vec<OptimizerState> {
        self.states.lock().unwrap().clone()
    }

    /// Every optimization result published so far, in order.
    pub fn results(&self) -> Vec<OptimizationReport> {
        self.results.lock().unwrap().clone()
    }
}

impl ReportSink for RecordingReportSink {
    fn optimizer_state(&self, state: OptimizerState) {
        self.states.lock().unwrap().push(state);
    }

    fn optimization_result(&self, report: &OptimizationReport) {
        self.results.lock().unwrap().push(report.clone());
    }
}

/// A functional test harness around one robot's coordinator.
#[derive(Debug, Clone)]
pub struct ExchangeTestHarness {
    /// The coordinator under test.
    pub exchange: PoseGraphExchange,

    /// The sink recording the coordinator's published outputs.
    pub report: Arc<RecordingReportSink>,
}

impl ExchangeTestHarness {
    /// Wait until a published optimizer state satisfies `pred`.
    ///
    /// Panics when `timeout` elapses first.
    pub async fn wait_for_state(
        &self,
        pred: impl Fn(OptimizerState) -> bool,
        timeout: Duration,
    ) {
        tokio::time::timeout(timeout, async {
            loop {
                if self.report.states().into_iter().any(&pred) {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("Timed out waiting for state")
    }

    /// Wait until at least `count` optimization results have been
    /// published, and return them.
    ///
    /// Panics when `timeout` elapses first.
    pub async fn wait_for_results(
        &self,
        count: usize,
        timeout: Duration,
    ) -> Vec<OptimizationReport> {
        tokio::time::timeout(timeout, async {
            loop {
                let results = self.report.results();
                if results.len() >= count {
                    return results;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("Timed out waiting for optimization results")
    }
}

/// Builds robot coordinators sharing one in-memory fleet.
#[derive(Debug)]
pub struct ExchangeTestFactory {
    hub: Arc<MemTransportHub>,
    nb_robots: u32,
}

impl ExchangeTestFactory {
    /// Construct a factory for a fleet of `nb_robots`.
    pub fn new(nb_robots: u32) -> Self {
        Self {
            hub: MemTransportHub::new(),
            nb_robots,
        }
    }

    /// A config with intervals short enough for tests.
    pub fn fast_config(&self, robot_id: u32) -> ExchangeConfig {
        ExchangeConfig {
            nb_robots: self.nb_robots,
            robot_id,
            round_interval_ms: 50,
            drive_interval_ms: 10,
            round_timeout_s: 1,
            ..Default::default()
        }
    }

    /// Spawn a coordinator on the shared fleet.
    ///
    /// `neighbors` configures the robot's discovery stub; `None` makes
    /// discovery unresponsive, so this robot's own rounds stall and time
    /// out while it keeps answering other robots' subgraph requests.
    pub async fn new_instance(
        &self,
        config: ExchangeConfig,
        neighbors: Option<Vec<RobotId>>,
        solver: DynSolver,
    ) -> ExchangeTestHarness {
        let discovery = match neighbors {
            Some(ids) => StaticDiscovery::new(ids),
            None => StaticDiscovery::unresponsive(),
        };
        let report = Arc::new(RecordingReportSink::default());

        let exchange = PoseGraphExchange::create(
            config.clone(),
            self.hub.endpoint(config.self_id()),
            discovery,
            solver,
            report.clone(),
        )
        .await
        .expect("Could not create exchange instance");

        ExchangeTestHarness { exchange, report }
    }
}
