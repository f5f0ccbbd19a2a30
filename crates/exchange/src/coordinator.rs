use crate::aggregate::aggregate_pose_graphs;
use crate::closures::LoopClosureStore;
use crate::connectivity::resolve_connected;
use crate::drive::{spawn_drive_task, spawn_round_start_task};
use crate::local_graph::LocalPoseGraph;
use crate::respond;
use crate::state::RoundState;
use crate::{ExchangeConfig, ExchangeResult};
use fleetgraph_api::protocol::{
    decode_message, encode_message, ExchangeMessage, SubgraphRequest,
    SubgraphResponse,
};
use fleetgraph_api::{
    BetweenFactor, DynDiscovery, DynReportSink, DynSolver, DynTransport,
    FgError, FgResult, KeyframeId, MessageHandler, NeighborHandler,
    OptimizationReport, OptimizerState, Pose, PoseKey, RobotId, Values,
    WaitingOn,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
pub(crate) struct DropAbortHandle {
    pub(crate) name: String,
    pub(crate) handle: tokio::task::AbortHandle,
}

impl Drop for DropAbortHandle {
    fn drop(&mut self) {
        tracing::info!("Aborting: {}", self.name);
        self.handle.abort();
    }
}

/// The back-end coordinator for one robot's collaborative pose-graph
/// estimation.
///
/// This type acts as the [MessageHandler] for the subgraph exchange and
/// the [NeighborHandler] for discovery answers, and owns the two periodic
/// tasks that start and drive rounds. All mutable state lives behind one
/// coordinating lock: every handler and tick runs its full
/// read-modify-write sequence under it.
#[derive(Debug, Clone)]
pub struct PoseGraphExchange {
    pub(crate) config: Arc<ExchangeConfig>,
    pub(crate) transport: DynTransport,
    pub(crate) discovery: DynDiscovery,
    pub(crate) solver: DynSolver,
    pub(crate) report: DynReportSink,
    pub(crate) inner: Arc<Mutex<ExchangeInner>>,
    _round_start_task: Arc<Option<DropAbortHandle>>,
    _drive_task: Arc<Option<DropAbortHandle>>,
}

#[derive(Debug)]
pub(crate) struct ExchangeInner {
    pub(crate) local: LocalPoseGraph,
    pub(crate) closures: LoopClosureStore,
    pub(crate) round: RoundState,
    pub(crate) state: OptimizerState,
    /// Set exactly while `state` is a waiting state.
    pub(crate) deadline: Option<Instant>,
}

impl ExchangeInner {
    fn new(config: &ExchangeConfig) -> Self {
        Self {
            local: LocalPoseGraph::new(
                config.self_id(),
                config.noise_model(),
            ),
            closures: LoopClosureStore::default(),
            round: RoundState::default(),
            state: OptimizerState::Idle,
            deadline: None,
        }
    }
}

impl PoseGraphExchange {
    /// Construct a new [PoseGraphExchange] instance.
    ///
    /// Registers itself with the transport and the discovery service and
    /// spawns the round-start and drive tasks; both die with this
    /// instance.
    pub async fn create(
        config: ExchangeConfig,
        transport: DynTransport,
        discovery: DynDiscovery,
        solver: DynSolver,
        report: DynReportSink,
    ) -> FgResult<PoseGraphExchange> {
        if config.robot_id >= config.nb_robots {
            return Err(FgError::other(format!(
                "robot id {} out of range for a fleet of {}",
                config.robot_id, config.nb_robots
            )));
        }

        let config = Arc::new(config);
        let mut exchange = PoseGraphExchange {
            config: config.clone(),
            transport: transport.clone(),
            discovery: discovery.clone(),
            solver,
            report,
            inner: Arc::new(Mutex::new(ExchangeInner::new(&config))),
            _round_start_task: Default::default(),
            _drive_task: Default::default(),
        };

        transport.register_handler(Arc::new(exchange.clone()));
        discovery.register_handler(Arc::new(exchange.clone()));

        let round_start_task =
            spawn_round_start_task(config.clone(), exchange.clone());
        exchange._round_start_task = Arc::new(Some(DropAbortHandle {
            name: format!("Round start task ({})", config.self_id()),
            handle: round_start_task,
        }));
        let drive_task = spawn_drive_task(config.clone(), exchange.clone());
        exchange._drive_task = Arc::new(Some(DropAbortHandle {
            name: format!("Round drive task ({})", config.self_id()),
            handle: drive_task,
        }));

        tracing::info!("Initialization done for {}", config.self_id());
        Ok(exchange)
    }

    /// Ingest one odometry sample from the front end.
    ///
    /// Keyframe ids must be strictly increasing; a duplicate or
    /// out-of-order id is rejected with
    /// [InvalidSequence](crate::ExchangeError::InvalidSequence).
    pub async fn ingest_odometry(
        &self,
        keyframe: KeyframeId,
        pose: Pose,
    ) -> ExchangeResult<()> {
        let mut inner = self.inner.lock().await;
        inner.local.ingest(keyframe, pose)
    }

    /// Record an inter-robot loop-closure detection.
    ///
    /// Detections with `accepted` false are dropped; accepted ones are
    /// stored for the unordered robot pair of the two keys.
    pub async fn record_loop_closure(
        &self,
        from: PoseKey,
        to: PoseKey,
        measured: Pose,
        accepted: bool,
    ) {
        let mut inner = self.inner.lock().await;
        let factor = BetweenFactor::new(
            from,
            to,
            measured,
            self.config.noise_model(),
        );
        inner.closures.record(factor, accepted);
    }

    /// Attempt to start a round. No-op unless idle.
    pub(crate) async fn round_start_tick(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state != OptimizerState::Idle {
            return;
        }

        // Nothing to contribute or anchor before the first keyframe.
        if inner.local.is_empty() {
            return;
        }

        inner.round.reset();
        if let Err(e) = self.discovery.request_neighbors().await {
            tracing::warn!("could not request neighbors: {e:?}");
            return;
        }

        inner.state = OptimizerState::Waiting {
            on: WaitingOn::Discovery,
        };
        inner.deadline = Some(Instant::now() + self.config.round_timeout());
        tracing::debug!("round started, waiting for discovery");
    }

    /// Move an active round through its transitions, check the waiting
    /// deadline and publish the optimizer state.
    pub(crate) async fn drive_tick(&self) {
        let mut inner = self.inner.lock().await;

        if !inner.local.is_empty() {
            match inner.state {
                OptimizerState::Collecting => {
                    self.broadcast_subgraph_requests(&mut inner).await;
                }
                OptimizerState::Optimizing => {
                    self.perform_optimization(&mut inner).await;
                    inner.state = OptimizerState::Idle;
                }
                OptimizerState::Waiting { on } => {
                    check_deadline(&mut inner, on);
                }
                OptimizerState::Idle => {}
            }
        }

        self.report.optimizer_state(inner.state);
    }

    async fn broadcast_subgraph_requests(&self, inner: &mut ExchangeInner) {
        if inner.round.neighbors().is_empty() {
            tracing::debug!("no neighbors this round");
            inner.state = OptimizerState::Idle;
            return;
        }

        let request = ExchangeMessage::SubgraphRequest(SubgraphRequest {
            participants: inner.round.participants(self.config.self_id()),
        });
        let data = match encode_message(&request) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!("could not encode subgraph request: {e:?}");
                inner.state = OptimizerState::Idle;
                return;
            }
        };

        for &id in inner.round.neighbors() {
            if let Err(e) = self.transport.send(id, data.clone()).await {
                tracing::warn!(
                    "could not request subgraph from {id}: {e:?}"
                );
            }
        }

        inner.state = OptimizerState::Waiting {
            on: WaitingOn::Subgraphs,
        };
        inner.deadline = Some(Instant::now() + self.config.round_timeout());
        tracing::debug!(
            "requested {} subgraphs",
            inner.round.neighbors().len()
        );
    }

    async fn perform_optimization(&self, inner: &mut ExchangeInner) {
        let participants =
            inner.round.participants(self.config.self_id());
        let self_links =
            respond::declared_connectivity(&inner.closures, &participants);
        let connected = resolve_connected(
            self.config.self_id(),
            self.config.nb_robots,
            &self_links,
            inner.round.connectivity(),
        );

        let (graph, estimates) = aggregate_pose_graphs(
            self.config.self_id(),
            self.config.noise_model(),
            &inner.local,
            &inner.closures,
            &inner.round,
            &connected,
        );

        match self.solver.optimize(graph.clone(), estimates).await {
            Ok(refined) => {
                tracing::info!(
                    "optimized {} factors over {} connected robots",
                    graph.factor_count(),
                    connected.len()
                );
                self.report.optimization_result(&OptimizationReport {
                    success: true,
                    graph,
                    estimates: refined,
                });
            }
            Err(e) => {
                tracing::warn!("optimization failed: {e:?}");
                self.report.optimization_result(&OptimizationReport {
                    success: false,
                    graph,
                    estimates: Values::new(),
                });
            }
        }
    }

    /// Apply a discovery answer. Ignored unless the round is waiting for
    /// one.
    pub(crate) async fn accept_neighbor_set(&self, neighbors: Vec<RobotId>) {
        let mut inner = self.inner.lock().await;
        if inner.state
            != (OptimizerState::Waiting {
                on: WaitingOn::Discovery,
            })
        {
            tracing::debug!(
                "dropping neighbor set outside a discovery wait"
            );
            return;
        }

        let self_id = self.config.self_id();
        let neighbors = self
            .validate_ids(neighbors)
            .into_iter()
            .filter(|id| *id != self_id)
            .collect();
        inner.round.set_neighbors(neighbors);
        inner.state = OptimizerState::Collecting;
        inner.deadline = None;
        tracing::debug!(
            "neighbor set received: {:?}",
            inner.round.neighbors()
        );
    }

    async fn respond_to_subgraph_request(
        &self,
        from: RobotId,
        request: SubgraphRequest,
    ) -> FgResult<()> {
        let participants = self.validate_ids(request.participants);
        let response = {
            let inner = self.inner.lock().await;
            respond::build_subgraph_response(
                self.config.self_id(),
                &inner.local,
                &inner.closures,
                &participants,
            )
        };

        let data =
            encode_message(&ExchangeMessage::SubgraphResponse(response))?;
        self.transport.send(from, data).await
    }

    pub(crate) async fn accept_subgraph_response(
        &self,
        from: RobotId,
        response: SubgraphResponse,
    ) -> FgResult<()> {
        if response.sender != from {
            return Err(FgError::other(format!(
                "subgraph response from {from} claims sender {}",
                response.sender
            )));
        }

        let mut inner = self.inner.lock().await;
        if inner.state
            != (OptimizerState::Waiting {
                on: WaitingOn::Subgraphs,
            })
        {
            tracing::debug!(
                "dropping subgraph response from {from} outside an active collection"
            );
            return Ok(());
        }

        if !inner.round.record_response(response) {
            tracing::debug!(
                "dropping unexpected subgraph response from {from}"
            );
            return Ok(());
        }

        if inner.round.all_received() {
            inner.state = OptimizerState::Optimizing;
            inner.deadline = None;
            tracing::debug!("all subgraphs received, ready to optimize");
        }

        Ok(())
    }

    /// Handle an incoming exchange message.
    ///
    /// The real work happens on a spawned task so the transport's
    /// delivery path is never blocked on the coordinating lock.
    fn handle_exchange_message(&self, from: RobotId, msg: ExchangeMessage) {
        let this = self.clone();
        tokio::task::spawn(async move {
            let res = match msg {
                ExchangeMessage::SubgraphRequest(request) => {
                    this.respond_to_subgraph_request(from, request).await
                }
                ExchangeMessage::SubgraphResponse(response) => {
                    this.accept_subgraph_response(from, response).await
                }
            };

            if let Err(e) = res {
                tracing::error!(
                    "could not handle exchange message from {from}: {e:?}"
                );
            }
        });
    }

    fn validate_ids(&self, ids: Vec<RobotId>) -> Vec<RobotId> {
        let nb_robots = self.config.nb_robots;
        ids.into_iter()
            .filter(|id| {
                if id.0 < nb_robots {
                    true
                } else {
                    tracing::warn!("dropping out-of-range robot id {id}");
                    false
                }
            })
            .collect()
    }
}

fn check_deadline(inner: &mut ExchangeInner, on: WaitingOn) {
    let Some(deadline) = inner.deadline else {
        return;
    };

    if Instant::now() > deadline {
        tracing::warn!("round timed out waiting for {on:?}, abandoning");
        inner.state = OptimizerState::Idle;
        inner.deadline = None;
    }
}

impl MessageHandler for PoseGraphExchange {
    fn recv_message(&self, from: RobotId, data: bytes::Bytes) -> FgResult<()> {
        let msg = decode_message(data)?;
        tracing::trace!("incoming message from {from}: {msg:?}");
        self.handle_exchange_message(from, msg);
        Ok(())
    }
}

impl NeighborHandler for PoseGraphExchange {
    fn handle_neighbors(&self, neighbors: Vec<RobotId>) -> FgResult<()> {
        let this = self.clone();
        tokio::task::spawn(async move {
            this.accept_neighbor_set(neighbors).await;
        });
        Ok(())
    }
}
