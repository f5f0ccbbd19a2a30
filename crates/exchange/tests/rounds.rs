//! Full-round integration tests over the in-memory fleet.

use fleetgraph_api::{OptimizerState, Pose, PoseKey, RobotId, WaitingOn};
use fleetgraph_core::{enable_tracing, DivergentSolver, IdentitySolver};
use fleetgraph_exchange::harness::{
    ExchangeTestFactory, ExchangeTestHarness,
};
use nalgebra::Vector3;
use std::time::Duration;

/// Ingest `keyframes` consecutive unit translations starting at
/// `first_keyframe`.
async fn drive_odometry(
    harness: &ExchangeTestHarness,
    first_keyframe: u64,
    keyframes: u64,
) {
    for i in 0..keyframes {
        harness
            .exchange
            .ingest_odometry(
                first_keyframe + i,
                Pose::from_translation(Vector3::new(i as f64, 0.0, 0.0)),
            )
            .await
            .unwrap();
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn discovery_timeout_returns_to_idle_without_optimizing() {
    enable_tracing();

    let factory = ExchangeTestFactory::new(2);
    let harness = factory
        .new_instance(factory.fast_config(0), None, IdentitySolver::create())
        .await;
    drive_odometry(&harness, 0, 1).await;

    harness
        .wait_for_state(
            |state| {
                state
                    == OptimizerState::Waiting {
                        on: WaitingOn::Discovery,
                    }
            },
            Duration::from_secs(2),
        )
        .await;

    // Let the waiting budget (1s in the fast config) expire.
    tokio::time::sleep(Duration::from_millis(1300)).await;

    let states = harness.report.states();
    let first_wait = states
        .iter()
        .position(|state| {
            *state
                == OptimizerState::Waiting {
                    on: WaitingOn::Discovery,
                }
        })
        .unwrap();
    assert!(
        states[first_wait..].contains(&OptimizerState::Idle),
        "round was not abandoned"
    );
    assert!(harness.report.results().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn round_with_two_connected_neighbors_merges_everything() {
    enable_tracing();

    let factory = ExchangeTestFactory::new(3);

    // Robots 1 and 2 only respond; unresponsive discovery keeps their
    // own rounds from completing.
    let responder_1 = factory
        .new_instance(factory.fast_config(1), None, IdentitySolver::create())
        .await;
    drive_odometry(&responder_1, 4, 2).await;
    let responder_2 = factory
        .new_instance(factory.fast_config(2), None, IdentitySolver::create())
        .await;
    drive_odometry(&responder_2, 2, 2).await;

    // Robot 0 initiates. Leave room to stage odometry and loop closures
    // before its first round fires.
    let mut config = factory.fast_config(0);
    config.round_interval_ms = 300;
    let harness = factory
        .new_instance(
            config,
            Some(vec![RobotId(1), RobotId(2)]),
            IdentitySolver::create(),
        )
        .await;
    drive_odometry(&harness, 0, 2).await;
    harness
        .exchange
        .record_loop_closure(
            PoseKey::new(RobotId(0), 1),
            PoseKey::new(RobotId(1), 5),
            Pose::identity(),
            true,
        )
        .await;
    harness
        .exchange
        .record_loop_closure(
            PoseKey::new(RobotId(0), 0),
            PoseKey::new(RobotId(2), 3),
            Pose::identity(),
            true,
        )
        .await;

    let results = harness
        .wait_for_results(1, Duration::from_secs(5))
        .await;
    let report = &results[0];
    assert!(report.success);

    // 1 local odometry factor, 2 loop closures from the local store,
    // 1 odometry factor from each of the two peers, 1 gauge prior.
    assert_eq!(5, report.graph.between.len());
    assert_eq!(1, report.graph.priors.len());
    assert_eq!(PoseKey::new(RobotId(0), 0), report.graph.priors[0].key);

    // Estimates cover all three robots.
    assert_eq!(6, report.estimates.len());
    assert!(report
        .estimates
        .contains_key(&PoseKey::new(RobotId(1), 5)));
    assert!(report
        .estimates
        .contains_key(&PoseKey::new(RobotId(2), 3)));

    // Rounds keep cycling: the next round merges the same graph again.
    let results = harness
        .wait_for_results(2, Duration::from_secs(5))
        .await;
    assert_eq!(results[0].graph, results[1].graph);
}

#[tokio::test(flavor = "multi_thread")]
async fn unlinked_neighbor_excluded_from_merge() {
    enable_tracing();

    let factory = ExchangeTestFactory::new(3);

    let responder_1 = factory
        .new_instance(factory.fast_config(1), None, IdentitySolver::create())
        .await;
    drive_odometry(&responder_1, 4, 2).await;
    let responder_2 = factory
        .new_instance(factory.fast_config(2), None, IdentitySolver::create())
        .await;
    drive_odometry(&responder_2, 2, 2).await;

    let mut config = factory.fast_config(0);
    config.round_interval_ms = 300;
    let harness = factory
        .new_instance(
            config,
            Some(vec![RobotId(1), RobotId(2)]),
            IdentitySolver::create(),
        )
        .await;
    drive_odometry(&harness, 0, 2).await;
    // A loop closure with robot 1 only: robot 2 stays unlinked even
    // though its subgraph is received.
    harness
        .exchange
        .record_loop_closure(
            PoseKey::new(RobotId(0), 1),
            PoseKey::new(RobotId(1), 5),
            Pose::identity(),
            true,
        )
        .await;

    let results = harness
        .wait_for_results(1, Duration::from_secs(5))
        .await;
    let report = &results[0];
    assert!(report.success);

    assert!(report.graph.between.iter().all(|factor| {
        factor.from.robot != RobotId(2) && factor.to.robot != RobotId(2)
    }));
    assert!(report
        .estimates
        .keys()
        .all(|key| key.robot != RobotId(2)));
    assert_eq!(4, report.estimates.len());
}

#[tokio::test(flavor = "multi_thread")]
async fn solver_divergence_publishes_unsuccessful_result() {
    enable_tracing();

    let factory = ExchangeTestFactory::new(2);

    let responder = factory
        .new_instance(factory.fast_config(1), None, IdentitySolver::create())
        .await;
    drive_odometry(&responder, 4, 2).await;

    let mut config = factory.fast_config(0);
    config.round_interval_ms = 300;
    let harness = factory
        .new_instance(
            config,
            Some(vec![RobotId(1)]),
            DivergentSolver::create(),
        )
        .await;
    drive_odometry(&harness, 0, 2).await;
    harness
        .exchange
        .record_loop_closure(
            PoseKey::new(RobotId(0), 1),
            PoseKey::new(RobotId(1), 5),
            Pose::identity(),
            true,
        )
        .await;

    let results = harness
        .wait_for_results(1, Duration::from_secs(5))
        .await;
    assert!(!results[0].success);
    assert!(results[0].estimates.is_empty());

    // The failure is not fatal: the coordinator is idle again and the
    // next scheduled round retries from scratch.
    let results = harness
        .wait_for_results(2, Duration::from_secs(5))
        .await;
    assert!(!results[1].success);
}

/// The concrete two-robot scenario: two odometry factors across the
/// fleet, one loop closure, one gauge prior.
#[tokio::test(flavor = "multi_thread")]
async fn two_robot_round_aggregates_four_factors() {
    enable_tracing();

    let factory = ExchangeTestFactory::new(2);

    let responder = factory
        .new_instance(factory.fast_config(1), None, IdentitySolver::create())
        .await;
    drive_odometry(&responder, 4, 2).await;

    let mut config = factory.fast_config(0);
    config.round_interval_ms = 300;
    let harness = factory
        .new_instance(
            config,
            Some(vec![RobotId(1)]),
            IdentitySolver::create(),
        )
        .await;
    drive_odometry(&harness, 0, 2).await;
    harness
        .exchange
        .record_loop_closure(
            PoseKey::new(RobotId(0), 1),
            PoseKey::new(RobotId(1), 5),
            Pose::identity(),
            true,
        )
        .await;

    let results = harness
        .wait_for_results(1, Duration::from_secs(5))
        .await;
    let report = &results[0];
    assert!(report.success);
    assert_eq!(4, report.graph.factor_count());
    assert_eq!(3, report.graph.between.len());
    assert_eq!(1, report.graph.priors.len());
    assert_eq!(PoseKey::new(RobotId(0), 0), report.graph.priors[0].key);
    assert_eq!(4, report.estimates.len());
}
