//! Responder side of the subgraph exchange.

use crate::closures::LoopClosureStore;
use crate::local_graph::LocalPoseGraph;
use fleetgraph_api::protocol::SubgraphResponse;
use fleetgraph_api::RobotId;
use std::collections::BTreeSet;

/// The connectivity a robot declares over a participant set: the distinct
/// higher-indexed ids of every unordered participant pair it has stored
/// loop closures for.
///
/// Every robot hears every loop-closure detection, so the declared set
/// may name pairs the declaring robot is not itself part of.
pub(crate) fn declared_connectivity(
    closures: &LoopClosureStore,
    participants: &[RobotId],
) -> BTreeSet<RobotId> {
    let mut connected = BTreeSet::new();
    for (i, &a) in participants.iter().enumerate() {
        for &b in &participants[i + 1..] {
            let (min_id, max_id) = (a.min(b), a.max(b));
            if closures.has_link(min_id, max_id) {
                connected.insert(max_id);
            }
        }
    }
    connected
}

/// Build this robot's contribution to a round with participant set
/// `participants`.
///
/// The payload carries the full local pose graph, and additionally the
/// loop-closure factors of every connected pair this robot owns: a pair's
/// factors are transmitted by its lower-indexed side only, so each
/// inter-robot factor crosses the bus exactly once.
pub(crate) fn build_subgraph_response(
    self_id: RobotId,
    local: &LocalPoseGraph,
    closures: &LoopClosureStore,
    participants: &[RobotId],
) -> SubgraphResponse {
    let mut factors = local.factors().to_vec();
    let mut connected = BTreeSet::new();

    for (i, &a) in participants.iter().enumerate() {
        for &b in &participants[i + 1..] {
            let (min_id, max_id) = (a.min(b), a.max(b));
            if closures.has_link(min_id, max_id) {
                connected.insert(max_id);
                if min_id == self_id {
                    factors.extend(
                        closures
                            .factors_between(min_id, max_id)
                            .iter()
                            .cloned(),
                    );
                }
            }
        }
    }

    SubgraphResponse {
        sender: self_id,
        factors,
        estimates: local.estimates().clone(),
        connected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetgraph_api::{BetweenFactor, NoiseModel, Pose, PoseKey};

    fn ids(raw: &[u32]) -> Vec<RobotId> {
        raw.iter().map(|id| RobotId(*id)).collect()
    }

    fn closure(robot_a: u32, kf_a: u64, robot_b: u32, kf_b: u64) -> BetweenFactor {
        BetweenFactor::new(
            PoseKey::new(RobotId(robot_a), kf_a),
            PoseKey::new(RobotId(robot_b), kf_b),
            Pose::identity(),
            NoiseModel::default(),
        )
    }

    fn local(robot: u32, keyframes: u64) -> LocalPoseGraph {
        let mut out =
            LocalPoseGraph::new(RobotId(robot), NoiseModel::default());
        for keyframe in 0..keyframes {
            out.ingest(keyframe, Pose::identity()).unwrap();
        }
        out
    }

    #[test]
    fn declares_higher_ids_of_linked_pairs() {
        let mut closures = LoopClosureStore::default();
        closures.record(closure(0, 1, 1, 5), true);
        closures.record(closure(1, 2, 2, 9), true);

        let connected =
            declared_connectivity(&closures, &ids(&[0, 1, 2]));
        assert_eq!(
            [RobotId(1), RobotId(2)].into_iter().collect::<BTreeSet<_>>(),
            connected
        );
    }

    #[test]
    fn pairs_outside_participants_not_declared() {
        let mut closures = LoopClosureStore::default();
        closures.record(closure(0, 1, 3, 5), true);

        let connected = declared_connectivity(&closures, &ids(&[0, 1]));
        assert!(connected.is_empty());
    }

    #[test]
    fn lower_id_side_owns_the_pair_factors() {
        let mut closures = LoopClosureStore::default();
        closures.record(closure(0, 1, 1, 5), true);

        // Robot 0 is the pair's lower id and transmits the factor.
        let response = build_subgraph_response(
            RobotId(0),
            &local(0, 2),
            &closures,
            &ids(&[0, 1]),
        );
        assert_eq!(2, response.factors.len()); // 1 odometry + 1 closure

        // Robot 1 declares the link but does not retransmit the factor.
        let response = build_subgraph_response(
            RobotId(1),
            &local(1, 2),
            &closures,
            &ids(&[0, 1]),
        );
        assert_eq!(1, response.factors.len()); // odometry only
        assert!(response.connected.contains(&RobotId(1)));
    }

    #[test]
    fn response_carries_full_local_graph_and_estimates() {
        let response = build_subgraph_response(
            RobotId(2),
            &local(2, 4),
            &LoopClosureStore::default(),
            &ids(&[1, 2]),
        );
        assert_eq!(RobotId(2), response.sender);
        assert_eq!(3, response.factors.len());
        assert_eq!(4, response.estimates.len());
        assert!(response.connected.is_empty());
    }
}
