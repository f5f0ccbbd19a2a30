//! Assembly of the merged factor graph handed to the solver.

use crate::closures::LoopClosureStore;
use crate::local_graph::LocalPoseGraph;
use crate::state::RoundState;
use fleetgraph_api::{
    FactorGraph, NoiseModel, Pose, PoseKey, PriorFactor, RobotId, Values,
};
use std::collections::BTreeSet;

/// Build the merged factor graph and initial estimates for one round,
/// restricted to the connectivity-resolved participant set.
///
/// The merged graph holds: all local odometry factors; the local store's
/// loop-closure factors for every participant pair whose two sides are
/// both connected; every connected peer's reported factors, keeping only
/// those whose two endpoint robots are both connected. Estimates are the
/// union of the local estimates and the connected peers' reported
/// estimates. One gauge-fixing prior pins this robot's first pose key to
/// the identity; without it the joint graph has an unobservable global
/// rigid-body degree of freedom.
pub(crate) fn aggregate_pose_graphs(
    self_id: RobotId,
    noise: NoiseModel,
    local: &LocalPoseGraph,
    closures: &LoopClosureStore,
    round: &RoundState,
    connected: &BTreeSet<RobotId>,
) -> (FactorGraph, Values) {
    let mut graph = FactorGraph::default();
    graph.extend_between(local.factors().iter().cloned());

    let participants = round.participants(self_id);
    for (i, &a) in participants.iter().enumerate() {
        for &b in &participants[i + 1..] {
            if connected.contains(&a) && connected.contains(&b) {
                graph.extend_between(
                    closures.factors_between(a, b).iter().cloned(),
                );
            }
        }
    }

    let mut estimates = local.estimates().clone();
    for (id, contribution) in round.contributions() {
        if !connected.contains(id) {
            continue;
        }

        estimates.merge(&contribution.estimates);
        graph.extend_between(
            contribution
                .factors
                .iter()
                .filter(|factor| {
                    connected.contains(&factor.from.robot)
                        && connected.contains(&factor.to.robot)
                })
                .cloned(),
        );
    }

    graph.push_prior(PriorFactor {
        key: PoseKey::new(self_id, 0),
        pose: Pose::identity(),
        noise,
    });

    (graph, estimates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetgraph_api::protocol::SubgraphResponse;
    use fleetgraph_api::BetweenFactor;

    fn closure(robot_a: u32, kf_a: u64, robot_b: u32, kf_b: u64) -> BetweenFactor {
        BetweenFactor::new(
            PoseKey::new(RobotId(robot_a), kf_a),
            PoseKey::new(RobotId(robot_b), kf_b),
            Pose::identity(),
            NoiseModel::default(),
        )
    }

    fn local_with(keyframes: u64) -> LocalPoseGraph {
        let mut local =
            LocalPoseGraph::new(RobotId(0), NoiseModel::default());
        for keyframe in 0..keyframes {
            local.ingest(keyframe, Pose::identity()).unwrap();
        }
        local
    }

    fn contribution(
        sender: u32,
        factors: Vec<BetweenFactor>,
        estimate_keys: &[(u32, u64)],
    ) -> SubgraphResponse {
        SubgraphResponse {
            sender: RobotId(sender),
            factors,
            estimates: estimate_keys
                .iter()
                .map(|(robot, keyframe)| {
                    (
                        PoseKey::new(RobotId(*robot), *keyframe),
                        Pose::identity(),
                    )
                })
                .collect(),
            connected: BTreeSet::new(),
        }
    }

    fn connected(raw: &[u32]) -> BTreeSet<RobotId> {
        raw.iter().map(|id| RobotId(*id)).collect()
    }

    #[test]
    fn exactly_one_prior_anchored_at_own_first_key() {
        let (graph, _) = aggregate_pose_graphs(
            RobotId(0),
            NoiseModel::default(),
            &local_with(2),
            &LoopClosureStore::default(),
            &RoundState::default(),
            &connected(&[0]),
        );

        assert_eq!(1, graph.priors.len());
        assert_eq!(PoseKey::new(RobotId(0), 0), graph.priors[0].key);
        assert_eq!(Pose::identity(), graph.priors[0].pose);
    }

    #[test]
    fn peer_factor_touching_unconnected_robot_dropped() {
        let mut round = RoundState::default();
        round.set_neighbors(vec![RobotId(1), RobotId(2)]);
        // Robot 1's payload smuggles a factor touching robot 2, which is
        // not in the connected set.
        assert!(round.record_response(contribution(
            1,
            vec![closure(1, 0, 2, 0), closure(0, 1, 1, 5)],
            &[(1, 5)],
        )));
        assert!(round.record_response(contribution(2, vec![], &[(2, 0)])));

        let (graph, estimates) = aggregate_pose_graphs(
            RobotId(0),
            NoiseModel::default(),
            &local_with(2),
            &LoopClosureStore::default(),
            &round,
            &connected(&[0, 1]),
        );

        assert!(graph
            .between
            .iter()
            .all(|factor| factor.from.robot != RobotId(2)
                && factor.to.robot != RobotId(2)));
        // Unconnected robot 2's estimates are not inserted either.
        assert!(!estimates.contains_key(&PoseKey::new(RobotId(2), 0)));
        assert!(estimates.contains_key(&PoseKey::new(RobotId(1), 5)));
    }

    #[test]
    fn local_store_closures_require_both_sides_connected() {
        let mut closures = LoopClosureStore::default();
        closures.record(closure(0, 1, 1, 5), true);
        closures.record(closure(0, 0, 2, 3), true);

        let mut round = RoundState::default();
        round.set_neighbors(vec![RobotId(1), RobotId(2)]);

        let (graph, _) = aggregate_pose_graphs(
            RobotId(0),
            NoiseModel::default(),
            &local_with(2),
            &closures,
            &round,
            &connected(&[0, 1]),
        );

        // 1 odometry + the (0,1) closure + prior; the (0,2) closure is
        // excluded because robot 2 is not connected.
        assert_eq!(2, graph.between.len());
        assert_eq!(3, graph.factor_count());
    }

    #[test]
    fn merged_estimates_union_self_and_connected_peers() {
        let mut round = RoundState::default();
        round.set_neighbors(vec![RobotId(1)]);
        assert!(round.record_response(contribution(
            1,
            vec![],
            &[(1, 4), (1, 5)],
        )));

        let (_, estimates) = aggregate_pose_graphs(
            RobotId(0),
            NoiseModel::default(),
            &local_with(2),
            &LoopClosureStore::default(),
            &round,
            &connected(&[0, 1]),
        );

        assert_eq!(4, estimates.len());
    }
}
