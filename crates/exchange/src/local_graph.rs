use crate::{ExchangeError, ExchangeResult};
use fleetgraph_api::{
    BetweenFactor, KeyframeId, NoiseModel, Pose, PoseKey, RobotId, Values,
};

/// This robot's sequential pose graph: one odometry factor per keyframe
/// transition, plus the latest estimate for every local key.
///
/// Never pruned; growth over the process lifetime is unbounded.
#[derive(Debug)]
pub(crate) struct LocalPoseGraph {
    robot_id: RobotId,
    noise: NoiseModel,
    factors: Vec<BetweenFactor>,
    estimates: Values,
    latest: Option<(PoseKey, Pose)>,
}

impl LocalPoseGraph {
    pub(crate) fn new(robot_id: RobotId, noise: NoiseModel) -> Self {
        Self {
            robot_id,
            noise,
            factors: Vec::new(),
            estimates: Values::new(),
            latest: None,
        }
    }

    /// Record the estimate for a new keyframe and chain an odometry
    /// factor from the previous one.
    ///
    /// Keyframe ids must be strictly increasing; anything else is a
    /// front-end contract violation and is rejected without touching the
    /// graph.
    pub(crate) fn ingest(
        &mut self,
        keyframe: KeyframeId,
        pose: Pose,
    ) -> ExchangeResult<()> {
        let key = PoseKey::new(self.robot_id, keyframe);

        if let Some((prev_key, prev_pose)) = self.latest {
            if keyframe <= prev_key.keyframe {
                return Err(ExchangeError::invalid_sequence(format!(
                    "keyframe {keyframe} after {}",
                    prev_key.keyframe
                )));
            }

            let odom_diff = pose.relative_to(&prev_pose);
            self.factors.push(BetweenFactor::new(
                prev_key, key, odom_diff, self.noise,
            ));
        }

        self.estimates.insert(key, pose);
        self.latest = Some((key, pose));
        Ok(())
    }

    pub(crate) fn factors(&self) -> &[BetweenFactor] {
        &self.factors
    }

    pub(crate) fn estimates(&self) -> &Values {
        &self.estimates
    }

    /// Whether any odometry has been ingested yet.
    pub(crate) fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }
}
