use fleetgraph_api::{BetweenFactor, RobotId};
use std::collections::BTreeMap;

/// Accepted inter-robot loop-closure factors, keyed by unordered robot
/// pair.
///
/// The pair key is canonicalized to `(min, max)` on every access, so
/// lookups are invariant under argument order. Entries are append-only:
/// factors are never removed or deduplicated, so storage grows without
/// bound over the robot's lifetime.
#[derive(Debug, Default)]
pub(crate) struct LoopClosureStore {
    pairs: BTreeMap<(RobotId, RobotId), Vec<BetweenFactor>>,
}

fn canonical(a: RobotId, b: RobotId) -> (RobotId, RobotId) {
    (a.min(b), a.max(b))
}

impl LoopClosureStore {
    /// Store an accepted loop-closure factor. Rejected detections are
    /// dropped.
    pub(crate) fn record(&mut self, factor: BetweenFactor, accepted: bool) {
        if !accepted {
            tracing::trace!(
                "dropping rejected loop-closure candidate {} -> {}",
                factor.from,
                factor.to
            );
            return;
        }

        let pair = canonical(factor.from.robot, factor.to.robot);
        self.pairs.entry(pair).or_default().push(factor);
    }

    /// The factors stored for the unordered pair `{a, b}`.
    pub(crate) fn factors_between(
        &self,
        a: RobotId,
        b: RobotId,
    ) -> &[BetweenFactor] {
        self.pairs
            .get(&canonical(a, b))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether at least one factor is stored for the unordered pair
    /// `{a, b}`.
    pub(crate) fn has_link(&self, a: RobotId, b: RobotId) -> bool {
        !self.factors_between(a, b).is_empty()
    }
}
