use fleetgraph_api::protocol::SubgraphResponse;
use fleetgraph_api::{BetweenFactor, RobotId, Values};
use std::collections::{BTreeMap, BTreeSet};

/// One peer's contribution to the current round.
#[derive(Debug)]
pub(crate) struct PeerContribution {
    pub(crate) factors: Vec<BetweenFactor>,
    pub(crate) estimates: Values,
}

/// The transient bookkeeping of one round.
///
/// Reset at the start of every round; data from an abandoned round is
/// discarded, never merged into the next one.
#[derive(Debug, Default)]
pub(crate) struct RoundState {
    neighbors: Vec<RobotId>,
    received: BTreeMap<RobotId, bool>,
    contributions: BTreeMap<RobotId, PeerContribution>,
    connectivity: BTreeMap<RobotId, BTreeSet<RobotId>>,
}

impl RoundState {
    /// Discard everything and return to the clean slate.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Snapshot this round's neighbor set.
    pub(crate) fn set_neighbors(&mut self, mut neighbors: Vec<RobotId>) {
        neighbors.sort_unstable();
        neighbors.dedup();
        self.received =
            neighbors.iter().map(|id| (*id, false)).collect();
        self.neighbors = neighbors;
    }

    pub(crate) fn neighbors(&self) -> &[RobotId] {
        &self.neighbors
    }

    /// The full participant set of the round: neighbors plus self,
    /// sorted.
    pub(crate) fn participants(&self, self_id: RobotId) -> Vec<RobotId> {
        let mut out = self.neighbors.clone();
        out.push(self_id);
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Store a peer's contribution. Returns false when the sender is not
    /// an expected neighbor of this round, or already contributed.
    pub(crate) fn record_response(
        &mut self,
        response: SubgraphResponse,
    ) -> bool {
        match self.received.get_mut(&response.sender) {
            Some(received) if !*received => *received = true,
            _ => return false,
        }

        self.connectivity
            .insert(response.sender, response.connected);
        self.contributions.insert(
            response.sender,
            PeerContribution {
                factors: response.factors,
                estimates: response.estimates,
            },
        );
        true
    }

    /// Whether every neighbor of this round has contributed.
    pub(crate) fn all_received(&self) -> bool {
        self.received.values().all(|received| *received)
    }

    pub(crate) fn contributions(
        &self,
    ) -> &BTreeMap<RobotId, PeerContribution> {
        &self.contributions
    }

    pub(crate) fn connectivity(
        &self,
    ) -> &BTreeMap<RobotId, BTreeSet<RobotId>> {
        &self.connectivity
    }
}
