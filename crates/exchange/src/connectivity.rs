//! Reachability over reported loop-closure links.

use fleetgraph_api::RobotId;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Which robots are transitively linked to `self_id` through declared
/// loop-closure links, as opposed to merely reachable on the message bus.
///
/// Merging a robot that is not linked would add a disjoint rigid
/// component and make the joint optimization under-determined, so every
/// robot outside the returned set must be excluded from aggregation even
/// when its subgraph was received.
///
/// Declarations are asymmetric on the wire (a reporter declares the
/// higher-indexed ids of its linked pairs); the adjacency is symmetrized
/// here before the traversal so reachability does not depend on which
/// side reported a link. The visited structure is sized by the fleet
/// size, never by the neighbor count: robot id values are not bounded by
/// how many neighbors are currently present.
pub(crate) fn resolve_connected(
    self_id: RobotId,
    nb_robots: u32,
    self_links: &BTreeSet<RobotId>,
    peer_links: &BTreeMap<RobotId, BTreeSet<RobotId>>,
) -> BTreeSet<RobotId> {
    let fleet = nb_robots as usize;
    let mut adjacency: Vec<BTreeSet<RobotId>> = vec![BTreeSet::new(); fleet];

    let mut add_links = |reporter: RobotId, links: &BTreeSet<RobotId>| {
        if reporter.index() >= fleet {
            tracing::warn!("ignoring links reported by out-of-range {reporter}");
            return;
        }
        for &link in links {
            if link.index() >= fleet {
                tracing::warn!("ignoring out-of-range link target {link}");
                continue;
            }
            adjacency[reporter.index()].insert(link);
            adjacency[link.index()].insert(reporter);
        }
    };

    add_links(self_id, self_links);
    for (reporter, links) in peer_links {
        add_links(*reporter, links);
    }

    let mut connected = BTreeSet::new();
    if self_id.index() >= fleet {
        return connected;
    }

    let mut visited = vec![false; fleet];
    let mut queue = VecDeque::new();
    visited[self_id.index()] = true;
    connected.insert(self_id);
    queue.push_back(self_id);

    while let Some(current) = queue.pop_front() {
        for &next in &adjacency[current.index()] {
            if !visited[next.index()] {
                visited[next.index()] = true;
                connected.insert(next);
                queue.push_back(next);
            }
        }
    }

    connected
}
