//! Neighbor discovery related types.

use crate::{BoxFut, FgResult, RobotId};
use std::sync::Arc;

/// Handler for neighbor sets produced by the discovery service.
pub trait NeighborHandler: 'static + Send + Sync + std::fmt::Debug {
    /// Handle the current neighbor set.
    ///
    /// The set is a snapshot: it is only meaningful for the round that
    /// requested it and goes stale when that round ends.
    fn handle_neighbors(&self, neighbors: Vec<RobotId>) -> FgResult<()>;
}

/// Trait-object [NeighborHandler].
pub type DynNeighborHandler = Arc<dyn NeighborHandler>;

/// Access to the peer-discovery service.
///
/// Discovery is request/response over the message bus, not a blocking
/// query: [Discovery::request_neighbors] returns once the request is on
/// its way, and the answer (if any) is delivered to the registered
/// [NeighborHandler] later. A coordinator waiting for the answer stays
/// fully responsive in the meantime and applies its own deadline.
pub trait Discovery: 'static + Send + Sync + std::fmt::Debug {
    /// Ask for the current set of reachable peer robots.
    fn request_neighbors(&self) -> BoxFut<'_, FgResult<()>>;

    /// Register the handler that receives discovery answers.
    fn register_handler(&self, handler: DynNeighborHandler);
}

/// Trait-object [Discovery].
pub type DynDiscovery = Arc<dyn Discovery>;
