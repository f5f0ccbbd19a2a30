//! A discovery stub answering from a fixed neighbor set.

use fleetgraph_api::{
    BoxFut, Discovery, DynNeighborHandler, FgError, FgResult, RobotId,
};
use std::sync::{Arc, Mutex};

/// A discovery implementation answering every request with a fixed
/// neighbor set, or never answering at all.
///
/// This is useful for testing, and for the never-answering flavor in
/// particular for exercising the discovery-timeout path of the exchange
/// protocol.
#[derive(Debug)]
pub struct StaticDiscovery {
    neighbors: Option<Vec<RobotId>>,
    handler: Mutex<Option<DynNeighborHandler>>,
}

impl StaticDiscovery {
    /// Construct a discovery stub that always answers with `neighbors`.
    pub fn new(neighbors: Vec<RobotId>) -> Arc<Self> {
        Arc::new(Self {
            neighbors: Some(neighbors),
            handler: Mutex::new(None),
        })
    }

    /// Construct a discovery stub that never answers.
    pub fn unresponsive() -> Arc<Self> {
        Arc::new(Self {
            neighbors: None,
            handler: Mutex::new(None),
        })
    }
}

impl Discovery for StaticDiscovery {
    fn request_neighbors(&self) -> BoxFut<'_, FgResult<()>> {
        Box::pin(async move {
            let Some(neighbors) = self.neighbors.clone() else {
                tracing::debug!("discovery stub is unresponsive, dropping request");
                return Ok(());
            };

            let handler = self
                .handler
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| {
                    FgError::other("no neighbor handler registered")
                })?;

            // Answer asynchronously, the way a real discovery service
            // would: the requester must keep serving other messages in
            // the meantime.
            tokio::task::spawn(async move {
                if let Err(e) = handler.handle_neighbors(neighbors) {
                    tracing::warn!("could not deliver neighbor set: {e:?}");
                }
            });

            Ok(())
        })
    }

    fn register_handler(&self, handler: DynNeighborHandler) {
        *self.handler.lock().unwrap() = Some(handler);
    }
}
