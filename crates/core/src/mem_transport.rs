//! The core stub transport implementation provided by fleetgraph.

use fleetgraph_api::{
    BoxFut, DynMessageHandler, DynTransport, FgError, FgResult, RobotId,
    Transport,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// The core stub transport implementation provided by fleetgraph.
/// This is NOT a production module. It is for testing only.
/// It will only deliver messages between endpoints of the same hub,
/// within the same process.
#[derive(Debug, Default)]
pub struct MemTransportHub {
    handlers: Mutex<HashMap<RobotId, DynMessageHandler>>,
}

impl MemTransportHub {
    /// Construct a new in-memory hub.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Get this robot's endpoint on the hub.
    pub fn endpoint(self: &Arc<Self>, robot: RobotId) -> DynTransport {
        Arc::new(MemEndpoint {
            robot,
            hub: self.clone(),
        })
    }

    fn register(&self, robot: RobotId, handler: DynMessageHandler) {
        self.handlers.lock().unwrap().insert(robot, handler);
    }

    fn handler(&self, robot: RobotId) -> Option<DynMessageHandler> {
        self.handlers.lock().unwrap().get(&robot).cloned()
    }
}

#[derive(Debug)]
struct MemEndpoint {
    robot: RobotId,
    hub: Arc<MemTransportHub>,
}

impl Transport for MemEndpoint {
    fn send(
        &self,
        to: RobotId,
        data: bytes::Bytes,
    ) -> BoxFut<'_, FgResult<()>> {
        Box::pin(async move {
            let handler = self.hub.handler(to).ok_or_else(|| {
                FgError::other(format!("no endpoint registered for {to}"))
            })?;

            // Deliver on a separate task so a send never re-enters the
            // caller's handler stack.
            let from = self.robot;
            tokio::task::spawn(async move {
                if let Err(e) = handler.recv_message(from, data) {
                    tracing::warn!(
                        "could not deliver message from {from}: {e:?}"
                    );
                }
            });

            Ok(())
        })
    }

    fn register_handler(&self, handler: DynMessageHandler) {
        self.hub.register(self.robot, handler);
    }
}
