//! Transport related types.

use crate::{BoxFut, FgResult, RobotId};
use std::sync::Arc;

/// Handler for messages arriving from peer robots.
///
/// Implementations must not block: do any real work on a spawned task and
/// return promptly.
pub trait MessageHandler: 'static + Send + Sync + std::fmt::Debug {
    /// Handle an opaque payload received from `from`.
    fn recv_message(&self, from: RobotId, data: bytes::Bytes) -> FgResult<()>;
}

/// Trait-object [MessageHandler].
pub type DynMessageHandler = Arc<dyn MessageHandler>;

/// This robot's endpoint on the fleet message bus.
///
/// An endpoint knows which robot it belongs to; the sender id is attached
/// to every delivery. Delivery guarantees are the transport's business,
/// not specified here: the exchange protocol is safe to re-run and treats
/// missing messages as round timeouts.
pub trait Transport: 'static + Send + Sync + std::fmt::Debug {
    /// Send an opaque payload to a peer robot.
    fn send(&self, to: RobotId, data: bytes::Bytes)
        -> BoxFut<'_, FgResult<()>>;

    /// Register the handler that receives inbound payloads for this robot.
    ///
    /// Only one handler is registered per endpoint; a second registration
    /// replaces the first.
    fn register_handler(&self, handler: DynMessageHandler);
}

/// Trait-object [Transport].
pub type DynTransport = Arc<dyn Transport>;
