//! Wire protocol for the subgraph exchange.
//!
//! Messages are serde types encoded as json at the transport boundary. The
//! transport itself only moves opaque [bytes::Bytes] between robots.

use crate::{BetweenFactor, FgError, FgResult, RobotId, Values};
use std::collections::BTreeSet;

/// A request for a peer's contribution to the current round.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubgraphRequest {
    /// The full participant set of the round, requester included.
    pub participants: Vec<RobotId>,
}

/// A peer's contribution to a round.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubgraphResponse {
    /// The robot this contribution came from.
    pub sender: RobotId,

    /// The sender's local odometry factors, plus the loop-closure factors
    /// of every connected participant pair the sender owns (the sender is
    /// the lower-indexed id of the pair). Each inter-robot factor is
    /// transmitted by exactly one side.
    pub factors: Vec<BetweenFactor>,

    /// The sender's current pose estimates for its own keys.
    pub estimates: Values,

    /// The distinct higher-indexed ids of every participant pair the
    /// sender has stored loop closures for.
    pub connected: BTreeSet<RobotId>,
}

/// All messages exchanged between robots during a round.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "payload")]
pub enum ExchangeMessage {
    /// Ask a peer for its contribution to the current round.
    SubgraphRequest(SubgraphRequest),

    /// Answer a [ExchangeMessage::SubgraphRequest].
    SubgraphResponse(SubgraphResponse),
}

/// Encode an exchange message for the transport.
pub fn encode_message(msg: &ExchangeMessage) -> FgResult<bytes::Bytes> {
    let data = serde_json::to_vec(msg)
        .map_err(|e| FgError::other_src("could not encode message", e))?;
    Ok(bytes::Bytes::from(data))
}

/// Decode an exchange message received from the transport.
pub fn decode_message(data: bytes::Bytes) -> FgResult<ExchangeMessage> {
    serde_json::from_slice(&data)
        .map_err(|e| FgError::other_src("could not decode message", e))
}
