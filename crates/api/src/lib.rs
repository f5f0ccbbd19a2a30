#![deny(missing_docs)]
//! Fleetgraph API contains the module traits and the basic types required
//! to define the api of those traits.
//!
//! A fleetgraph deployment is a set of robot processes that each build a
//! local pose graph from odometry, accumulate inter-robot loop closures,
//! and periodically merge their graphs with reachable peers into one
//! globally-consistent estimate. This crate defines the value types for
//! poses and factors, the wire protocol for the subgraph exchange, and the
//! trait-object seams for the external collaborators: transport, neighbor
//! discovery, the nonlinear solver, and result reporting.
//!
//! If you want the coordinator itself, see the fleetgraph_exchange crate.

/// Boxed future type.
pub type BoxFut<'a, T> =
    std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

mod error;
pub use error::*;

mod id;
pub use id::*;

mod pose;
pub use pose::*;

mod graph;
pub use graph::*;

pub mod protocol;

mod transport;
pub use transport::*;

mod discovery;
pub use discovery::*;

mod solver;
pub use solver::*;

mod report;
pub use report::*;
