#![deny(missing_docs)]
//! Fleetgraph core contains in-process implementations of the
//! fleetgraph_api module seams, for wiring multi-robot setups inside a
//! single process and for testing the exchange protocol.
//!
//! None of these modules talk to a real network, a real discovery service
//! or a real solver; production deployments provide their own seam
//! implementations.

mod mem_transport;
pub use mem_transport::*;

mod static_discovery;
pub use static_discovery::*;

mod solvers;
pub use solvers::*;

mod testing;
pub use testing::*;
