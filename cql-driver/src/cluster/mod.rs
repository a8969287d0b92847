//! This module holds entities that represent the cluster as a whole:
//!  - [Node], a single node with its connection pool,
//!  - [ClusterState], the set of nodes query plans are computed from,
//!  - [NodeInfo](metadata::NodeInfo), the per-node data read from system tables,
//!  - [TopologyMonitor], which reads that data through the
//!    [ControlConnection], the single connection used for administrative queries.

pub mod admin;
pub mod control_connection;
pub mod metadata;
mod node;
mod state;
mod topology;

pub use admin::{AdminQuery, AdminResult, ConnectionAdminQuery};
pub use control_connection::ControlConnection;
pub use metadata::NodeInfo;
pub use node::{Node, NodeRef};
pub use state::ClusterState;
pub use topology::TopologyMonitor;
