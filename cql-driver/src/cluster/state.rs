use std::sync::Arc;

use super::Node;

/// The nodes of the cluster as currently known to the session.
///
/// Merging fresh [`NodeInfo`](super::NodeInfo)s into a new state is the
/// job of the metadata manager; the session just swaps whole states.
#[derive(Debug, Default)]
pub struct ClusterState {
    known_nodes: Vec<Arc<Node>>,
}

impl ClusterState {
    pub fn new(known_nodes: Vec<Arc<Node>>) -> Self {
        Self { known_nodes }
    }

    /// Access details about nodes known to the driver
    pub fn get_nodes_info(&self) -> &[Arc<Node>] {
        &self.known_nodes
    }
}
