use std::net::SocketAddr;
use std::sync::Arc;

use crate::cluster::{Node, NodeRef};
use crate::network::Connection;

/// The node whose response ended an execution.
#[derive(Debug, Clone)]
pub struct Coordinator {
    node: Arc<Node>,
    connection_address: SocketAddr,
}

impl Coordinator {
    pub(crate) fn new(node: NodeRef, connection: &dyn Connection) -> Self {
        Self {
            node: Arc::clone(node),
            connection_address: connection.connect_address(),
        }
    }

    pub fn node(&self) -> NodeRef<'_> {
        &self.node
    }

    /// Address of the connection the response came over, after translation.
    pub fn connection_address(&self) -> SocketAddr {
        self.connection_address
    }
}
