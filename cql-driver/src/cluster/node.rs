use std::hash::{Hash, Hasher};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::cluster::metadata::NodeInfo;
use crate::errors::ConnectionPoolError;
use crate::network::{Connection, ConnectionPool};

/// Node represents a cluster node along with its data and connections.
///
/// Note: if a Node changes its broadcast address, then it is no longer
/// represented by the same instance of Node struct, but instead
/// a new instance is created.
#[derive(Debug)]
pub struct Node {
    /// Address used to connect to the node, after translation.
    pub connect_address: SocketAddr,
    /// The node's identity inside the cluster, if known. Contact points
    /// start without one until the first topology refresh.
    pub broadcast_address: Option<IpAddr>,
    /// Datacenter of the node, if known.
    pub datacenter: Option<String>,
    /// Rack of the node, if known.
    pub rack: Option<String>,

    pool: Arc<dyn ConnectionPool>,
}

/// A way that Nodes are often passed and accessed in the driver's code.
pub type NodeRef<'a> = &'a Arc<Node>;

impl Node {
    /// Creates a node known only by its connect address, e.g. a contact point.
    pub fn new(connect_address: SocketAddr, pool: Arc<dyn ConnectionPool>) -> Self {
        Self {
            connect_address,
            broadcast_address: None,
            datacenter: None,
            rack: None,
            pool,
        }
    }

    /// Creates a node from a topology refresh. Returns `None` if the node
    /// did not report an rpc address, since it cannot be connected to then.
    pub fn from_node_info(info: &NodeInfo, pool: Arc<dyn ConnectionPool>) -> Option<Self> {
        Some(Self {
            connect_address: info.connect_address?,
            broadcast_address: info.broadcast_address,
            datacenter: info.datacenter.clone(),
            rack: info.rack.clone(),
            pool,
        })
    }

    pub fn with_broadcast_address(mut self, broadcast_address: IpAddr) -> Self {
        self.broadcast_address = Some(broadcast_address);
        self
    }

    pub(crate) fn connection(&self) -> Result<Arc<dyn Connection>, ConnectionPoolError> {
        self.pool.connection()
    }

    pub(crate) fn pool(&self) -> &Arc<dyn ConnectionPool> {
        &self.pool
    }

    pub(crate) fn use_keyspace(&self, keyspace_name: &str) {
        self.pool.use_keyspace(keyspace_name)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.connect_address == other.connect_address
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.connect_address.hash(state);
    }
}
