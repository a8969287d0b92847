use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tracing::debug;

use crate::cluster::admin::{AdminQuery, AdminResult, ConnectionAdminQuery};
use crate::cluster::control_connection::ControlConnection;
use crate::cluster::metadata::{NodeInfo, SystemRow};
use crate::cluster::Node;
use crate::errors::MetadataError;
use crate::frame::request::BoundValues;
use crate::frame::types::PageSize;
use crate::frame::value::CqlValue;
use crate::network::Connection;
use crate::policies::address_translator::AddressTranslator;

const SELECT_LOCAL: &str = "SELECT * FROM system.local";
const SELECT_PEERS: &str = "SELECT * FROM system.peers";
const SELECT_PEER_BY_ADDRESS: &str = "SELECT * FROM system.peers WHERE peer = :address";

const LOCAL_TABLE: &str = "system.local";
const PEERS_TABLE: &str = "system.peers";

const DEFAULT_METADATA_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// The native transport port shared by all nodes of the cluster.
///
/// System tables report only IPs, so the port is taken from the control
/// connection the first time it is needed and never changes afterwards.
#[derive(Debug, Default)]
struct PortCache(OnceLock<u16>);

impl PortCache {
    fn get_or_capture(&self, control_address: SocketAddr) -> u16 {
        *self.0.get_or_init(|| control_address.port())
    }

    fn get(&self) -> Option<u16> {
        self.0.get().copied()
    }
}

/// Reads the cluster's nodes from the system tables, through the control connection.
///
/// The monitor never retries: timeouts and connection errors are reported
/// to the caller, which decides whether to reconnect the control connection.
pub struct TopologyMonitor {
    control_connection: Arc<dyn ControlConnection>,
    admin: Arc<dyn AdminQuery>,
    address_translator: Arc<dyn AddressTranslator>,
    request_timeout: Duration,
    port: PortCache,
}

impl TopologyMonitor {
    pub fn new(
        control_connection: Arc<dyn ControlConnection>,
        address_translator: Arc<dyn AddressTranslator>,
    ) -> Self {
        Self {
            control_connection,
            admin: Arc::new(ConnectionAdminQuery),
            address_translator,
            request_timeout: DEFAULT_METADATA_REQUEST_TIMEOUT,
            port: PortCache::default(),
        }
    }

    /// Sets the timeout of each system table query.
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Replaces the way system table queries are sent.
    pub fn with_admin_query(mut self, admin: Arc<dyn AdminQuery>) -> Self {
        self.admin = admin;
        self
    }

    /// The native port captured from the control connection, if any operation captured it yet.
    pub fn cached_port(&self) -> Option<u16> {
        self.port.get()
    }

    /// Opens the control connection. Calling it again once it is open is a no-op.
    pub async fn init(&self) -> Result<(), MetadataError> {
        self.control_connection
            .init()
            .await
            .map_err(MetadataError::ControlConnectionInit)
    }

    /// Reads all nodes of the cluster.
    ///
    /// The control node comes first, followed by the peers in the order
    /// `system.peers` returned them.
    pub async fn refresh_node_list(&self) -> Result<Vec<NodeInfo>, MetadataError> {
        let connection = self.control_connection()?;
        let port = self.port.get_or_capture(connection.connect_address());
        debug!(
            control_connection = %connection.connect_address(),
            "Refreshing node list"
        );

        let local_query = self.query(&*connection, LOCAL_TABLE, SELECT_LOCAL, BoundValues::EMPTY);
        let peers_query = self.query(&*connection, PEERS_TABLE, SELECT_PEERS, BoundValues::EMPTY);
        let (local, peers) = tokio::try_join!(local_query, peers_query)?;

        let local_row = local.first_row().ok_or(MetadataError::EmptyLocalResult)?;

        let translator = &*self.address_translator;
        let nodes: Vec<NodeInfo> = std::iter::once(SystemRow::Local(local_row))
            .chain(peers.rows.iter().map(SystemRow::Peer))
            .map(|row| row.to_node_info(port, translator))
            .collect();

        debug!("Node list refreshed, {} nodes found", nodes.len());
        Ok(nodes)
    }

    /// Reads the current data of a known node.
    ///
    /// Returns `Ok(None)` if the node is the control node itself, without querying
    /// anything: the control node's data is refreshed with the full node list.
    /// Also returns `Ok(None)` if the node is no longer among the peers.
    pub async fn refresh_node(&self, node: &Node) -> Result<Option<NodeInfo>, MetadataError> {
        let connection = self.control_connection()?;
        let port = self.port.get_or_capture(connection.connect_address());

        if node.connect_address == connection.connect_address() {
            debug!(
                node = %node.connect_address,
                "Not refreshing the control node separately"
            );
            return Ok(None);
        }

        match node.broadcast_address {
            Some(broadcast_address) => {
                debug!(
                    node = %node.connect_address,
                    "Refreshing node by its broadcast address {}",
                    broadcast_address
                );
                let values = [("address", CqlValue::Inet(broadcast_address))];
                let peers = self
                    .query(
                        &*connection,
                        PEERS_TABLE,
                        SELECT_PEER_BY_ADDRESS,
                        BoundValues::Named(&values),
                    )
                    .await?;
                Ok(peers
                    .first_row()
                    .map(|row| SystemRow::Peer(row).to_node_info(port, &*self.address_translator)))
            }
            None => {
                debug!(
                    node = %node.connect_address,
                    "Node has no known broadcast address, scanning all peers"
                );
                self.find_in_peers(&*connection, port, node.connect_address)
                    .await
            }
        }
    }

    /// Reads the data of a node the driver does not know yet, e.g. one
    /// announced by a topology change event.
    pub async fn get_new_node_info(
        &self,
        connect_address: SocketAddr,
    ) -> Result<Option<NodeInfo>, MetadataError> {
        let connection = self.control_connection()?;
        let port = self.port.get_or_capture(connection.connect_address());
        debug!(node = %connect_address, "Fetching info of a new node");
        self.find_in_peers(&*connection, port, connect_address).await
    }

    fn control_connection(&self) -> Result<Arc<dyn Connection>, MetadataError> {
        self.control_connection
            .connection()
            .map_err(MetadataError::ControlConnectionUnavailable)
    }

    async fn find_in_peers(
        &self,
        connection: &dyn Connection,
        port: u16,
        connect_address: SocketAddr,
    ) -> Result<Option<NodeInfo>, MetadataError> {
        let peers = self
            .query(connection, PEERS_TABLE, SELECT_PEERS, BoundValues::EMPTY)
            .await?;

        let translator = &*self.address_translator;
        Ok(peers
            .rows
            .iter()
            .map(SystemRow::Peer)
            .find(|row| row.connect_address(port, translator) == Some(connect_address))
            .map(|row| row.to_node_info(port, translator)))
    }

    async fn query(
        &self,
        connection: &dyn Connection,
        table: &'static str,
        cql: &str,
        values: BoundValues<'_>,
    ) -> Result<AdminResult, MetadataError> {
        self.admin
            .query(
                connection,
                cql,
                values,
                self.request_timeout,
                PageSize::UNPAGED,
            )
            .await
            .map_err(|error| MetadataError::Query { table, error })
    }
}
