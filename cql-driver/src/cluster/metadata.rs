//! Node data as read from the `system.local` and `system.peers` tables.

use std::collections::BTreeSet;
use std::net::{IpAddr, SocketAddr};

use tracing::warn;

use crate::frame::response::result::Row;
use crate::policies::address_translator::AddressTranslator;

/// Describes a node as seen in the system tables at the time of the query.
///
/// A fresh `NodeInfo` is built for every refresh; merging it into the
/// long-lived [`Node`](super::Node) is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct NodeInfo {
    /// Translated `rpc_address` plus the cluster's native port.
    /// `None` if the node did not report an rpc address.
    pub connect_address: Option<SocketAddr>,
    /// `broadcast_address` for the local node, `peer` for the others.
    pub broadcast_address: Option<IpAddr>,
    pub listen_address: Option<IpAddr>,
    pub datacenter: Option<String>,
    pub rack: Option<String>,
    pub release_version: Option<String>,
    /// Tokens owned by the node, in the partitioner's string form.
    pub tokens: BTreeSet<String>,
}

/// A row of one of the two node tables.
///
/// The tables mostly share columns, but name the node's own address differently.
#[derive(Debug, Clone, Copy)]
pub(crate) enum SystemRow<'a> {
    Local(&'a Row),
    Peer(&'a Row),
}

impl<'a> SystemRow<'a> {
    fn row(&self) -> &'a Row {
        match self {
            SystemRow::Local(row) | SystemRow::Peer(row) => row,
        }
    }

    pub(crate) fn describe(&self) -> &'static str {
        match self {
            SystemRow::Local(_) => "local node",
            SystemRow::Peer(_) => "peer",
        }
    }

    pub(crate) fn rpc_address(&self) -> Option<IpAddr> {
        self.row().get_inet("rpc_address")
    }

    pub(crate) fn broadcast_address(&self) -> Option<IpAddr> {
        match self {
            SystemRow::Local(row) => row.get_inet("broadcast_address"),
            SystemRow::Peer(row) => row.get_inet("peer"),
        }
    }

    pub(crate) fn listen_address(&self) -> Option<IpAddr> {
        self.row().get_inet("listen_address")
    }

    pub(crate) fn datacenter(&self) -> Option<String> {
        self.row().get_text("data_center").map(str::to_owned)
    }

    pub(crate) fn rack(&self) -> Option<String> {
        self.row().get_text("rack").map(str::to_owned)
    }

    pub(crate) fn release_version(&self) -> Option<String> {
        self.row().get_text("release_version").map(str::to_owned)
    }

    pub(crate) fn tokens(&self) -> BTreeSet<String> {
        self.row().get_text_set("tokens").unwrap_or_default()
    }

    /// The address the driver should connect to, if the node reported an rpc address.
    pub(crate) fn connect_address(
        &self,
        port: u16,
        translator: &dyn AddressTranslator,
    ) -> Option<SocketAddr> {
        self.rpc_address()
            .map(|ip| translator.translate_address(SocketAddr::new(ip, port)))
    }

    pub(crate) fn to_node_info(&self, port: u16, translator: &dyn AddressTranslator) -> NodeInfo {
        let connect_address = self.connect_address(port, translator);
        let broadcast_address = self.broadcast_address();
        if connect_address.is_none() {
            warn!(
                "{} (broadcast address: {:?}) has no rpc_address; it will not be reachable",
                self.describe(),
                broadcast_address
            );
        }

        NodeInfo {
            connect_address,
            broadcast_address,
            listen_address: self.listen_address(),
            datacenter: self.datacenter(),
            rack: self.rack(),
            release_version: self.release_version(),
            tokens: self.tokens(),
        }
    }
}
