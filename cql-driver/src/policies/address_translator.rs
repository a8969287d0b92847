use std::collections::HashMap;
use std::net::SocketAddr;

/// Translates addresses received from cluster nodes into locally reachable addresses.
///
/// For each node, the address the driver reads from the system tables corresponds
/// to the `rpc_address` set in the node's configuration. In most cases, this is the
/// correct address to connect to, and that is what [IdentityTranslator] does.
/// However, sometimes those addresses are not reachable directly by the driver
/// (e.g. the nodes sit behind NAT), and a translator maps them to public ones.
///
/// Please note that the contact points provided while creating
/// the [`Session`](crate::client::session::Session) are not translated,
/// only addresses retrieved from the cluster are.
pub trait AddressTranslator: Send + Sync {
    fn translate_address(&self, untranslated_address: SocketAddr) -> SocketAddr;
}

/// Returns every address unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

impl AddressTranslator for IdentityTranslator {
    fn translate_address(&self, untranslated_address: SocketAddr) -> SocketAddr {
        untranslated_address
    }
}

// Addresses without a rule are passed through.
impl AddressTranslator for HashMap<SocketAddr, SocketAddr> {
    fn translate_address(&self, untranslated_address: SocketAddr) -> SocketAddr {
        self.get(&untranslated_address)
            .copied()
            .unwrap_or(untranslated_address)
    }
}
