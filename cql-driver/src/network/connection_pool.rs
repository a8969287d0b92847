use std::fmt::Debug;
use std::sync::Arc;

use super::Connection;
use crate::errors::ConnectionPoolError;

/// The pool of connections kept open to one node.
pub trait ConnectionPool: Send + Sync + Debug {
    /// Picks a connection to send a request on.
    fn connection(&self) -> Result<Arc<dyn Connection>, ConnectionPoolError>;

    /// Called once per successful `USE <keyspace>`, so that the pool can
    /// switch its existing connections and open new ones with that keyspace.
    fn use_keyspace(&self, _keyspace_name: &str) {}
}
