//! Specially treated single connection used to fetch metadata
//! and receive events from the cluster.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::{BrokenConnectionError, ConnectionPoolError};
use crate::network::Connection;

/// The single connection used for administrative queries.
///
/// Reconnecting it and subscribing to events is done by the implementation;
/// after it reconnects to another node, a full topology refresh is expected.
#[async_trait]
pub trait ControlConnection: Send + Sync {
    /// Opens the control connection if it is not open yet.
    /// Calling it on an open control connection does nothing.
    async fn init(&self) -> Result<(), BrokenConnectionError>;

    /// The currently open connection.
    fn connection(&self) -> Result<Arc<dyn Connection>, ConnectionPoolError>;
}
