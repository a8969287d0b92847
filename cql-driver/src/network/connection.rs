use std::fmt::Debug;
use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::errors::{BrokenConnectionError, BrokenConnectionErrorKind, RequestAttemptError};
use crate::frame::request::Request;
use crate::response::QueryResponse;

/// A single connection (channel) to a node.
///
/// Responses are matched to requests by stream id inside the implementation,
/// so any number of requests may be in flight at once and their responses may
/// arrive in any order.
#[async_trait]
pub trait Connection: Send + Sync + Debug {
    /// The (translated) address this connection is opened against.
    fn connect_address(&self) -> SocketAddr;

    /// Writes the request to the connection.
    ///
    /// Resolves once the write is acknowledged. An `Err` means the request
    /// never left the driver, so it cannot have been applied by the node.
    /// The returned handle resolves to the response.
    async fn write_request(
        &self,
        request: &Request<'_>,
    ) -> Result<ResponseHandle, BrokenConnectionError>;
}

/// The sending half of a [`ResponseHandle`], kept by the connection's reader
/// until the response with the matching stream id arrives.
#[derive(Debug)]
pub struct ResponseHandler {
    response_sender: oneshot::Sender<Result<QueryResponse, BrokenConnectionError>>,
}

impl ResponseHandler {
    /// Delivers the response. If the request was abandoned in the meantime
    /// (timed out, or lost a speculative race) the response is dropped.
    pub fn send(self, response: Result<QueryResponse, BrokenConnectionError>) {
        let _ = self.response_sender.send(response);
    }

    pub fn is_abandoned(&self) -> bool {
        self.response_sender.is_closed()
    }
}

/// Awaits the response to a written request.
#[derive(Debug)]
pub struct ResponseHandle {
    response_receiver: oneshot::Receiver<Result<QueryResponse, BrokenConnectionError>>,
}

impl ResponseHandle {
    /// Creates a connected handler/handle pair for one request.
    pub fn channel() -> (ResponseHandler, ResponseHandle) {
        let (response_sender, response_receiver) = oneshot::channel();
        (
            ResponseHandler { response_sender },
            ResponseHandle { response_receiver },
        )
    }

    pub async fn response(self) -> Result<QueryResponse, RequestAttemptError> {
        match self.response_receiver.await {
            Ok(response) => response.map_err(RequestAttemptError::from),
            // The connection dropped the handler without answering.
            Err(_) => Err(RequestAttemptError::BrokenConnectionError(
                BrokenConnectionErrorKind::ChannelClosed.into(),
            )),
        }
    }
}
