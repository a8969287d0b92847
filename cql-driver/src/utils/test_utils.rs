use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::client::execution_profile::ExecutionProfile;
use crate::client::session::{Session, SessionConfig};
use crate::cluster::Node;
use crate::errors::{
    BrokenConnectionError, BrokenConnectionErrorKind, ConnectionPoolError, DbError,
};
use crate::frame::request::{BoundValues, CqlRequestKind, QueryParameters, Request};
use crate::frame::response::result::{self, Prepared, Rows, SetKeyspace};
use crate::frame::response::{self, Response};
use crate::frame::types::{Consistency, PageSize};
use crate::frame::value::CqlValue;
use crate::network::{Connection, ConnectionPool, ResponseHandle, ResponseHandler};
use crate::response::QueryResponse;

pub(crate) fn setup_tracing() {
    let _ = tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(tracing_subscriber::fmt::TestWriter::new())
        .try_init();
}

/// What a [MockConnection] does with the next request written to it.
#[derive(Debug)]
pub(crate) enum MockReply {
    Respond(QueryResponse),
    /// Responds from a background task after the delay, unless the request was abandoned.
    RespondAfter(Duration, QueryResponse),
    /// Fails the write itself.
    WriteFailure,
    /// Accepts the request and never answers.
    Hang,
    /// Accepts the request, then the connection breaks.
    Broken,
}

/// An owned record of a request written to a [MockConnection].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SentRequest {
    pub(crate) kind: CqlRequestKind,
    /// QUERY contents or PREPARE text.
    pub(crate) text: Option<String>,
    pub(crate) id: Option<Bytes>,
    pub(crate) consistency: Option<Consistency>,
    pub(crate) page_size: Option<PageSize>,
    pub(crate) paging_state: Option<Bytes>,
    pub(crate) values: Vec<(Option<String>, CqlValue)>,
}

impl SentRequest {
    fn from_request(request: &Request<'_>) -> Self {
        let mut sent = SentRequest {
            kind: request.kind(),
            text: None,
            id: None,
            consistency: None,
            page_size: None,
            paging_state: None,
            values: Vec::new(),
        };
        let parameters = match request {
            Request::Query(query) => {
                sent.text = Some(query.contents.to_owned());
                Some(&query.parameters)
            }
            Request::Execute(execute) => {
                sent.id = Some(execute.id.clone());
                Some(&execute.parameters)
            }
            Request::Prepare(prepare) => {
                sent.text = Some(prepare.query.to_owned());
                None
            }
        };
        if let Some(QueryParameters {
            consistency,
            values,
            page_size,
            paging_state,
        }) = parameters
        {
            sent.consistency = Some(*consistency);
            sent.page_size = Some(*page_size);
            sent.paging_state = paging_state.clone();
            sent.values = match values {
                BoundValues::Positional(values) => {
                    values.iter().map(|v| (None, v.clone())).collect()
                }
                BoundValues::Named(values) => values
                    .iter()
                    .map(|(name, v)| (Some((*name).to_owned()), v.clone()))
                    .collect(),
            };
        }
        sent
    }
}

/// A connection answering requests from a script, in order.
/// Once the script runs out, every request gets a VOID result.
#[derive(Debug)]
pub(crate) struct MockConnection {
    address: SocketAddr,
    replies: Mutex<VecDeque<MockReply>>,
    sent: Mutex<Vec<SentRequest>>,
    hanging: Mutex<Vec<ResponseHandler>>,
    discarded_responses: Arc<AtomicUsize>,
}

impl MockConnection {
    pub(crate) fn new(address: &str) -> Self {
        Self {
            address: address.parse().unwrap(),
            replies: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            hanging: Mutex::new(Vec::new()),
            discarded_responses: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn push_reply(&self, reply: MockReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub(crate) fn sent_requests(&self) -> Vec<SentRequest> {
        self.sent.lock().unwrap().clone()
    }

    /// Delayed responses that arrived after their request had been abandoned.
    pub(crate) fn discarded_responses(&self) -> usize {
        self.discarded_responses.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn connect_address(&self) -> SocketAddr {
        self.address
    }

    async fn write_request(
        &self,
        request: &Request<'_>,
    ) -> Result<ResponseHandle, BrokenConnectionError> {
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| MockReply::Respond(void_response()));

        if let MockReply::WriteFailure = reply {
            return Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe).into());
        }
        self.sent
            .lock()
            .unwrap()
            .push(SentRequest::from_request(request));

        let (handler, handle) = ResponseHandle::channel();
        match reply {
            MockReply::Respond(response) => handler.send(Ok(response)),
            MockReply::RespondAfter(delay, response) => {
                let discarded = Arc::clone(&self.discarded_responses);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if handler.is_abandoned() {
                        discarded.fetch_add(1, Ordering::Relaxed);
                    }
                    handler.send(Ok(response));
                });
            }
            MockReply::Hang => self.hanging.lock().unwrap().push(handler),
            MockReply::Broken => {
                handler.send(Err(BrokenConnectionErrorKind::ChannelClosed.into()))
            }
            MockReply::WriteFailure => unreachable!(),
        }
        Ok(handle)
    }
}

#[derive(Debug)]
pub(crate) struct MockPool {
    connection: Option<Arc<MockConnection>>,
    keyspaces_used: Mutex<Vec<String>>,
}

impl MockPool {
    pub(crate) fn new(connection: Arc<MockConnection>) -> Self {
        Self {
            connection: Some(connection),
            keyspaces_used: Mutex::new(Vec::new()),
        }
    }

    /// A pool that has no working connection.
    pub(crate) fn broken() -> Self {
        Self {
            connection: None,
            keyspaces_used: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn keyspaces_used(&self) -> Vec<String> {
        self.keyspaces_used.lock().unwrap().clone()
    }
}

impl ConnectionPool for MockPool {
    fn connection(&self) -> Result<Arc<dyn Connection>, ConnectionPoolError> {
        match &self.connection {
            Some(connection) => {
                let connection: Arc<dyn Connection> = connection.clone();
                Ok(connection)
            }
            None => Err(ConnectionPoolError::Broken {
                last_connection_error: BrokenConnectionErrorKind::ChannelClosed.into(),
            }),
        }
    }

    fn use_keyspace(&self, keyspace_name: &str) {
        self.keyspaces_used
            .lock()
            .unwrap()
            .push(keyspace_name.to_owned());
    }
}

/// A node reachable through a single scripted connection.
pub(crate) fn mock_node(address: &str) -> (Arc<Node>, Arc<MockConnection>, Arc<MockPool>) {
    let connection = Arc::new(MockConnection::new(address));
    let pool = Arc::new(MockPool::new(connection.clone()));
    let node = Arc::new(Node::new(connection.connect_address(), pool.clone()));
    (node, connection, pool)
}

/// A node whose pool has no connection to give.
pub(crate) fn broken_node(address: &str) -> Arc<Node> {
    Arc::new(Node::new(
        address.parse().unwrap(),
        Arc::new(MockPool::broken()),
    ))
}

pub(crate) fn mock_session(nodes: Vec<Arc<Node>>, profile: ExecutionProfile) -> Session {
    Session::new(
        SessionConfig {
            default_execution_profile_handle: profile.into_handle(),
            ..Default::default()
        },
        nodes,
    )
}

pub(crate) fn void_response() -> QueryResponse {
    QueryResponse::new(Response::Result(result::Result::Void))
}

pub(crate) fn rows_response(
    column_names: &[&str],
    rows: Vec<Vec<Option<CqlValue>>>,
) -> QueryResponse {
    QueryResponse::new(Response::Result(result::Result::Rows(Rows::new(
        column_names.iter().copied(),
        rows,
    ))))
}

pub(crate) fn set_keyspace_response(keyspace_name: &str) -> QueryResponse {
    QueryResponse::new(Response::Result(result::Result::SetKeyspace(SetKeyspace {
        keyspace_name: keyspace_name.to_owned(),
    })))
}

pub(crate) fn prepared_response(id: Bytes) -> QueryResponse {
    QueryResponse::new(Response::Result(result::Result::Prepared(Prepared { id })))
}

pub(crate) fn db_error_response(error: DbError) -> QueryResponse {
    QueryResponse::new(Response::Error(response::Error {
        error,
        reason: String::from("mock error"),
    }))
}
