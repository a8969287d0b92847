use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cql_driver::cluster::ControlConnection;
use cql_driver::errors::{BrokenConnectionError, ConnectionPoolError, DbError};
use cql_driver::frame::request::{BoundValues, Request};
use cql_driver::frame::response::result::{self, Rows, SetKeyspace};
use cql_driver::frame::response::{self as frame_response, Response};
use cql_driver::frame::value::CqlValue;
use cql_driver::network::{Connection, ConnectionPool, ResponseHandle, ResponseHandler};
pub(crate) use cql_driver::response::QueryResponse;

pub(crate) fn setup_tracing() {
    let _ = tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(tracing_subscriber::fmt::TestWriter::new())
        .try_init();
}

/// Decides the response to a request from its owned description.
/// Returning `None` leaves the request unanswered.
type Responder = dyn Fn(&RecordedRequest) -> Option<QueryResponse> + Send + Sync;

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    /// QUERY contents or PREPARE text; empty for EXECUTE.
    pub(crate) text: String,
    pub(crate) named_values: Vec<(String, CqlValue)>,
}

impl RecordedRequest {
    fn from_request(request: &Request<'_>) -> Self {
        match request {
            Request::Query(query) => RecordedRequest {
                text: query.contents.to_owned(),
                named_values: match query.parameters.values {
                    BoundValues::Named(values) => values
                        .iter()
                        .map(|(name, value)| ((*name).to_owned(), value.clone()))
                        .collect(),
                    _ => Vec::new(),
                },
            },
            Request::Prepare(prepare) => RecordedRequest {
                text: prepare.query.to_owned(),
                named_values: Vec::new(),
            },
            Request::Execute(_) => RecordedRequest {
                text: String::new(),
                named_values: Vec::new(),
            },
        }
    }
}

/// A connection answering every request through a responder function.
pub(crate) struct ScriptedConnection {
    address: SocketAddr,
    responder: Box<Responder>,
    requests: Mutex<Vec<RecordedRequest>>,
    // Unanswered requests stay pending until the connection is dropped.
    pending: Mutex<Vec<ResponseHandler>>,
}

impl std::fmt::Debug for ScriptedConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedConnection")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl ScriptedConnection {
    pub(crate) fn new(
        address: SocketAddr,
        responder: impl Fn(&RecordedRequest) -> Option<QueryResponse> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            address,
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    fn connect_address(&self) -> SocketAddr {
        self.address
    }

    async fn write_request(
        &self,
        request: &Request<'_>,
    ) -> Result<ResponseHandle, BrokenConnectionError> {
        let recorded = RecordedRequest::from_request(request);
        let response = (self.responder)(&recorded);
        self.requests.lock().unwrap().push(recorded);

        let (handler, handle) = ResponseHandle::channel();
        match response {
            Some(response) => handler.send(Ok(response)),
            None => self.pending.lock().unwrap().push(handler),
        }
        Ok(handle)
    }
}

#[derive(Debug)]
pub(crate) struct SingleConnectionPool {
    connection: Arc<ScriptedConnection>,
    pub(crate) keyspaces: Mutex<Vec<String>>,
}

impl SingleConnectionPool {
    pub(crate) fn new(connection: Arc<ScriptedConnection>) -> Arc<Self> {
        Arc::new(Self {
            connection,
            keyspaces: Mutex::new(Vec::new()),
        })
    }
}

impl ConnectionPool for SingleConnectionPool {
    fn connection(&self) -> Result<Arc<dyn Connection>, ConnectionPoolError> {
        let connection: Arc<dyn Connection> = self.connection.clone();
        Ok(connection)
    }

    fn use_keyspace(&self, keyspace_name: &str) {
        self.keyspaces.lock().unwrap().push(keyspace_name.to_owned());
    }
}

/// A control connection that is always open on one scripted connection.
pub(crate) struct FixedControlConnection {
    connection: Arc<ScriptedConnection>,
    pub(crate) init_calls: AtomicUsize,
}

impl FixedControlConnection {
    pub(crate) fn new(connection: Arc<ScriptedConnection>) -> Arc<Self> {
        Arc::new(Self {
            connection,
            init_calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ControlConnection for FixedControlConnection {
    async fn init(&self) -> Result<(), BrokenConnectionError> {
        self.init_calls.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn connection(&self) -> Result<Arc<dyn Connection>, ConnectionPoolError> {
        let connection: Arc<dyn Connection> = self.connection.clone();
        Ok(connection)
    }
}

pub(crate) fn void() -> QueryResponse {
    QueryResponse::new(Response::Result(result::Result::Void))
}

pub(crate) fn rows(column_names: &[&str], rows: Vec<Vec<Option<CqlValue>>>) -> QueryResponse {
    QueryResponse::new(Response::Result(result::Result::Rows(Rows::new(
        column_names.iter().copied(),
        rows,
    ))))
}

pub(crate) fn set_keyspace(keyspace_name: &str) -> QueryResponse {
    QueryResponse::new(Response::Result(result::Result::SetKeyspace(SetKeyspace {
        keyspace_name: keyspace_name.to_owned(),
    })))
}

pub(crate) fn db_error(error: DbError) -> QueryResponse {
    QueryResponse::new(Response::Error(frame_response::Error {
        error,
        reason: "scripted".to_owned(),
    }))
}
