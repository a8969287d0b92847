//! Errors returned by the driver core.

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use itertools::Itertools;
use thiserror::Error;

pub use crate::frame::response::error::{DbError, WriteType};
use crate::frame::response::CqlResponseKind;
use crate::response::ExecutionInfo;

/// Errors collected during one execution, in the order they happened,
/// keyed by the connect address of the node that failed.
pub type NodeErrors = Vec<(SocketAddr, RequestAttemptError)>;

/// An error returned by [`Session`](crate::client::session::Session) when
/// executing a statement fails as a whole.
///
/// Apart from [`ExecutionError::EmptyPlan`] and [`ExecutionError::UnexpectedResponse`],
/// all variants carry the [`ExecutionInfo`] of the failed execution, which holds
/// every per-node error that was collected.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum ExecutionError {
    /// The load balancing policy gave no node to try, so nothing was sent.
    #[error("Load balancing policy returned an empty plan")]
    EmptyPlan,

    /// No node responded within the per-request timeout, and no further attempt was possible.
    #[error("Request timed out after {timeout:?}; {}", describe_errors(.info))]
    RequestTimeout {
        timeout: Duration,
        info: Box<ExecutionInfo>,
    },

    /// Every node in the query plan was tried and failed.
    #[error("All nodes in the query plan failed; {}", describe_errors(.info))]
    AllNodesFailed { info: Box<ExecutionInfo> },

    /// The retry policy decided not to retry after this error.
    #[error("{error}; {}", describe_errors(.info))]
    LastAttemptError {
        error: RequestAttemptError,
        info: Box<ExecutionInfo>,
    },

    /// A response of a kind the operation cannot use.
    #[error("Received unexpected response from the server: {0}")]
    UnexpectedResponse(CqlResponseKind),
}

impl ExecutionError {
    /// All per-node errors collected before the execution gave up.
    pub fn errors(&self) -> &[(SocketAddr, RequestAttemptError)] {
        match self {
            ExecutionError::RequestTimeout { info, .. }
            | ExecutionError::AllNodesFailed { info }
            | ExecutionError::LastAttemptError { info, .. } => info.errors(),
            ExecutionError::EmptyPlan | ExecutionError::UnexpectedResponse(_) => &[],
        }
    }

    pub fn execution_info(&self) -> Option<&ExecutionInfo> {
        match self {
            ExecutionError::RequestTimeout { info, .. }
            | ExecutionError::AllNodesFailed { info }
            | ExecutionError::LastAttemptError { info, .. } => Some(info.as_ref()),
            ExecutionError::EmptyPlan | ExecutionError::UnexpectedResponse(_) => None,
        }
    }
}

fn describe_errors(info: &ExecutionInfo) -> String {
    let errors = info.errors();
    if errors.is_empty() {
        return "no node errors recorded".to_owned();
    }
    format!(
        "errors per node: [{}]",
        errors
            .iter()
            .format_with(", ", |(node, error), f| f(&format_args!("{node}: {error}")))
    )
}

/// An error that occurred during a single attempt of executing a request
/// on one node.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum RequestAttemptError {
    /// No connection to the node could be obtained from its pool.
    #[error(transparent)]
    ConnectionPoolError(#[from] ConnectionPoolError),

    /// The request could not be written to the connection, so it never reached the node.
    #[error("Failed to write the request: {0}")]
    WriteError(BrokenConnectionError),

    /// The connection broke after the request was written.
    #[error(transparent)]
    BrokenConnectionError(#[from] BrokenConnectionError),

    /// An ERROR response: the error and the server's message.
    #[error("Server error: {0} ({1})")]
    DbError(DbError, String),

    /// No response arrived before the per-request timeout.
    #[error("No response within {0:?}")]
    AttemptTimeout(Duration),

    /// Preparing the statement again, after an `Unprepared` error, gave it a new id.
    /// The statement most likely changed meaning, e.g. because its table was altered.
    #[error(
        "Statement {statement} got id {reprepared_id:?} when prepared again, \
        instead of {expected_id:?}"
    )]
    RepreparedIdChanged {
        statement: String,
        expected_id: Vec<u8>,
        reprepared_id: Vec<u8>,
    },

    #[error("Expected a RESULT or ERROR response, got {0}")]
    UnexpectedResponse(CqlResponseKind),
}

impl RequestAttemptError {
    /// Whether the error is one that a different node may well not return.
    /// Used to decide whether a failed speculative fiber should end the whole execution.
    pub(crate) fn can_speculative_retry(&self) -> bool {
        // New variants must be classified here explicitly.
        #[deny(clippy::wildcard_enum_match_arm)]
        match self {
            RequestAttemptError::RepreparedIdChanged { .. }
            | RequestAttemptError::UnexpectedResponse(_) => false,

            RequestAttemptError::ConnectionPoolError(_)
            | RequestAttemptError::WriteError(_)
            | RequestAttemptError::BrokenConnectionError(_)
            | RequestAttemptError::AttemptTimeout(_) => true,

            RequestAttemptError::DbError(db_error, _) => db_error.can_speculative_retry(),
        }
    }
}

/// The connection a request was sent over broke.
#[derive(Error, Debug, Clone)]
#[error("Connection broken: {0}")]
pub struct BrokenConnectionError(Arc<dyn Error + Sync + Send>);

impl BrokenConnectionError {
    /// The reason, if it is of type `T`.
    pub fn downcast_ref<T: Error + 'static>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum BrokenConnectionErrorKind {
    #[error("Connection closed before a response arrived")]
    ChannelClosed,

    #[error("Write failed: {0}")]
    WriteError(Arc<std::io::Error>),
}

impl From<BrokenConnectionErrorKind> for BrokenConnectionError {
    fn from(value: BrokenConnectionErrorKind) -> Self {
        BrokenConnectionError(Arc::new(value))
    }
}

impl From<std::io::Error> for BrokenConnectionError {
    fn from(value: std::io::Error) -> Self {
        BrokenConnectionErrorKind::WriteError(Arc::new(value)).into()
    }
}

/// A node's pool had no connection to hand out.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum ConnectionPoolError {
    #[error("Connection pool is broken, last connection error: {last_connection_error}")]
    Broken {
        last_connection_error: BrokenConnectionError,
    },
}

/// An error that occurred when refreshing topology through the control connection.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum MetadataError {
    /// None of the known nodes accepted a control connection.
    #[error("Could not initialize the control connection: {0}")]
    ControlConnectionInit(BrokenConnectionError),

    /// The control connection is not usable at the moment.
    #[error("Control connection is unavailable: {0}")]
    ControlConnectionUnavailable(ConnectionPoolError),

    /// A system table query failed or timed out.
    #[error("Querying {table} failed: {error}")]
    Query {
        table: &'static str,
        error: RequestAttemptError,
    },

    /// The control node returned no row for itself.
    #[error("system.local returned no rows")]
    EmptyLocalResult,
}

/// The outcome of one execution fiber that did not succeed.
#[derive(Debug, Clone)]
pub(crate) enum FiberError {
    /// The retry policy decided to stop after this error.
    GaveUp(RequestAttemptError),
    /// The query plan ran out of nodes; this was the last error seen.
    PlanExhausted(RequestAttemptError),
}

impl FiberError {
    /// Checks if a failure of a speculative execution branch can be ignored,
    /// i.e. whether other branches might still succeed.
    pub(crate) fn can_be_ignored(&self) -> bool {
        match self {
            FiberError::GaveUp(error) => error.can_speculative_retry(),
            FiberError::PlanExhausted(_) => true,
        }
    }
}

/// A keyspace name [`Session::use_keyspace`](crate::client::session::Session::use_keyspace)
/// refused to put into a `USE` statement.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum BadKeyspaceName {
    #[error("Empty keyspace name")]
    Empty,

    #[error("Keyspace name '{0}' has {1} characters, at most 48 are allowed")]
    TooLong(String, usize),

    #[error("Keyspace name '{0}' contains '{1}'; only ASCII letters, digits and '_' are allowed")]
    IllegalCharacter(String, char),
}

#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum UseKeyspaceError {
    #[error(transparent)]
    BadKeyspaceName(#[from] BadKeyspaceName),

    /// The `USE` statement failed.
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// The node answered the `USE` statement with something other than a keyspace switch.
    #[error("USE statement did not switch the keyspace")]
    KeyspaceNotSet,
}
