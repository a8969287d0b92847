//! Errors reported by the server in ERROR responses.

use std::fmt;

use bytes::Bytes;
use thiserror::Error;

use crate::frame::types::Consistency;

/// ERROR response body.
#[derive(Debug, Clone)]
pub struct Error {
    pub error: DbError,
    pub reason: String,
}

/// An error the server answered a request with.
///
/// Variants carry the details the protocol sends along with the error code;
/// the free-form message is kept separately, in [`Error::reason`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DbError {
    #[error("Syntax error in the statement")]
    SyntaxError,

    #[error("Statement is invalid")]
    Invalid,

    #[error("{keyspace}.{table} already exists")]
    AlreadyExists { keyspace: String, table: String },

    #[error("Bad credentials")]
    AuthenticationError,

    #[error("Not authorized to run the statement")]
    Unauthorized,

    #[error("Statement conflicts with the server configuration")]
    ConfigError,

    #[error("Only {alive} replicas alive, {required} required for {consistency}")]
    Unavailable {
        consistency: Consistency,
        required: i32,
        alive: i32,
    },

    #[error("Coordinator is overloaded")]
    Overloaded,

    #[error("Coordinator is bootstrapping")]
    IsBootstrapping,

    #[error("Truncate failed")]
    TruncateError,

    #[error(
        "Read timed out at {consistency}: {received}/{required} replies, data present: {data_present}"
    )]
    ReadTimeout {
        consistency: Consistency,
        received: i32,
        required: i32,
        data_present: bool,
    },

    #[error("{write_type} write timed out at {consistency}: {received}/{required} acks")]
    WriteTimeout {
        consistency: Consistency,
        received: i32,
        required: i32,
        write_type: WriteType,
    },

    #[error(
        "Read failed at {consistency}: {received}/{required} replies, \
        {numfailures} failures, data present: {data_present}"
    )]
    ReadFailure {
        consistency: Consistency,
        received: i32,
        required: i32,
        numfailures: i32,
        data_present: bool,
    },

    #[error(
        "{write_type} write failed at {consistency}: {received}/{required} acks, \
        {numfailures} failures"
    )]
    WriteFailure {
        consistency: Consistency,
        received: i32,
        required: i32,
        numfailures: i32,
        write_type: WriteType,
    },

    /// The coordinator does not know the prepared statement with this id,
    /// usually because it restarted or evicted it from its cache.
    #[error("Statement {statement_id:?} is not prepared on the coordinator")]
    Unprepared { statement_id: Bytes },

    #[error("Internal server error")]
    ServerError,

    #[error("Server rejected the message as a protocol violation")]
    ProtocolError,

    #[error("Server error with unknown code {0:#06x}")]
    Other(i32),
}

impl DbError {
    /// The error code of the native protocol.
    pub fn code(&self) -> i32 {
        match self {
            DbError::ServerError => 0x0000,
            DbError::ProtocolError => 0x000A,
            DbError::AuthenticationError => 0x0100,
            DbError::Unavailable { .. } => 0x1000,
            DbError::Overloaded => 0x1001,
            DbError::IsBootstrapping => 0x1002,
            DbError::TruncateError => 0x1003,
            DbError::WriteTimeout { .. } => 0x1100,
            DbError::ReadTimeout { .. } => 0x1200,
            DbError::ReadFailure { .. } => 0x1300,
            DbError::WriteFailure { .. } => 0x1500,
            DbError::SyntaxError => 0x2000,
            DbError::Unauthorized => 0x2100,
            DbError::Invalid => 0x2200,
            DbError::ConfigError => 0x2300,
            DbError::AlreadyExists { .. } => 0x2400,
            DbError::Unprepared { .. } => 0x2500,
            DbError::Other(code) => *code,
        }
    }

    /// Whether another node may well answer the same request without this error.
    /// A speculative fiber failing with an error for which this is `false`
    /// ends the whole execution.
    pub fn can_speculative_retry(&self) -> bool {
        #[deny(clippy::wildcard_enum_match_arm)]
        match self {
            // The statement itself or the user is at fault.
            DbError::SyntaxError
            | DbError::Invalid
            | DbError::AlreadyExists { .. }
            | DbError::Unauthorized
            | DbError::ProtocolError
            | DbError::AuthenticationError
            | DbError::ConfigError => false,

            DbError::Unavailable { .. }
            | DbError::Overloaded
            | DbError::IsBootstrapping
            | DbError::TruncateError
            | DbError::ReadTimeout { .. }
            | DbError::WriteTimeout { .. }
            | DbError::ReadFailure { .. }
            | DbError::WriteFailure { .. }
            | DbError::Unprepared { .. }
            | DbError::ServerError
            | DbError::Other(_) => true,
        }
    }
}

/// Kind of the write that timed out or failed, as named by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteType {
    Simple,
    /// A logged batch, past the batch log write.
    Batch,
    UnloggedBatch,
    Counter,
    /// The batch log write of a logged batch.
    BatchLog,
    /// The Paxos phase of a lightweight transaction.
    Cas,
    View,
    Cdc,
    Other(String),
}

impl WriteType {
    pub fn as_str(&self) -> &str {
        match self {
            WriteType::Simple => "SIMPLE",
            WriteType::Batch => "BATCH",
            WriteType::UnloggedBatch => "UNLOGGED_BATCH",
            WriteType::Counter => "COUNTER",
            WriteType::BatchLog => "BATCH_LOG",
            WriteType::Cas => "CAS",
            WriteType::View => "VIEW",
            WriteType::Cdc => "CDC",
            WriteType::Other(name) => name,
        }
    }
}

impl From<&str> for WriteType {
    fn from(name: &str) -> Self {
        match name {
            "SIMPLE" => WriteType::Simple,
            "BATCH" => WriteType::Batch,
            "UNLOGGED_BATCH" => WriteType::UnloggedBatch,
            "COUNTER" => WriteType::Counter,
            "BATCH_LOG" => WriteType::BatchLog,
            "CAS" => WriteType::Cas,
            "VIEW" => WriteType::View,
            "CDC" => WriteType::Cdc,
            other => WriteType::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for WriteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
