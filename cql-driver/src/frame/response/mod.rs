//! Responses a node sends back.

pub mod error;
pub mod result;

use std::collections::HashMap;
use std::fmt;

pub use error::Error;

/// Opcode of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CqlResponseKind {
    Error,
    Ready,
    Result,
    Supported,
}

impl fmt::Display for CqlResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CqlResponseKind::Error => "ERROR",
            CqlResponseKind::Ready => "READY",
            CqlResponseKind::Result => "RESULT",
            CqlResponseKind::Supported => "SUPPORTED",
        })
    }
}

/// A response body, decoded by the connection.
#[derive(Debug, Clone)]
pub enum Response {
    Error(Error),
    Ready,
    Result(result::Result),
    Supported(HashMap<String, Vec<String>>),
}

impl Response {
    pub fn to_response_kind(&self) -> CqlResponseKind {
        match self {
            Response::Error(_) => CqlResponseKind::Error,
            Response::Ready => CqlResponseKind::Ready,
            Response::Result(_) => CqlResponseKind::Result,
            Response::Supported(_) => CqlResponseKind::Supported,
        }
    }
}
