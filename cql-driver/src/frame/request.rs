//! Requests the driver core sends to a node.

use std::fmt;

use bytes::Bytes;

use super::types::{Consistency, PageSize};
use super::value::CqlValue;

/// Opcode of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CqlRequestKind {
    Query,
    Prepare,
    Execute,
}

impl fmt::Display for CqlRequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CqlRequestKind::Query => "QUERY",
            CqlRequestKind::Prepare => "PREPARE",
            CqlRequestKind::Execute => "EXECUTE",
        })
    }
}

/// Values bound to a statement's markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundValues<'a> {
    /// Values for `?` markers, in order.
    Positional(&'a [CqlValue]),
    /// Values for `:name` markers.
    Named(&'a [(&'a str, CqlValue)]),
}

impl BoundValues<'_> {
    pub const EMPTY: BoundValues<'static> = BoundValues::Positional(&[]);

    pub fn is_empty(&self) -> bool {
        match self {
            BoundValues::Positional(values) => values.is_empty(),
            BoundValues::Named(values) => values.is_empty(),
        }
    }
}

/// Parameters shared by QUERY and EXECUTE requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParameters<'a> {
    pub consistency: Consistency,
    pub values: BoundValues<'a>,
    pub page_size: PageSize,
    pub paging_state: Option<Bytes>,
}

impl Default for QueryParameters<'_> {
    fn default() -> Self {
        Self {
            consistency: Consistency::default(),
            values: BoundValues::EMPTY,
            page_size: PageSize::UNPAGED,
            paging_state: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query<'a> {
    pub contents: &'a str,
    pub parameters: QueryParameters<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepare<'a> {
    pub query: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execute<'a> {
    pub id: Bytes,
    pub parameters: QueryParameters<'a>,
}

/// A request written to a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request<'a> {
    Query(Query<'a>),
    Prepare(Prepare<'a>),
    Execute(Execute<'a>),
}

impl Request<'_> {
    pub fn kind(&self) -> CqlRequestKind {
        match self {
            Request::Query(_) => CqlRequestKind::Query,
            Request::Prepare(_) => CqlRequestKind::Prepare,
            Request::Execute(_) => CqlRequestKind::Execute,
        }
    }
}
