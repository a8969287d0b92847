use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::errors::{DbError, RequestAttemptError};
use crate::frame::request::{BoundValues, Execute, Prepare, Query, QueryParameters, Request};
use crate::frame::response::{result, CqlResponseKind};
use crate::frame::types::{Consistency, PageSize};
use crate::network::Connection;
use crate::response::{NonErrorQueryResponse, QueryResponse};

/// What a request execution sends to each node it tries.
#[derive(Debug, Clone, Copy)]
pub(crate) enum RequestKind<'a> {
    Query {
        contents: &'a str,
        values: BoundValues<'a>,
        page_size: PageSize,
        paging_state: Option<&'a Bytes>,
    },
    Execute {
        id: &'a Bytes,
        /// Text to reprepare the statement from, should a node not know the id.
        statement: &'a str,
        values: BoundValues<'a>,
        page_size: PageSize,
        paging_state: Option<&'a Bytes>,
    },
    Prepare {
        statement: &'a str,
    },
}

impl<'a> RequestKind<'a> {
    fn to_request(self, consistency: Consistency) -> Request<'a> {
        match self {
            RequestKind::Query {
                contents,
                values,
                page_size,
                paging_state,
            } => Request::Query(Query {
                contents,
                parameters: QueryParameters {
                    consistency,
                    values,
                    page_size,
                    paging_state: paging_state.cloned(),
                },
            }),
            RequestKind::Execute {
                id,
                values,
                page_size,
                paging_state,
                ..
            } => Request::Execute(Execute {
                id: id.clone(),
                parameters: QueryParameters {
                    consistency,
                    values,
                    page_size,
                    paging_state: paging_state.cloned(),
                },
            }),
            RequestKind::Prepare { statement } => Request::Prepare(Prepare { query: statement }),
        }
    }
}

/// One try of a request on one connection.
///
/// Repreparing a statement the node does not know is part of the same attempt:
/// the `PREPARE` and the repeated request go through the same connection.
#[derive(Debug)]
pub(crate) struct ExecutionAttempt {
    connection: Arc<dyn Connection>,
    written: bool,
    reprepare_pending: bool,
}

impl ExecutionAttempt {
    pub(crate) fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            connection,
            written: false,
            reprepare_pending: false,
        }
    }

    /// Whether a request that may have applied the statement made it onto the connection.
    /// A `PREPARE` never counts, and neither does a request the node refused as unprepared.
    pub(crate) fn written(&self) -> bool {
        self.written
    }

    /// Whether the attempt stopped in the middle of repreparing.
    pub(crate) fn reprepare_pending(&self) -> bool {
        self.reprepare_pending
    }

    pub(crate) async fn run(
        &mut self,
        kind: RequestKind<'_>,
        consistency: Consistency,
    ) -> Result<NonErrorQueryResponse, RequestAttemptError> {
        let response = self.send(&kind.to_request(consistency), true).await?;

        match (kind, response.into_non_error_query_response()) {
            (
                RequestKind::Execute { id, statement, .. },
                Err(RequestAttemptError::DbError(DbError::Unprepared { statement_id }, _)),
            ) => {
                debug!(
                    "Connection {}: statement {:?} is unprepared (id {:?}), repreparing",
                    self.connection.connect_address(),
                    statement,
                    statement_id
                );
                // The node refused to run the statement, so nothing was applied.
                self.written = false;
                self.reprepare_pending = true;
                self.reprepare(statement, id).await?;
                self.reprepare_pending = false;

                self.send(&kind.to_request(consistency), true)
                    .await?
                    .into_non_error_query_response()
            }
            (_, result) => result,
        }
    }

    async fn send(
        &mut self,
        request: &Request<'_>,
        applies_statement: bool,
    ) -> Result<QueryResponse, RequestAttemptError> {
        let handle = self
            .connection
            .write_request(request)
            .await
            .map_err(RequestAttemptError::WriteError)?;
        self.written |= applies_statement;
        handle.response().await
    }

    async fn reprepare(
        &mut self,
        statement: &str,
        expected_id: &Bytes,
    ) -> Result<(), RequestAttemptError> {
        let response = self
            .send(&Request::Prepare(Prepare { query: statement }), false)
            .await?
            .into_non_error_query_response()?;

        match response.result {
            result::Result::Prepared(prepared) if prepared.id == *expected_id => Ok(()),
            result::Result::Prepared(prepared) => Err(RequestAttemptError::RepreparedIdChanged {
                statement: statement.to_owned(),
                expected_id: expected_id.to_vec(),
                reprepared_id: prepared.id.to_vec(),
            }),
            _ => Err(RequestAttemptError::UnexpectedResponse(
                CqlResponseKind::Result,
            )),
        }
    }
}
