//! Administrative queries sent over a single, already chosen connection.
//!
//! These bypass the load balancing and retry machinery entirely:
//! topology refreshes must talk to the control node and nobody else.

use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use crate::errors::RequestAttemptError;
use crate::frame::request::{BoundValues, Query, QueryParameters, Request};
use crate::frame::response::result::{self, Row};
use crate::frame::response::CqlResponseKind;
use crate::frame::types::{Consistency, PageSize};
use crate::network::Connection;

/// Rows returned by an administrative query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminResult {
    pub rows: Vec<Row>,
}

impl AdminResult {
    pub fn first_row(&self) -> Option<&Row> {
        self.rows.first()
    }
}

/// Issues one system-table query over a given connection.
#[async_trait]
pub trait AdminQuery: Send + Sync {
    async fn query(
        &self,
        connection: &dyn Connection,
        cql: &str,
        values: BoundValues<'_>,
        timeout: Duration,
        page_size: PageSize,
    ) -> Result<AdminResult, RequestAttemptError>;
}

/// Sends the query as a plain `QUERY` request at consistency `ONE`
/// and waits for the response at most `timeout`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionAdminQuery;

#[async_trait]
impl AdminQuery for ConnectionAdminQuery {
    async fn query(
        &self,
        connection: &dyn Connection,
        cql: &str,
        values: BoundValues<'_>,
        timeout: Duration,
        page_size: PageSize,
    ) -> Result<AdminResult, RequestAttemptError> {
        let request = Request::Query(Query {
            contents: cql,
            parameters: QueryParameters {
                consistency: Consistency::One,
                values,
                page_size,
                paging_state: None,
            },
        });

        trace!(
            connection = %connection.connect_address(),
            "Sending admin query: {}",
            cql
        );

        let roundtrip = async {
            let handle = connection
                .write_request(&request)
                .await
                .map_err(RequestAttemptError::WriteError)?;
            handle.response().await
        };

        let response = tokio::time::timeout(timeout, roundtrip)
            .await
            .map_err(|_| RequestAttemptError::AttemptTimeout(timeout))??
            .into_non_error_query_response()?;

        match response.result {
            result::Result::Rows(rows) => Ok(AdminResult { rows: rows.rows }),
            result::Result::Void => Ok(AdminResult::default()),
            _ => Err(RequestAttemptError::UnexpectedResponse(
                CqlResponseKind::Result,
            )),
        }
    }
}
