//! The result of a successfully executed statement.

use std::slice;

use crate::frame::response::result::{self, Row, Rows};
use crate::response::{ExecutionInfo, NonErrorQueryResponse};

/// Result of a single request to the database.
///
/// Statements that return no rows (writes, `USE`, schema changes) have
/// no rows at all, which is different from a `SELECT` returning an empty set.
#[derive(Debug, Clone)]
pub struct QueryResult {
    rows: Option<Rows>,
    execution_info: ExecutionInfo,
}

impl QueryResult {
    pub(crate) fn new(
        response: NonErrorQueryResponse,
        mut execution_info: ExecutionInfo,
    ) -> Self {
        let NonErrorQueryResponse {
            result,
            tracing_id,
            warnings,
            custom_payload,
        } = response;

        execution_info.tracing_id = tracing_id;
        execution_info.warnings = warnings;
        execution_info.incoming_payload = custom_payload.unwrap_or_default();

        let rows = match result {
            result::Result::Rows(mut rows) => {
                execution_info.paging_state = rows.paging_state.take();
                Some(rows)
            }
            _ => None,
        };

        Self {
            rows,
            execution_info,
        }
    }

    /// Returns `true` if the response was of Rows type.
    pub fn is_rows(&self) -> bool {
        self.rows.is_some()
    }

    /// Iterates the returned rows, `None` if the statement returned no rows.
    pub fn rows(&self) -> Option<slice::Iter<'_, Row>> {
        self.rows.as_ref().map(|rows| rows.rows.iter())
    }

    /// Column names of the result set.
    pub fn column_names(&self) -> Option<&[String]> {
        self.rows.as_ref().map(|rows| &*rows.column_names)
    }

    pub fn into_rows(self) -> Option<Vec<Row>> {
        self.rows.map(|rows| rows.rows)
    }

    pub fn execution_info(&self) -> &ExecutionInfo {
        &self.execution_info
    }
}
