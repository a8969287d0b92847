use std::collections::HashMap;

use bytes::Bytes;
use uuid::Uuid;

use crate::errors::RequestAttemptError;
use crate::frame::response::{result, Response};

/// A response read from a connection, with the extras the frame carried.
#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub response: Response,
    pub tracing_id: Option<Uuid>,
    pub warnings: Vec<String>,
    pub custom_payload: Option<HashMap<String, Bytes>>,
}

impl QueryResponse {
    pub fn new(response: Response) -> Self {
        Self {
            response,
            tracing_id: None,
            warnings: Vec::new(),
            custom_payload: None,
        }
    }

    pub(crate) fn into_non_error_query_response(
        self,
    ) -> Result<NonErrorQueryResponse, RequestAttemptError> {
        let QueryResponse {
            response,
            tracing_id,
            warnings,
            custom_payload,
        } = self;
        match response {
            Response::Result(result) => Ok(NonErrorQueryResponse {
                result,
                tracing_id,
                warnings,
                custom_payload,
            }),
            Response::Error(error) => Err(RequestAttemptError::DbError(error.error, error.reason)),
            other => Err(RequestAttemptError::UnexpectedResponse(
                other.to_response_kind(),
            )),
        }
    }
}

/// A [`QueryResponse`] that carried a RESULT.
#[derive(Debug)]
pub(crate) struct NonErrorQueryResponse {
    pub(crate) result: result::Result,
    pub(crate) tracing_id: Option<Uuid>,
    pub(crate) warnings: Vec<String>,
    pub(crate) custom_payload: Option<HashMap<String, Bytes>>,
}

impl NonErrorQueryResponse {
    /// Stands in for the response when the retry policy ignores an error.
    pub(crate) fn void() -> Self {
        Self {
            result: result::Result::Void,
            tracing_id: None,
            warnings: Vec::new(),
            custom_payload: None,
        }
    }

    pub(crate) fn as_set_keyspace(&self) -> Option<&result::SetKeyspace> {
        match &self.result {
            result::Result::SetKeyspace(set_keyspace) => Some(set_keyspace),
            _ => None,
        }
    }
}
