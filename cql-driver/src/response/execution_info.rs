use std::collections::HashMap;
use std::net::SocketAddr;

use bytes::Bytes;
use uuid::Uuid;

use super::Coordinator;
use crate::errors::{NodeErrors, RequestAttemptError};

/// Everything learned while executing one statement, across all of its attempts.
///
/// `successful_execution_index` and `coordinator` are set iff the execution
/// succeeded. `errors` has one entry per attempt that failed, including the
/// ones that were followed by a successful retry.
#[derive(Debug, Clone, Default)]
pub struct ExecutionInfo {
    pub(crate) coordinator: Option<Coordinator>,
    pub(crate) errors: NodeErrors,
    pub(crate) incoming_payload: HashMap<String, Bytes>,
    pub(crate) paging_state: Option<Bytes>,
    pub(crate) speculative_execution_count: usize,
    pub(crate) successful_execution_index: Option<usize>,
    pub(crate) warnings: Vec<String>,
    pub(crate) tracing_id: Option<Uuid>,
}

impl ExecutionInfo {
    /// The node that produced the successful response.
    pub fn coordinator(&self) -> Option<&Coordinator> {
        self.coordinator.as_ref()
    }

    /// Errors of failed attempts, in the order they happened.
    pub fn errors(&self) -> &[(SocketAddr, RequestAttemptError)] {
        &self.errors
    }

    pub fn incoming_payload(&self) -> &HashMap<String, Bytes> {
        &self.incoming_payload
    }

    /// Paging state to fetch the next page with, if there is one.
    pub fn paging_state(&self) -> Option<&Bytes> {
        self.paging_state.as_ref()
    }

    /// Number of speculative executions started in addition to the initial one.
    pub fn speculative_execution_count(&self) -> usize {
        self.speculative_execution_count
    }

    /// Zero-based index, in launch order, of the execution that succeeded.
    pub fn successful_execution_index(&self) -> Option<usize> {
        self.successful_execution_index
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn tracing_id(&self) -> Option<Uuid> {
        self.tracing_id
    }
}
