use crate::errors::{DbError, RequestAttemptError, WriteType};

use super::{RequestInfo, RetryDecision, RetryPolicy, RetrySession};

/// Retries only where another try has a real chance of succeeding and cannot
/// apply a non-idempotent write twice.
///
/// | Error | Decision |
/// |---|---|
/// | request not written | next node |
/// | broken connection, attempt timeout, `Overloaded`, `ServerError`, `TruncateError` | next node, if idempotent or not written |
/// | `Unavailable` | next node, once |
/// | `ReadTimeout` with enough replies but no data | same node, once |
/// | `WriteTimeout` of an idempotent batch log write | same node, once |
/// | `IsBootstrapping` | next node |
/// | anything else, or serial consistency | no retry |
#[derive(Debug, Default)]
pub struct DefaultRetryPolicy;

impl DefaultRetryPolicy {
    pub fn new() -> DefaultRetryPolicy {
        DefaultRetryPolicy
    }
}

impl RetryPolicy for DefaultRetryPolicy {
    fn new_session(&self) -> Box<dyn RetrySession> {
        Box::new(DefaultRetrySession::default())
    }
}

/// Kinds of failures that may be retried, each with its own budget.
enum Retryable {
    /// The node could not take the request; any node may be tried next.
    NodeUnusable,
    /// The node may have applied the request before failing.
    NodeFailed,
    Unavailable,
    ReadTimeout,
    WriteTimeout,
}

fn classify(error: &RequestAttemptError, is_idempotent: bool) -> Option<Retryable> {
    match error {
        RequestAttemptError::WriteError(_)
        | RequestAttemptError::DbError(DbError::IsBootstrapping, _) => {
            Some(Retryable::NodeUnusable)
        }
        RequestAttemptError::BrokenConnectionError(_)
        | RequestAttemptError::AttemptTimeout(_)
        | RequestAttemptError::DbError(
            DbError::Overloaded | DbError::ServerError | DbError::TruncateError,
            _,
        ) => Some(Retryable::NodeFailed),
        RequestAttemptError::DbError(DbError::Unavailable { .. }, _) => {
            Some(Retryable::Unavailable)
        }
        // Enough replicas answered, but only with digests: the data read itself timed out.
        RequestAttemptError::DbError(
            DbError::ReadTimeout {
                received,
                required,
                data_present: false,
                ..
            },
            _,
        ) if received >= required => Some(Retryable::ReadTimeout),
        RequestAttemptError::DbError(
            DbError::WriteTimeout {
                write_type: WriteType::BatchLog,
                ..
            },
            _,
        ) if is_idempotent => Some(Retryable::WriteTimeout),
        _ => None,
    }
}

/// Implementation of [RetrySession] for [DefaultRetryPolicy].
#[derive(Debug, Default)]
pub struct DefaultRetrySession {
    unavailable_retried: bool,
    read_timeout_retried: bool,
    write_timeout_retried: bool,
}

/// Spends a single-use retry budget. Returns whether it was still available.
fn take(spent: &mut bool) -> bool {
    !std::mem::replace(spent, true)
}

impl RetrySession for DefaultRetrySession {
    fn decide_should_retry(&mut self, request_info: RequestInfo) -> RetryDecision {
        if request_info.consistency.is_serial() {
            return RetryDecision::DontRetry;
        }

        let Some(retryable) = classify(request_info.error, request_info.is_idempotent) else {
            return RetryDecision::DontRetry;
        };
        match retryable {
            Retryable::NodeUnusable => RetryDecision::RetryNextNode(None),
            Retryable::NodeFailed
                if request_info.is_idempotent || !request_info.request_written =>
            {
                RetryDecision::RetryNextNode(None)
            }
            Retryable::Unavailable if take(&mut self.unavailable_retried) => {
                RetryDecision::RetryNextNode(None)
            }
            Retryable::ReadTimeout if take(&mut self.read_timeout_retried) => {
                RetryDecision::RetrySameNode(None)
            }
            Retryable::WriteTimeout if take(&mut self.write_timeout_retried) => {
                RetryDecision::RetrySameNode(None)
            }
            _ => RetryDecision::DontRetry,
        }
    }

    fn reset(&mut self) {
        *self = DefaultRetrySession::default();
    }
}
