use crate::errors::RequestAttemptError;
use crate::frame::types::Consistency;

/// What the engine tells a [RetrySession] about a failed attempt.
#[derive(Debug, Clone, Copy)]
pub struct RequestInfo<'a> {
    pub error: &'a RequestAttemptError,
    /// Set by the user on the statement. `false` means "not known to be idempotent".
    pub is_idempotent: bool,
    /// Consistency the failed attempt was sent with.
    pub consistency: Consistency,
    /// Whether the request made it onto the connection. A request that was
    /// not written cannot have been applied, whatever its idempotence.
    pub request_written: bool,
    /// Retries this fiber already made, on any node. `0` on the first failure.
    pub retry_count: usize,
}

/// The next step of an execution after a failed attempt.
///
/// A `Some` consistency replaces the one used so far for the rest of the execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    RetrySameNode(Option<Consistency>),
    RetryNextNode(Option<Consistency>),
    DontRetry,
    /// Treat the failure as a successful write with an empty result.
    IgnoreWriteError,
}

/// Creates a [RetrySession] for every execution fiber.
pub trait RetryPolicy: std::fmt::Debug + Send + Sync {
    fn new_session(&self) -> Box<dyn RetrySession>;
}

/// Retry state of one fiber of an execution, consulted after each of its failed attempts.
///
/// Every fiber, the original one and each speculative one, gets a session of its own
/// from [`RetryPolicy::new_session`].
pub trait RetrySession: Send + Sync {
    fn decide_should_retry(&mut self, request_info: RequestInfo) -> RetryDecision;

    /// Forgets the retries made so far. The engine never reuses a session, so it
    /// never calls this; it is for callers that do.
    fn reset(&mut self);
}
