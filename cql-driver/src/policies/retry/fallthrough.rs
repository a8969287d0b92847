use super::{RequestInfo, RetryDecision, RetryPolicy, RetrySession};

/// Never retries: the first failed attempt fails the execution.
#[derive(Debug, Default, Clone, Copy)]
pub struct FallthroughRetryPolicy;

impl FallthroughRetryPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl RetryPolicy for FallthroughRetryPolicy {
    fn new_session(&self) -> Box<dyn RetrySession> {
        Box::new(FallthroughRetrySession)
    }
}

/// The [RetrySession] of [FallthroughRetryPolicy].
#[derive(Debug)]
pub struct FallthroughRetrySession;

impl RetrySession for FallthroughRetrySession {
    fn decide_should_retry(&mut self, _: RequestInfo) -> RetryDecision {
        RetryDecision::DontRetry
    }

    fn reset(&mut self) {}
}
