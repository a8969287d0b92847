//! Speculative executions send the same idempotent request to further nodes of the
//! query plan while earlier attempts are still waiting for a response.
//! The first response wins; the others are dropped.

use std::future::Future;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::Instant;
use tracing::{trace, trace_span, Instrument};

use crate::errors::FiberError;

/// Decides how many speculative fibers an execution may start, and how often.
pub trait SpeculativeExecutionPolicy: std::fmt::Debug + Send + Sync {
    /// Fibers started on top of the original one.
    fn max_retry_count(&self) -> usize;

    /// Time between the start of consecutive fibers.
    fn retry_interval(&self) -> Duration;
}

/// Starts up to `max_retry_count` speculative fibers, `retry_interval` apart.
#[derive(Debug, Clone)]
pub struct SimpleSpeculativeExecutionPolicy {
    pub max_retry_count: usize,
    pub retry_interval: Duration,
}

impl SpeculativeExecutionPolicy for SimpleSpeculativeExecutionPolicy {
    fn max_retry_count(&self) -> usize {
        self.max_retry_count
    }

    fn retry_interval(&self) -> Duration {
        self.retry_interval
    }
}

/// Runs the fibers made by `start_fiber` (called with the fiber's index, `0`
/// being the original one) until one succeeds, or one fails with an error
/// other nodes would most likely return too.
///
/// A fiber yields `None` when the plan had no node left for it. That, or a
/// [`FiberError::PlanExhausted`], stops new fibers from being started; the
/// running ones are still awaited.
///
/// Returns `None` if no fiber tried any node. Otherwise, when every fiber
/// failed, the error of the last one to finish is returned.
pub(crate) async fn execute<Fut, T>(
    policy: &dyn SpeculativeExecutionPolicy,
    mut start_fiber: impl FnMut(usize) -> Fut,
) -> Option<Result<T, FiberError>>
where
    Fut: Future<Output = Option<Result<T, FiberError>>>,
{
    let retry_interval = policy.retry_interval();
    let mut speculative_left = policy.max_retry_count();

    let mut fibers = FuturesUnordered::new();
    fibers.push(start_fiber(0).instrument(trace_span!("Original execution")));
    let mut started = 1;

    // Only starting a fiber rearms the timer; finished fibers leave it be.
    let next_start = tokio::time::sleep(retry_interval);
    tokio::pin!(next_start);

    let mut last_error = None;
    loop {
        tokio::select! {
            _ = &mut next_start, if speculative_left > 0 => {
                trace!(fiber = started, "Starting speculative execution");
                let span = trace_span!("Speculative execution", fiber = started);
                fibers.push(start_fiber(started).instrument(span));
                started += 1;
                speculative_left -= 1;
                next_start.as_mut().reset(Instant::now() + retry_interval);
            }
            Some(outcome) = fibers.next() => {
                match outcome {
                    Some(Ok(success)) => return Some(Ok(success)),
                    Some(Err(error)) if !error.can_be_ignored() => return Some(Err(error)),
                    Some(Err(error)) => {
                        if let FiberError::PlanExhausted(_) = error {
                            speculative_left = 0;
                        }
                        last_error = Some(error);
                    }
                    None => speculative_left = 0,
                }
                if fibers.is_empty() && speculative_left == 0 {
                    return last_error.map(Err);
                }
            }
        }
    }
}
