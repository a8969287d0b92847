//! Retry policies decide what an execution does after a failed attempt:
//! try the same node again, move on to the next node of the plan, or give up.

mod default;
mod fallthrough;
mod retry_policy;

pub use default::{DefaultRetryPolicy, DefaultRetrySession};
pub use fallthrough::{FallthroughRetryPolicy, FallthroughRetrySession};
pub use retry_policy::{RequestInfo, RetryDecision, RetryPolicy, RetrySession};
