//! Choosing the nodes a request is sent to.

use std::time::Duration;

use crate::cluster::{ClusterState, NodeRef};
use crate::errors::RequestAttemptError;
use crate::frame::types::Consistency;

mod plan;
mod round_robin;
pub use plan::Plan;
pub use round_robin::RoundRobinPolicy;

/// What a policy knows about the request it routes.
#[derive(Default, Clone, Debug)]
#[non_exhaustive]
pub struct RoutingInfo {
    pub consistency: Consistency,
    pub is_idempotent: bool,
}

/// Nodes to try once the picked one did not do.
pub type FallbackPlan<'a> = Box<dyn Iterator<Item = NodeRef<'a>> + Send + Sync + 'a>;

/// Orders the nodes of the cluster for each request.
///
/// A request usually succeeds on the first node, so the policy names that one
/// alone with [`pick`](Self::pick). [`fallback`](Self::fallback) lists the
/// candidates for retries and speculative executions, and is also consulted
/// when `pick` returns `None`. [`Plan`] takes care of not returning the
/// picked node twice.
pub trait LoadBalancingPolicy: Send + Sync + std::fmt::Debug {
    fn pick<'a>(&'a self, request: &'a RoutingInfo, cluster: &'a ClusterState)
        -> Option<NodeRef<'a>>;

    fn fallback<'a>(
        &'a self,
        request: &'a RoutingInfo,
        cluster: &'a ClusterState,
    ) -> FallbackPlan<'a>;

    /// Called after an attempt on `node` succeeded.
    fn on_request_success(&self, _request: &RoutingInfo, _latency: Duration, _node: NodeRef<'_>) {}

    /// Called after an attempt on `node` failed.
    fn on_request_failure(
        &self,
        _request: &RoutingInfo,
        _latency: Duration,
        _node: NodeRef<'_>,
        _error: &RequestAttemptError,
    ) {
    }

    fn name(&self) -> String;
}
