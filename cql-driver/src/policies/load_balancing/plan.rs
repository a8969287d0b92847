use tracing::error;

use super::{FallbackPlan, LoadBalancingPolicy, NodeRef, RoutingInfo};
use crate::cluster::ClusterState;

enum Stage<'a> {
    NotStarted,
    Picked(NodeRef<'a>),
    Fallback {
        rest: FallbackPlan<'a>,
        already_returned: Option<NodeRef<'a>>,
    },
}

/// Nodes to try for a single request, in order.
///
/// Only the first node is asked for up front, with [`LoadBalancingPolicy::pick`].
/// The fallback list is computed once a second node is needed.
pub struct Plan<'a> {
    policy: &'a dyn LoadBalancingPolicy,
    routing_info: &'a RoutingInfo,
    cluster: &'a ClusterState,
    stage: Stage<'a>,
}

impl<'a> Plan<'a> {
    pub fn new(
        policy: &'a dyn LoadBalancingPolicy,
        routing_info: &'a RoutingInfo,
        cluster: &'a ClusterState,
    ) -> Self {
        Self {
            policy,
            routing_info,
            cluster,
            stage: Stage::NotStarted,
        }
    }

    fn start_fallback(&mut self, already_returned: Option<NodeRef<'a>>) {
        self.stage = Stage::Fallback {
            rest: self.policy.fallback(self.routing_info, self.cluster),
            already_returned,
        };
    }
}

impl<'a> Iterator for Plan<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.stage {
            Stage::NotStarted => match self.policy.pick(self.routing_info, self.cluster) {
                Some(node) => {
                    self.stage = Stage::Picked(node);
                    Some(node)
                }
                None => {
                    self.start_fallback(None);
                    let first = self.next();
                    if first.is_none() {
                        error!(
                            policy = %self.policy.name(),
                            routing_info = ?self.routing_info,
                            "Load balancing policy gave no node to send the request to"
                        );
                    }
                    first
                }
            },
            Stage::Picked(node) => {
                let node = *node;
                self.start_fallback(Some(node));
                self.next()
            }
            Stage::Fallback {
                rest,
                already_returned,
            } => {
                let skipped = *already_returned;
                rest.find(|node| Some(*node) != skipped)
            }
        }
    }
}
