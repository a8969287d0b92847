use std::sync::atomic::{AtomicUsize, Ordering};

use itertools::Either;

use super::{FallbackPlan, LoadBalancingPolicy, RoutingInfo};
use crate::cluster::{ClusterState, NodeRef};

/// Tries all known nodes, starting from a different one for each request.
#[derive(Debug, Default)]
pub struct RoundRobinPolicy {
    index: AtomicUsize,
}

impl RoundRobinPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancingPolicy for RoundRobinPolicy {
    fn pick<'a>(
        &'a self,
        _request: &'a RoutingInfo,
        cluster: &'a ClusterState,
    ) -> Option<NodeRef<'a>> {
        let nodes = cluster.get_nodes_info();
        if nodes.is_empty() {
            return None;
        }
        let index = self.index.fetch_add(1, Ordering::Relaxed) % nodes.len();
        nodes.get(index)
    }

    // Continues the rotation from the node after the last picked one.
    fn fallback<'a>(
        &'a self,
        _request: &'a RoutingInfo,
        cluster: &'a ClusterState,
    ) -> FallbackPlan<'a> {
        let nodes = cluster.get_nodes_info();
        let rotation = if nodes.is_empty() {
            Either::Left(std::iter::empty::<NodeRef<'a>>())
        } else {
            let index = self.index.load(Ordering::Relaxed) % nodes.len();
            Either::Right(nodes[index..].iter().chain(nodes[..index].iter()))
        };
        Box::new(rotation)
    }

    fn name(&self) -> String {
        "RoundRobinPolicy".to_string()
    }
}
