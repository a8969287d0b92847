//! Execution profiles group the settings that drive how a request is executed:
//! consistency, per-attempt timeout, and the load balancing, retry and
//! speculative execution policies.
//!
//! A [`ExecutionProfile`] never changes once built. What sessions and statements hold is
//! an [`ExecutionProfileHandle`], which can be pointed at a different profile at runtime;
//! every holder of the handle (or of its clones) picks the new profile up on its next request.
//!
//! ```
//! use cql_driver::client::execution_profile::ExecutionProfile;
//! use cql_driver::statement::unprepared::Statement;
//! use cql_driver::statement::Consistency;
//! use std::time::Duration;
//!
//! let reads = ExecutionProfile::builder()
//!     .request_timeout(Some(Duration::from_secs(2)))
//!     .consistency(Consistency::LocalOne)
//!     .build();
//! let strict_reads = reads.to_builder().consistency(Consistency::All).build();
//!
//! let mut statement = Statement::new("SELECT v FROM ks.t");
//! statement.set_execution_profile_handle(Some(strict_reads.into_handle()));
//! ```

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;

use crate::frame::types::Consistency;
use crate::policies::load_balancing::{LoadBalancingPolicy, RoundRobinPolicy};
use crate::policies::retry::{DefaultRetryPolicy, RetryPolicy};
use crate::policies::speculative_execution::SpeculativeExecutionPolicy;

const DEFAULT_CONSISTENCY: Consistency = Consistency::LocalQuorum;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub(crate) struct ExecutionProfileInner {
    pub(crate) request_timeout: Option<Duration>,
    pub(crate) consistency: Consistency,
    pub(crate) load_balancing_policy: Arc<dyn LoadBalancingPolicy>,
    pub(crate) retry_policy: Arc<dyn RetryPolicy>,
    pub(crate) speculative_execution_policy: Option<Arc<dyn SpeculativeExecutionPolicy>>,
}

impl Default for ExecutionProfileInner {
    fn default() -> Self {
        Self {
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            consistency: DEFAULT_CONSISTENCY,
            load_balancing_policy: Arc::new(RoundRobinPolicy::new()),
            retry_policy: Arc::new(DefaultRetryPolicy::new()),
            speculative_execution_policy: None,
        }
    }
}

/// Builds an [`ExecutionProfile`]. Options that are not set keep their defaults,
/// or the values of the profile the builder was made from.
///
/// ```
/// # use cql_driver::client::execution_profile::ExecutionProfile;
/// # use cql_driver::policies::retry::FallthroughRetryPolicy;
/// # use cql_driver::statement::Consistency;
/// # use std::sync::Arc;
/// let no_retries = ExecutionProfile::builder()
///     .consistency(Consistency::Quorum)
///     .retry_policy(Arc::new(FallthroughRetryPolicy::new()))
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExecutionProfileBuilder {
    inner: ExecutionProfileInner,
}

impl ExecutionProfileBuilder {
    /// Timeout of every single attempt; `None` lets attempts wait forever.
    /// Defaults to 30 seconds.
    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.inner.request_timeout = timeout;
        self
    }

    /// Consistency used by statements that do not set their own. Defaults to `LOCAL_QUORUM`.
    pub fn consistency(mut self, consistency: Consistency) -> Self {
        self.inner.consistency = consistency;
        self
    }

    /// Defaults to [`RoundRobinPolicy`].
    pub fn load_balancing_policy(
        mut self,
        load_balancing_policy: Arc<dyn LoadBalancingPolicy>,
    ) -> Self {
        self.inner.load_balancing_policy = load_balancing_policy;
        self
    }

    /// Defaults to [`DefaultRetryPolicy`].
    pub fn retry_policy(mut self, retry_policy: Arc<dyn RetryPolicy>) -> Self {
        self.inner.retry_policy = retry_policy;
        self
    }

    /// Speculative executions only ever apply to idempotent statements.
    /// Disabled by default.
    pub fn speculative_execution_policy(
        mut self,
        speculative_execution_policy: Option<Arc<dyn SpeculativeExecutionPolicy>>,
    ) -> Self {
        self.inner.speculative_execution_policy = speculative_execution_policy;
        self
    }

    pub fn build(self) -> ExecutionProfile {
        ExecutionProfile(Arc::new(self.inner))
    }
}

/// An immutable set of execution settings. See the [module docs](self).
#[derive(Debug, Clone, Default)]
pub struct ExecutionProfile(pub(crate) Arc<ExecutionProfileInner>);

impl ExecutionProfile {
    /// A builder starting from the default settings.
    pub fn builder() -> ExecutionProfileBuilder {
        ExecutionProfileBuilder::default()
    }

    /// A builder starting from this profile's settings.
    pub fn to_builder(&self) -> ExecutionProfileBuilder {
        ExecutionProfileBuilder {
            inner: ExecutionProfileInner::clone(&self.0),
        }
    }

    pub fn into_handle(self) -> ExecutionProfileHandle {
        ExecutionProfileHandle::new(self, None)
    }

    /// Like [`into_handle`](Self::into_handle), with a label shown in the handle's `Debug` output.
    pub fn into_handle_with_label(self, label: String) -> ExecutionProfileHandle {
        ExecutionProfileHandle::new(self, Some(label))
    }

    pub fn get_request_timeout(&self) -> Option<Duration> {
        self.0.request_timeout
    }

    pub fn get_consistency(&self) -> Consistency {
        self.0.consistency
    }

    pub fn get_load_balancing_policy(&self) -> &Arc<dyn LoadBalancingPolicy> {
        &self.0.load_balancing_policy
    }

    pub fn get_retry_policy(&self) -> &Arc<dyn RetryPolicy> {
        &self.0.retry_policy
    }

    pub fn get_speculative_execution_policy(&self) -> Option<&Arc<dyn SpeculativeExecutionPolicy>> {
        self.0.speculative_execution_policy.as_ref()
    }
}

#[derive(Debug)]
struct HandleTarget {
    profile: ArcSwap<ExecutionProfileInner>,
    label: Option<String>,
}

/// A shared, remappable pointer to an [`ExecutionProfile`].
///
/// Clones share the pointer: remapping any of them remaps all of them.
#[derive(Debug, Clone)]
pub struct ExecutionProfileHandle(Arc<HandleTarget>);

impl ExecutionProfileHandle {
    fn new(profile: ExecutionProfile, label: Option<String>) -> Self {
        Self(Arc::new(HandleTarget {
            profile: ArcSwap::new(profile.0),
            label,
        }))
    }

    /// The profile the handle points at right now.
    pub(crate) fn access(&self) -> Arc<ExecutionProfileInner> {
        self.0.profile.load_full()
    }

    pub fn label(&self) -> Option<&str> {
        self.0.label.as_deref()
    }

    /// A builder starting from the settings of the profile currently pointed at.
    pub fn pointee_to_builder(&self) -> ExecutionProfileBuilder {
        self.to_profile().to_builder()
    }

    pub fn to_profile(&self) -> ExecutionProfile {
        ExecutionProfile(self.access())
    }

    /// Points this handle, and every clone of it, at `profile`.
    /// Requests already running keep the profile they started with.
    pub fn map_to_another_profile(&mut self, profile: ExecutionProfile) {
        self.0.profile.store(profile.0)
    }
}
