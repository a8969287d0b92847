//! Statements executed through the [`Session`](crate::client::session::Session):
//! unprepared [`Statement`](unprepared::Statement)s and
//! [`PreparedStatement`](prepared::PreparedStatement)s.
//!
//! Every setting left unset on a statement is taken from its execution profile,
//! or from the session's default profile when the statement has none.

use std::{sync::Arc, time::Duration};

use crate::client::execution_profile::ExecutionProfileHandle;
use crate::policies::load_balancing::LoadBalancingPolicy;
use crate::policies::retry::RetryPolicy;

pub use crate::frame::types::{Consistency, PageSize};

#[derive(Debug, Clone, Default)]
pub(crate) struct StatementConfig {
    pub(crate) consistency: Option<Consistency>,
    pub(crate) is_idempotent: bool,
    pub(crate) request_timeout: Option<Duration>,

    pub(crate) execution_profile_handle: Option<ExecutionProfileHandle>,
    pub(crate) load_balancing_policy: Option<Arc<dyn LoadBalancingPolicy>>,
    pub(crate) retry_policy: Option<Arc<dyn RetryPolicy>>,
}

impl StatementConfig {
    #[must_use]
    pub(crate) fn determine_consistency(&self, profile_consistency: Consistency) -> Consistency {
        self.consistency.unwrap_or(profile_consistency)
    }
}

macro_rules! impl_statement_config_accessors {
    ($statement:ty) => {
        impl $statement {
            pub fn set_consistency(&mut self, consistency: $crate::frame::types::Consistency) {
                self.config.consistency = Some(consistency);
            }

            /// `None` means the execution profile decides.
            pub fn get_consistency(&self) -> Option<$crate::frame::types::Consistency> {
                self.config.consistency
            }

            /// Marks the statement as safe to apply more than once.
            ///
            /// Only idempotent statements are executed speculatively, or retried
            /// on another node after the first one may have applied them.
            /// Statements are not idempotent unless marked so.
            pub fn set_is_idempotent(&mut self, is_idempotent: bool) {
                self.config.is_idempotent = is_idempotent;
            }

            pub fn get_is_idempotent(&self) -> bool {
                self.config.is_idempotent
            }

            /// Per-attempt timeout. `None` means the execution profile decides.
            pub fn set_request_timeout(&mut self, timeout: Option<std::time::Duration>) {
                self.config.request_timeout = timeout
            }

            pub fn get_request_timeout(&self) -> Option<std::time::Duration> {
                self.config.request_timeout
            }

            /// Overrides the retry policy of the execution profile.
            pub fn set_retry_policy(
                &mut self,
                retry_policy: Option<std::sync::Arc<dyn $crate::policies::retry::RetryPolicy>>,
            ) {
                self.config.retry_policy = retry_policy;
            }

            pub fn get_retry_policy(
                &self,
            ) -> Option<&std::sync::Arc<dyn $crate::policies::retry::RetryPolicy>> {
                self.config.retry_policy.as_ref()
            }

            /// Overrides the load balancing policy of the execution profile.
            pub fn set_load_balancing_policy(
                &mut self,
                load_balancing_policy: Option<
                    std::sync::Arc<dyn $crate::policies::load_balancing::LoadBalancingPolicy>,
                >,
            ) {
                self.config.load_balancing_policy = load_balancing_policy;
            }

            pub fn get_load_balancing_policy(
                &self,
            ) -> Option<&std::sync::Arc<dyn $crate::policies::load_balancing::LoadBalancingPolicy>>
            {
                self.config.load_balancing_policy.as_ref()
            }

            /// Executes the statement with the profile the handle points at,
            /// at the time of each execution.
            pub fn set_execution_profile_handle(
                &mut self,
                profile_handle: Option<$crate::client::execution_profile::ExecutionProfileHandle>,
            ) {
                self.config.execution_profile_handle = profile_handle;
            }

            pub fn get_execution_profile_handle(
                &self,
            ) -> Option<&$crate::client::execution_profile::ExecutionProfileHandle> {
                self.config.execution_profile_handle.as_ref()
            }

            /// Rows per page for the `*_single_page` methods of the session.
            pub fn set_page_size(&mut self, page_size: $crate::frame::types::PageSize) {
                self.page_size = page_size;
            }

            pub fn get_page_size(&self) -> $crate::frame::types::PageSize {
                self.page_size
            }
        }
    };
}

// Declared after the macro, so that they see it.
pub mod prepared;
pub mod unprepared;
