use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{debug, trace, trace_span, Instrument};

use crate::client::session::Session;
use crate::cluster::NodeRef;
use crate::errors::{ExecutionError, FiberError, NodeErrors, RequestAttemptError};
use crate::execution::attempt::{ExecutionAttempt, RequestKind};
use crate::frame::types::Consistency;
use crate::policies::load_balancing::{self, LoadBalancingPolicy, RoutingInfo};
use crate::policies::retry::{RequestInfo, RetryDecision, RetrySession};
use crate::policies::speculative_execution;
use crate::response::{Coordinator, ExecutionInfo, NonErrorQueryResponse};
use crate::statement::StatementConfig;

/// State shared by all fibers of one execution.
#[derive(Debug, Default)]
struct ExecutionState {
    errors: Mutex<NodeErrors>,
    completed: AtomicBool,
    speculative_executions: AtomicUsize,
}

impl ExecutionState {
    /// Claims the execution's result. Only the first caller succeeds.
    fn try_complete(&self) -> bool {
        !self.completed.swap(true, Ordering::AcqRel)
    }

    fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    fn record_error(&self, node: NodeRef<'_>, error: RequestAttemptError) {
        // Fibers that lost the race must not leave traces in the result.
        if self.is_completed() {
            return;
        }
        self.errors
            .lock()
            .unwrap()
            .push((node.connect_address, error));
    }

    fn into_execution_info(self) -> ExecutionInfo {
        ExecutionInfo {
            errors: self
                .errors
                .into_inner()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
            speculative_execution_count: self.speculative_executions.into_inner(),
            ..Default::default()
        }
    }
}

/// The plan all fibers of an execution take their nodes from.
struct SharedPlan<'p> {
    iter: Mutex<load_balancing::Plan<'p>>,
}

impl<'p> SharedPlan<'p> {
    fn next_node(&self) -> Option<NodeRef<'p>> {
        self.iter.lock().unwrap().next()
    }
}

/// Everything a fiber needs, borrowed from the execution.
///
/// `'p` is kept apart from `'a`: the plan is behind a `Mutex`, which makes
/// `SharedPlan` invariant in it.
struct FiberContext<'a, 'p> {
    kind: RequestKind<'a>,
    plan: &'a SharedPlan<'p>,
    state: &'a ExecutionState,
    consistency: Consistency,
    is_idempotent: bool,
    request_timeout: Option<Duration>,
    load_balancing_policy: &'a dyn LoadBalancingPolicy,
    routing_info: &'a RoutingInfo,
}

struct FiberSuccess {
    response: NonErrorQueryResponse,
    coordinator: Coordinator,
    fiber_index: usize,
}

/// Executes one request: walks the query plan, retrying and speculating as
/// the policies decide, until a node returns a response or the execution gives up.
///
/// On success the response is returned with the [ExecutionInfo] of the execution.
/// A `SetKeyspace` result switches the session's keyspace before returning.
pub(crate) async fn run_request(
    session: &Session,
    kind: RequestKind<'_>,
    statement_config: &StatementConfig,
) -> Result<(NonErrorQueryResponse, ExecutionInfo), ExecutionError> {
    let execution_profile = statement_config
        .execution_profile_handle
        .as_ref()
        .unwrap_or_else(|| session.get_default_execution_profile_handle())
        .access();

    let consistency = statement_config.determine_consistency(execution_profile.consistency);
    let is_idempotent = statement_config.is_idempotent;
    let request_timeout = statement_config
        .request_timeout
        .or(execution_profile.request_timeout);

    let load_balancer = statement_config
        .load_balancing_policy
        .as_deref()
        .unwrap_or(execution_profile.load_balancing_policy.as_ref());
    let retry_policy = statement_config
        .retry_policy
        .as_deref()
        .unwrap_or(&*execution_profile.retry_policy);

    let routing_info = RoutingInfo {
        consistency,
        is_idempotent,
    };
    let cluster_state = session.get_cluster_state();
    let shared_plan = SharedPlan {
        iter: Mutex::new(load_balancing::Plan::new(
            load_balancer,
            &routing_info,
            &cluster_state,
        )),
    };
    let state = ExecutionState::default();

    let context = FiberContext {
        kind,
        plan: &shared_plan,
        state: &state,
        consistency,
        is_idempotent,
        request_timeout,
        load_balancing_policy: load_balancer,
        routing_info: &routing_info,
    };

    let outcome = match execution_profile.speculative_execution_policy.as_deref() {
        Some(speculative) if is_idempotent => {
            let fiber_generator = |fiber_index: usize| {
                if fiber_index > 0 {
                    state.speculative_executions.fetch_add(1, Ordering::Relaxed);
                }
                run_fiber(&context, fiber_index, retry_policy.new_session())
            };
            speculative_execution::execute(speculative, fiber_generator).await
        }
        _ => {
            run_fiber(&context, 0, retry_policy.new_session())
                .instrument(trace_span!("Request"))
                .await
        }
    };

    let mut execution_info = state.into_execution_info();
    match outcome {
        Some(Ok(FiberSuccess {
            response,
            coordinator,
            fiber_index,
        })) => {
            execution_info.coordinator = Some(coordinator);
            execution_info.successful_execution_index = Some(fiber_index);
            if let Some(set_keyspace) = response.as_set_keyspace() {
                debug!(
                    "Detected USE KEYSPACE query, setting session's keyspace to {}",
                    set_keyspace.keyspace_name
                );
                session.set_keyspace(&set_keyspace.keyspace_name);
            }
            Ok((response, execution_info))
        }
        Some(Err(fiber_error)) => Err(execution_failure(fiber_error, execution_info)),
        None => Err(ExecutionError::EmptyPlan),
    }
}

/// Picks the error describing why the execution as a whole failed.
fn execution_failure(fiber_error: FiberError, execution_info: ExecutionInfo) -> ExecutionError {
    let info = Box::new(execution_info);
    match fiber_error {
        // No attempt followed the last timed out one.
        FiberError::GaveUp(RequestAttemptError::AttemptTimeout(timeout))
        | FiberError::PlanExhausted(RequestAttemptError::AttemptTimeout(timeout)) => {
            ExecutionError::RequestTimeout { timeout, info }
        }
        FiberError::GaveUp(error) => ExecutionError::LastAttemptError { error, info },
        FiberError::PlanExhausted(_) => ExecutionError::AllNodesFailed { info },
    }
}

/// Tries nodes from the shared plan one after another.
///
/// Returns `None` if the plan had no node left for this fiber before any
/// attempt was made, or if another fiber completed the execution first.
async fn run_fiber(
    context: &FiberContext<'_, '_>,
    fiber_index: usize,
    mut retry_session: Box<dyn RetrySession>,
) -> Option<Result<FiberSuccess, FiberError>> {
    let mut last_error: Option<RequestAttemptError> = None;
    let mut current_consistency = context.consistency;
    let mut retry_count = 0;

    'nodes_in_plan: while let Some(node) = context.plan.next_node() {
        let span = trace_span!("Executing request", node = %node.connect_address);
        'same_node_retries: loop {
            if context.state.is_completed() {
                return None;
            }
            trace!(parent: &span, "Execution started");
            let connection = match node.connection() {
                Ok(connection) => connection,
                Err(e) => {
                    trace!(
                        parent: &span,
                        error = %e,
                        "Choosing connection failed"
                    );
                    let error = RequestAttemptError::from(e);
                    context.state.record_error(node, error.clone());
                    last_error = Some(error);
                    continue 'nodes_in_plan;
                }
            };

            trace!(
                parent: &span,
                connection = %connection.connect_address(),
                "Sending"
            );
            let coordinator = Coordinator::new(node, &*connection);
            let mut attempt = ExecutionAttempt::new(connection);
            let request_start = Instant::now();

            let request_result = match context.request_timeout {
                Some(timeout) => {
                    tokio::time::timeout(timeout, attempt.run(context.kind, current_consistency))
                        .instrument(span.clone())
                        .await
                        .unwrap_or_else(|_| Err(RequestAttemptError::AttemptTimeout(timeout)))
                }
                None => {
                    attempt
                        .run(context.kind, current_consistency)
                        .instrument(span.clone())
                        .await
                }
            };

            let elapsed = request_start.elapsed();
            let request_error = match request_result {
                Ok(response) => {
                    trace!(parent: &span, "Request succeeded");
                    context.load_balancing_policy.on_request_success(
                        context.routing_info,
                        elapsed,
                        node,
                    );
                    return complete(context, response, coordinator, fiber_index);
                }
                Err(e) => {
                    trace!(
                        parent: &span,
                        last_error = %e,
                        written = attempt.written(),
                        reprepare_pending = attempt.reprepare_pending(),
                        "Request failed"
                    );
                    context.load_balancing_policy.on_request_failure(
                        context.routing_info,
                        elapsed,
                        node,
                        &e,
                    );
                    e
                }
            };

            context.state.record_error(node, request_error.clone());

            let request_info = RequestInfo {
                error: &request_error,
                is_idempotent: context.is_idempotent,
                consistency: current_consistency,
                request_written: attempt.written(),
                retry_count,
            };

            let retry_decision = retry_session.decide_should_retry(request_info);
            trace!(
                parent: &span,
                retry_count,
                retry_decision = ?retry_decision
            );

            match retry_decision {
                RetryDecision::RetrySameNode(new_cl) => {
                    current_consistency = new_cl.unwrap_or(current_consistency);
                    retry_count += 1;
                    continue 'same_node_retries;
                }
                RetryDecision::RetryNextNode(new_cl) => {
                    current_consistency = new_cl.unwrap_or(current_consistency);
                    retry_count += 1;
                    last_error = Some(request_error);
                    continue 'nodes_in_plan;
                }
                RetryDecision::DontRetry => {
                    return Some(Err(FiberError::GaveUp(request_error)));
                }
                RetryDecision::IgnoreWriteError => {
                    return complete(
                        context,
                        NonErrorQueryResponse::void(),
                        coordinator,
                        fiber_index,
                    );
                }
            };
        }
    }

    last_error.map(|error| Err(FiberError::PlanExhausted(error)))
}

fn complete(
    context: &FiberContext<'_, '_>,
    response: NonErrorQueryResponse,
    coordinator: Coordinator,
    fiber_index: usize,
) -> Option<Result<FiberSuccess, FiberError>> {
    if !context.state.try_complete() {
        trace!("Execution already completed by another fiber, discarding response");
        return None;
    }
    Some(Ok(FiberSuccess {
        response,
        coordinator,
        fiber_index,
    }))
}
