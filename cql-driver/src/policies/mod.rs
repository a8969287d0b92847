//! This module holds policies, which are entities that allow configuring
//! the driver's behaviour in various aspects. The common feature of all policies
//! is that users can easily implement a custom policy if they so wish, by implementing
//! the corresponding trait.
//!
//! Currently supported policies are:
//! - [AddressTranslator](address_translator::AddressTranslator), which is used to translate
//!   addresses read from the cluster's system tables into connectable ones,
//! - [LoadBalancingPolicy](load_balancing::LoadBalancingPolicy), which decides which nodes
//!   to contact for a request and in which order,
//! - [RetryPolicy](retry::RetryPolicy), which decides whether and where to retry a failed request,
//! - [SpeculativeExecutionPolicy](speculative_execution::SpeculativeExecutionPolicy), which
//!   decides when to send a speculative request to another node.

pub mod address_translator;
pub mod load_balancing;
pub mod retry;
pub mod speculative_execution;
