//! Core of an async CQL driver: cluster topology discovery and request execution.
//!
//! The crate is transport agnostic. Connections, connection pools and the control
//! connection are traits ([Connection](network::Connection),
//! [ConnectionPool](network::ConnectionPool), [ControlConnection](cluster::ControlConnection))
//! that the embedding driver implements on top of its framing and socket code.
//!
//! # Driver overview
//! ### Executing requests
//! All request execution revolves around the [Session](client::session::Session).
//! It walks a query plan produced by the
//! [load balancing policy](policies::load_balancing), consults the
//! [retry policy](policies::retry) after every failed attempt and, for idempotent
//! statements, may run [speculative executions](policies::speculative_execution).
//!
//! ```rust,no_run
//! # use cql_driver::client::session::Session;
//! # use std::error::Error;
//! # async fn check_only_compiles(session: &Session) -> Result<(), Box<dyn Error>> {
//! use cql_driver::frame::value::CqlValue;
//!
//! let result = session
//!     .query_unpaged("SELECT a, b FROM ks.tab WHERE a = ?", &[CqlValue::Int(2)])
//!     .await?;
//! for row in result.rows().into_iter().flatten() {
//!     println!("{:?}", row);
//! }
//! println!("attempts failed: {}", result.execution_info().errors().len());
//! # Ok(())
//! # }
//! ```
//!
//! ### Discovering the cluster
//! The [TopologyMonitor](cluster::TopologyMonitor) reads `system.local` and
//! `system.peers` through the control connection and turns their rows into
//! [NodeInfo](cluster::NodeInfo)s, translating addresses on the way.

pub mod client;
pub mod cluster;
pub mod errors;
pub(crate) mod execution;
pub mod frame;
pub mod network;
pub mod policies;
pub mod response;
pub mod statement;

pub(crate) mod utils;

pub use client::execution_profile::{ExecutionProfile, ExecutionProfileHandle};
pub use client::session::{Session, SessionConfig};
pub use cluster::{Node, NodeInfo, TopologyMonitor};
pub use statement::prepared::PreparedStatement;
pub use statement::unprepared::Statement;
