//! Results of executed requests and the information gathered while executing them.

mod coordinator;
mod execution_info;
pub mod query_result;
mod request_response;

pub use coordinator::Coordinator;
pub use execution_info::ExecutionInfo;
pub use query_result::QueryResult;
pub use request_response::QueryResponse;
pub(crate) use request_response::NonErrorQueryResponse;
