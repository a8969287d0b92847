//! Interfaces of the transport layer the driver core runs on.
//!
//! Opening, pooling and encoding frames on connections happens outside of this crate;
//! the core only needs to write a request and wait for the matching response.

mod connection;
mod connection_pool;

pub use connection::{Connection, ResponseHandle, ResponseHandler};
pub use connection_pool::ConnectionPool;
