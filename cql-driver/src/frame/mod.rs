//! The subset of the CQL protocol model that the driver core reads and writes.
//!
//! Encoding these types into frames is the job of [`Connection`](crate::network::Connection)
//! implementations; here they are plain Rust values.

pub mod request;
pub mod response;
pub mod types;
pub mod value;
