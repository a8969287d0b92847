//! This module holds entities that allow users to communicate with the cluster:
//! the [Session](session::Session) and the [execution profiles](execution_profile)
//! that configure how its requests are executed.

pub mod execution_profile;
pub mod session;
