//! Drives a single client request to completion against a query plan.

pub(crate) mod attempt;
pub(crate) mod request_handler;
