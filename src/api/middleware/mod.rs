//! API middleware.
//!
//! CORS is applied by the router through `tower-http`; the audit logger
//! here runs innermost so it sees the final response status.

pub mod audit;
pub mod method;
