//! HTTP adapter over the clinic store.
//!
//! Each endpoint parses its path, query and body, runs one store operation
//! under the store lock, and maps the result or error kind to a status code.
//! No business rules live here.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server, ApiServer, ServerError};
pub use types::ApiContext;
