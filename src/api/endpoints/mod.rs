//! API endpoint handlers.
//!
//! One module per resource. Handlers parse the request, run a single store
//! operation through `ApiContext::store`, and map the result.

pub mod appointments;
pub mod billing;
pub mod doctors;
pub mod fallback;
pub mod health;
pub mod medications;
pub mod patient_updates;
pub mod patients;
pub mod summaries;
pub mod test_results;
