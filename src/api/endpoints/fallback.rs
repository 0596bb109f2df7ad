//! Fallback for unmatched `/api` paths.
//!
//! Portal screens that have no backing store yet still request their data.
//! Known path suffixes answer with an empty collection or document so the
//! client renders an empty state; everything else is a JSON 404.

use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::api::error::ApiError;

/// Answered with `[]`.
const EMPTY_COLLECTIONS: &[&str] = &[
    "notifications",
    "messages",
    "prescriptions",
    "reminders",
    "documents",
    "insurance-claims",
    "care-team",
];

/// Answered with `{}`.
const EMPTY_DOCUMENTS: &[&str] = &["profile", "settings", "preferences", "dashboard", "insurance"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Collection,
    Document,
}

/// Look up the placeholder shape for an unmatched API path.
pub fn placeholder_for(path: &str) -> Option<Placeholder> {
    let rest = path.strip_prefix("/api/")?;
    let suffix = rest.trim_end_matches('/').rsplit('/').next()?;
    if EMPTY_COLLECTIONS.contains(&suffix) {
        Some(Placeholder::Collection)
    } else if EMPTY_DOCUMENTS.contains(&suffix) {
        Some(Placeholder::Document)
    } else {
        None
    }
}

pub async fn handle(uri: Uri) -> Response {
    let path = uri.path();
    match placeholder_for(path) {
        Some(Placeholder::Collection) => (StatusCode::OK, Json(Value::Array(Vec::new()))).into_response(),
        Some(Placeholder::Document) => (StatusCode::OK, Json(json!({}))).into_response(),
        None => ApiError::NotFound(format!("No route for {path}")).into_response(),
    }
}
