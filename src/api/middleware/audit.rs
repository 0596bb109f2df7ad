//! Audit logging middleware.
//!
//! Records every API request with its method, path and response status
//! in the `CoreState` audit buffer.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::ApiContext;
use crate::core_state::AccessSource;

/// Log API access for the audit trail.
/// Reads `ApiContext` from request extensions.
pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let ctx = req.extensions().get::<ApiContext>().cloned();

    let client = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let response = next.run(req).await;

    let status = response.status().as_u16();
    tracing::debug!(%method, %path, status, "API request");
    if let Some(ctx) = ctx {
        ctx.core.log_access(
            AccessSource::Api { client },
            &format!("{method} {path}"),
            &format!("status:{status}"),
        );
    }

    response
}
