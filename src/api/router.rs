//! API router.
//!
//! Returns a composable `Router` with every endpoint under `/api/`.
//!
//! Layer stack (outermost → innermost):
//! 1. CORS → 2. `Extension<ApiContext>` → 3. Audit logger → 4. JSON 405 → Handler

use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>`; endpoint handlers use
/// `State<ApiContext>` provided via `with_state`.
pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        // Directory
        .route("/patients/register", post(endpoints::patients::register))
        .route("/patients/login", post(endpoints::patients::login))
        .route("/doctors", get(endpoints::doctors::search))
        .route("/doctors/specialties", get(endpoints::doctors::specialties))
        // Scheduling
        .route("/doctors/:id/slots", get(endpoints::doctors::slots))
        .route("/appointments", post(endpoints::appointments::book))
        .route("/appointments/:id/cancel", post(endpoints::appointments::cancel))
        .route(
            "/patients/:id/appointments",
            get(endpoints::patients::appointments),
        )
        // Billing
        .route(
            "/billing",
            get(endpoints::billing::list).post(endpoints::billing::create),
        )
        .route("/billing/summary", get(endpoints::billing::summary))
        .route(
            "/patients/:id/payments",
            get(endpoints::patients::payments).post(endpoints::patients::record_payment),
        )
        .route(
            "/patients/:id/statements",
            get(endpoints::patients::statements).post(endpoints::patients::issue_statement),
        )
        // Clinical records
        .route(
            "/summaries",
            get(endpoints::summaries::list).post(endpoints::summaries::save),
        )
        .route("/medications", post(endpoints::medications::record))
        .route("/medications/timeline", get(endpoints::medications::timeline))
        .route("/test-results", post(endpoints::test_results::record))
        .route("/test-results/names", get(endpoints::test_results::names))
        .route(
            "/test-results/history/:name",
            get(endpoints::test_results::history),
        )
        // Engagement
        .route("/patient-updates", post(endpoints::patient_updates::create))
        .route("/patient-updates/:id", get(endpoints::patient_updates::detail))
        .route("/patients/:id/updates", get(endpoints::patients::updates))
        .with_state(ctx.clone());

    Router::new()
        .nest("/api", api)
        .fallback(endpoints::fallback::handle)
        .layer(axum::middleware::map_response(
            middleware::method::json_method_not_allowed,
        ))
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        // Extension must sit outside the audit layer so it can read ApiContext
        .layer(axum::Extension(ctx))
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}
