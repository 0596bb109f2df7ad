//! Visit summary archive.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, JsonBody, LimitQuery, QueryParams};
use crate::models::Summary;
use crate::records::{self, SavedSummary, SummaryInput};

/// `GET /api/summaries?limit=N`
pub async fn list(
    State(ctx): State<ApiContext>,
    QueryParams(query): QueryParams<LimitQuery>,
) -> Result<Json<Vec<Summary>>, ApiError> {
    Ok(Json(ctx.store(|conn| records::get_summaries(conn, query.limit))?))
}

/// `POST /api/summaries`
pub async fn save(
    State(ctx): State<ApiContext>,
    JsonBody(input): JsonBody<SummaryInput>,
) -> Result<(StatusCode, Json<SavedSummary>), ApiError> {
    let saved = ctx.store(|conn| records::save_summary(conn, &input))?;
    Ok((StatusCode::CREATED, Json(saved)))
}
