//! Lab test-result endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, HistoryQuery, JsonBody, PathParam, QueryParams};
use crate::models::TestResult;
use crate::records::{self, TestResultInput};

/// `GET /api/test-results/names`
pub async fn names(State(ctx): State<ApiContext>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(ctx.store(records::get_test_result_names)?))
}

/// `GET /api/test-results/history/:name?patient_id=&limit=`
pub async fn history(
    State(ctx): State<ApiContext>,
    PathParam(test_name): PathParam<String>,
    QueryParams(query): QueryParams<HistoryQuery>,
) -> Result<Json<Vec<TestResult>>, ApiError> {
    let history = ctx.store(|conn| {
        records::get_test_result_history(conn, &test_name, query.patient_id, query.limit)
    })?;
    Ok(Json(history))
}

/// `POST /api/test-results`
pub async fn record(
    State(ctx): State<ApiContext>,
    JsonBody(input): JsonBody<TestResultInput>,
) -> Result<(StatusCode, Json<TestResult>), ApiError> {
    let result = ctx.store(|conn| records::record_test_result(conn, &input))?;
    Ok((StatusCode::CREATED, Json(result)))
}
