//! Patient check-in endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, JsonBody, PathParam};
use crate::engagement::{self, PatientUpdateInput};
use crate::models::PatientUpdate;

/// `POST /api/patient-updates`
pub async fn create(
    State(ctx): State<ApiContext>,
    JsonBody(input): JsonBody<PatientUpdateInput>,
) -> Result<(StatusCode, Json<PatientUpdate>), ApiError> {
    let update = ctx.store(|conn| engagement::create_patient_update(conn, &input))?;
    Ok((StatusCode::CREATED, Json(update)))
}

/// `GET /api/patient-updates/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    PathParam(update_id): PathParam<i64>,
) -> Result<Json<PatientUpdate>, ApiError> {
    Ok(Json(ctx.store(|conn| engagement::get_update_by_id(conn, update_id))?))
}
