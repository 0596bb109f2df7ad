//! Medication timeline endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, JsonBody, PatientFilter, QueryParams};
use crate::models::MedicationEntry;
use crate::records::{self, MedicationInput};

/// `GET /api/medications/timeline?patient_id=`
pub async fn timeline(
    State(ctx): State<ApiContext>,
    QueryParams(filter): QueryParams<PatientFilter>,
) -> Result<Json<Vec<MedicationEntry>>, ApiError> {
    Ok(Json(ctx.store(|conn| records::get_medications_timeline(conn, filter.patient_id))?))
}

/// `POST /api/medications`
pub async fn record(
    State(ctx): State<ApiContext>,
    JsonBody(input): JsonBody<MedicationInput>,
) -> Result<(StatusCode, Json<MedicationEntry>), ApiError> {
    let entry = ctx.store(|conn| records::record_medication(conn, &input))?;
    Ok((StatusCode::CREATED, Json(entry)))
}
