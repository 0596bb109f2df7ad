//! Doctor directory endpoints.

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, DateQuery, PathParam, QueryParams};
use crate::directory::{self, DoctorSearch};
use crate::models::Doctor;
use crate::scheduling::{self, Slot};

/// `GET /api/doctors?query=&specialty=`
pub async fn search(
    State(ctx): State<ApiContext>,
    QueryParams(search): QueryParams<DoctorSearch>,
) -> Result<Json<Vec<Doctor>>, ApiError> {
    Ok(Json(ctx.store(|conn| directory::search_doctors(conn, &search))?))
}

/// `GET /api/doctors/specialties`
pub async fn specialties(State(ctx): State<ApiContext>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(ctx.store(directory::get_specialties)?))
}

/// `GET /api/doctors/:id/slots?date=YYYY-MM-DD`
pub async fn slots(
    State(ctx): State<ApiContext>,
    PathParam(doctor_id): PathParam<i64>,
    QueryParams(query): QueryParams<DateQuery>,
) -> Result<Json<Vec<Slot>>, ApiError> {
    let date = query
        .date
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("date query parameter is required".into()))?;
    Ok(Json(ctx.store(|conn| scheduling::get_available_slots(conn, doctor_id, &date))?))
}
