//! Appointment booking and cancellation.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, JsonBody, PathParam};
use crate::models::Appointment;
use crate::scheduling::{self, AppointmentRequest};

/// The updated appointment record, plus a flag for repeat cancels.
#[derive(Serialize)]
pub struct CancelResponse {
    #[serde(flatten)]
    pub appointment: Appointment,
    /// `true` when the appointment was cancelled by an earlier request.
    pub already_cancelled: bool,
}

/// `POST /api/appointments` — 409 when the slot is taken.
pub async fn book(
    State(ctx): State<ApiContext>,
    JsonBody(request): JsonBody<AppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    let appointment = ctx.store(|conn| scheduling::book_appointment(conn, &request))?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// `POST /api/appointments/:id/cancel` — repeat cancels succeed unchanged.
pub async fn cancel(
    State(ctx): State<ApiContext>,
    PathParam(appointment_id): PathParam<i64>,
) -> Result<Json<CancelResponse>, ApiError> {
    let outcome = ctx.store(|conn| scheduling::cancel_appointment(conn, appointment_id))?;
    let already_cancelled = outcome.was_already_cancelled();
    Ok(Json(CancelResponse {
        appointment: outcome.into_appointment(),
        already_cancelled,
    }))
}
