//! Patient endpoints: registration, login, and per-patient collections.
//!
//! `POST /api/patients/register`, `POST /api/patients/login`,
//! `GET /api/patients/:id/{appointments,payments,statements,updates}`,
//! `POST /api/patients/:id/{payments,statements}`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, JsonBody, PathParam};
use crate::billing::{self, PaymentInput, StatementInput};
use crate::directory::{self, PatientRegistration};
use crate::engagement;
use crate::error::StoreError;
use crate::models::*;
use crate::scheduling;

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Run a password derivation on the blocking pool, off the store lock.
async fn hash_off_thread<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(format!("Password hashing task failed: {e}")))?
        .map_err(ApiError::from)
}

/// `POST /api/patients/register`
pub async fn register(
    State(ctx): State<ApiContext>,
    JsonBody(registration): JsonBody<PatientRegistration>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let prepared = hash_off_thread(move || directory::prepare_registration(&registration)).await?;
    let patient = ctx.store(|conn| directory::insert_registration(conn, &prepared))?;
    Ok((StatusCode::CREATED, Json(patient)))
}

/// `POST /api/patients/login` — 401 on any credential miss.
pub async fn login(
    State(ctx): State<ApiContext>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<Patient>, ApiError> {
    let credentials = ctx.store(|conn| directory::lookup_credentials(conn, &req.username))?;
    let password = req.password;
    hash_off_thread(move || directory::check_credentials(credentials, &password))
        .await?
        .map(Json)
        .ok_or(ApiError::Unauthorized)
}

/// `GET /api/patients/:id/appointments`
pub async fn appointments(
    State(ctx): State<ApiContext>,
    PathParam(patient_id): PathParam<i64>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    Ok(Json(ctx.store(|conn| scheduling::get_appointments(conn, patient_id))?))
}

/// `GET /api/patients/:id/payments`
pub async fn payments(
    State(ctx): State<ApiContext>,
    PathParam(patient_id): PathParam<i64>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    Ok(Json(ctx.store(|conn| billing::get_patient_payments(conn, patient_id))?))
}

/// `POST /api/patients/:id/payments`
pub async fn record_payment(
    State(ctx): State<ApiContext>,
    PathParam(patient_id): PathParam<i64>,
    JsonBody(input): JsonBody<PaymentInput>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    let payment = ctx.store(|conn| billing::record_payment(conn, patient_id, &input))?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// `GET /api/patients/:id/statements`
pub async fn statements(
    State(ctx): State<ApiContext>,
    PathParam(patient_id): PathParam<i64>,
) -> Result<Json<Vec<Statement>>, ApiError> {
    Ok(Json(ctx.store(|conn| billing::get_patient_statements(conn, patient_id))?))
}

/// `POST /api/patients/:id/statements`
pub async fn issue_statement(
    State(ctx): State<ApiContext>,
    PathParam(patient_id): PathParam<i64>,
    JsonBody(input): JsonBody<StatementInput>,
) -> Result<(StatusCode, Json<Statement>), ApiError> {
    let statement = ctx.store(|conn| billing::issue_statement(conn, patient_id, &input))?;
    Ok((StatusCode::CREATED, Json(statement)))
}

/// `GET /api/patients/:id/updates`
pub async fn updates(
    State(ctx): State<ApiContext>,
    PathParam(patient_id): PathParam<i64>,
) -> Result<Json<Vec<PatientUpdate>>, ApiError> {
    Ok(Json(ctx.store(|conn| engagement::get_patient_updates(conn, patient_id))?))
}
