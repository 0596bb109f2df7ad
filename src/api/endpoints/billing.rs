//! Billing ledger endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, JsonBody};
use crate::billing::{self, BillingRecordInput, BillingSummary};
use crate::models::BillingRecord;

/// `GET /api/billing`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<BillingRecord>>, ApiError> {
    Ok(Json(ctx.store(billing::get_billing_records)?))
}

/// `POST /api/billing`
pub async fn create(
    State(ctx): State<ApiContext>,
    JsonBody(input): JsonBody<BillingRecordInput>,
) -> Result<(StatusCode, Json<BillingRecord>), ApiError> {
    let record = ctx.store(|conn| billing::create_billing_record(conn, &input))?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// `GET /api/billing/summary`
pub async fn summary(State(ctx): State<ApiContext>) -> Result<Json<BillingSummary>, ApiError> {
    Ok(Json(ctx.store(billing::get_billing_summary)?))
}
