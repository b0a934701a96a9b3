//! Admin-only handlers: generic booking update and insights.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::dto::{AdminUpdateBookingRequest, BookingDto, InsightsQuery, InsightsResponse};
use crate::api::extract::{CurrentActor, JsonBody, QueryParams};
use crate::app_state::AppState;
use crate::domain::BookingId;
use crate::error::{ApiError, ErrorResponse, ServiceError};
use crate::service::BookingPatch;

/// `PUT /admin/bookings/{id}` — Overwrite a booking's editable fields.
///
/// # Errors
///
/// Returns [`ApiError`] for non-admin callers, invalid fields, or a status
/// that would create a second active booking.
#[utoipa::path(
    put,
    path = "/api/v1/admin/bookings/{id}",
    tag = "Admin",
    summary = "Update a booking",
    description = "Administrator-only update of any mutable booking field. The reference code, owner, and hostel are never changed.",
    params(
        ("id" = uuid::Uuid, Path, description = "Booking UUID"),
    ),
    request_body = AdminUpdateBookingRequest,
    responses(
        (status = 200, description = "Updated booking", body = BookingDto),
        (status = 400, description = "Invalid field or duplicate active booking", body = ErrorResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
        (status = 403, description = "Administrator role required", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
    )
)]
pub async fn admin_update_booking(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    JsonBody(req): JsonBody<AdminUpdateBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let patch = BookingPatch::try_from(req).map_err(|e| state.reject(e))?;

    let booking = state
        .lifecycle
        .admin_update_booking(&actor, BookingId::from_uuid(id), &patch)
        .await
        .map_err(|e| state.reject(e))?;

    Ok(Json(BookingDto::from(booking)))
}

/// `GET /admin/insights` — Recompute and return admin insights.
///
/// # Errors
///
/// Returns [`ApiError`] for non-admin callers or if the insights cannot be
/// computed.
#[utoipa::path(
    get,
    path = "/api/v1/admin/insights",
    tag = "Admin",
    summary = "Admin insights",
    description = "Recomputes the insights snapshot, then returns it with the trailing-months history.",
    params(InsightsQuery),
    responses(
        (status = 200, description = "Insights snapshot and history", body = InsightsResponse),
        (status = 400, description = "Malformed query", body = ErrorResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
        (status = 403, description = "Administrator role required", body = ErrorResponse),
        (status = 500, description = "Insights unavailable", body = ErrorResponse),
    )
)]
pub async fn get_insights(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    QueryParams(query): QueryParams<InsightsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if !actor.is_admin() {
        return Err(state.reject(ServiceError::Forbidden("administrator role required")));
    }

    let report = state
        .insights
        .insights_report(query.months_back())
        .await
        .map_err(|e| state.reject(e))?;

    Ok(Json(InsightsResponse::from(report)))
}

/// Admin routes, nested under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/bookings/{id}", put(admin_update_booking))
        .route("/admin/insights", get(get_insights))
}
