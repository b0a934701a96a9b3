//! Booking handlers: create, list, get, status change, delete.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::dto::{
    BookingDto, BookingListQuery, BookingListResponse, CreateBookingRequest, PaginationMeta,
    PaginationParams, UpdateStatusRequest, parse_status,
};
use crate::api::extract::{CurrentActor, JsonBody, QueryParams};
use crate::app_state::AppState;
use crate::domain::{BookingId, UserId};
use crate::error::{ApiError, ErrorResponse};

/// `POST /bookings` — Create a booking for the caller.
///
/// # Errors
///
/// Returns [`ApiError`] on validation failure, unknown hostel, or an
/// existing active booking for the same hostel.
#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    tag = "Bookings",
    summary = "Create a booking",
    description = "Validates the request and records a PENDING booking. A user may hold at most one PENDING or CONFIRMED booking per hostel.",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = BookingDto),
        (status = 400, description = "Validation failure, malformed body, or duplicate booking", body = ErrorResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
        (status = 404, description = "Hostel not found", body = ErrorResponse),
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    JsonBody(req): JsonBody<CreateBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = state
        .admission
        .create_booking(&actor, req.into())
        .await
        .map_err(|e| state.reject(e))?;

    Ok((StatusCode::CREATED, Json(BookingDto::from(booking))))
}

/// `GET /bookings` — List the caller's bookings (all bookings for admins).
///
/// # Errors
///
/// Returns [`ApiError`] on an unknown status filter or store failure.
#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    tag = "Bookings",
    summary = "List bookings",
    description = "Returns the caller's bookings, newest first. Administrators see every booking and may filter by owner.",
    params(BookingListQuery, PaginationParams),
    responses(
        (status = 200, description = "Paginated booking list", body = BookingListResponse),
        (status = 400, description = "Unknown status filter or malformed query", body = ErrorResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
    )
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    QueryParams(filter): QueryParams<BookingListQuery>,
    QueryParams(params): QueryParams<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let status = filter
        .status
        .as_deref()
        .map(|raw| parse_status("status", raw))
        .transpose()
        .map_err(|e| state.reject(e))?;
    let request = params.clamped();

    let page = state
        .lifecycle
        .list_bookings(&actor, filter.user_id.map(UserId::from_uuid), status, request)
        .await
        .map_err(|e| state.reject(e))?;

    Ok(Json(BookingListResponse {
        data: page.items.into_iter().map(BookingDto::from).collect(),
        pagination: PaginationMeta::new(request, page.total),
    }))
}

/// `GET /bookings/{id}` — Get one booking.
///
/// # Errors
///
/// Returns [`ApiError`] if the booking does not exist or is not visible to
/// the caller.
#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    summary = "Get a booking",
    description = "Returns a booking owned by the caller. Administrators may read any booking.",
    params(
        ("id" = uuid::Uuid, Path, description = "Booking UUID"),
    ),
    responses(
        (status = 200, description = "Booking details", body = BookingDto),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
    )
)]
pub async fn get_booking(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = state
        .lifecycle
        .get_booking(&actor, BookingId::from_uuid(id))
        .await
        .map_err(|e| state.reject(e))?;

    Ok(Json(BookingDto::from(booking)))
}

/// `PATCH /bookings/{id}/status` — Change a booking's status.
///
/// # Errors
///
/// Returns [`ApiError`] if the transition is not permitted for the caller.
#[utoipa::path(
    patch,
    path = "/api/v1/bookings/{id}/status",
    tag = "Bookings",
    summary = "Change booking status",
    description = "Owners may cancel their own PENDING bookings. Administrators may set any status.",
    params(
        ("id" = uuid::Uuid, Path, description = "Booking UUID"),
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated booking", body = BookingDto),
        (status = 400, description = "Unknown status or invalid transition", body = ErrorResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
        (status = 403, description = "Caller may not make this change", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
    )
)]
pub async fn update_booking_status(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    JsonBody(req): JsonBody<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let target = parse_status("status", &req.status).map_err(|e| state.reject(e))?;

    let booking = state
        .lifecycle
        .update_status(&actor, BookingId::from_uuid(id), target)
        .await
        .map_err(|e| state.reject(e))?;

    Ok(Json(BookingDto::from(booking)))
}

/// `DELETE /bookings/{id}` — Delete a booking.
///
/// # Errors
///
/// Returns [`ApiError`] if the caller may not delete the booking in its
/// current state.
#[utoipa::path(
    delete,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    summary = "Delete a booking",
    description = "Owners may delete their own CANCELLED bookings. Administrators may delete any booking.",
    params(
        ("id" = uuid::Uuid, Path, description = "Booking UUID"),
    ),
    responses(
        (status = 204, description = "Booking deleted"),
        (status = 400, description = "Booking is not cancelled", body = ErrorResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
    )
)]
pub async fn delete_booking(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .lifecycle
        .delete_booking(&actor, BookingId::from_uuid(id))
        .await
        .map_err(|e| state.reject(e))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Booking routes, nested under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/{id}", get(get_booking).delete(delete_booking))
        .route("/bookings/{id}/status", patch(update_booking_status))
}
