//! Booking DTOs for create, read, list, status, and admin update endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::PaginationMeta;
use crate::domain::{
    Booking, BookingId, BookingStatus, FieldError, Gender, HostelId, ReferenceCode, UserId,
};
use crate::error::ServiceError;
use crate::service::{BookingPatch, BookingRequest};

/// Request body for `POST /bookings`.
///
/// Text fields default to empty so that a missing field is reported as a
/// validation error alongside every other offending field.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    /// Hostel to book.
    pub hostel_id: HostelId,
    /// Hostel name as displayed to the user.
    #[serde(default)]
    pub hostel_name: Option<String>,
    /// Requester display name.
    #[serde(default)]
    pub name: String,
    /// Terms acceptance; must be `true`.
    #[serde(default)]
    pub terms: bool,
    /// Phone number: optional `+` followed by 1 to 15 digits.
    #[serde(default)]
    pub phone: String,
    /// `MALE`, `FEMALE`, or `OTHER` (case-insensitive).
    #[serde(default)]
    pub gender: String,
    /// Postal address.
    #[serde(default)]
    pub address: String,
}

impl From<CreateBookingRequest> for BookingRequest {
    fn from(req: CreateBookingRequest) -> Self {
        Self {
            hostel_id: req.hostel_id,
            hostel_name: req.hostel_name,
            name: req.name,
            terms: req.terms,
            phone: req.phone,
            gender: req.gender,
            address: req.address,
        }
    }
}

/// A booking as returned by every booking endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookingDto {
    /// Booking identifier.
    pub id: BookingId,
    /// Human-facing reference code.
    pub reference: ReferenceCode,
    /// Owning user.
    pub user_id: UserId,
    /// Booked hostel.
    pub hostel_id: HostelId,
    /// Hostel name at booking time.
    pub hostel_name: String,
    /// Requester name.
    pub name: String,
    /// Requester phone.
    pub phone: String,
    /// Requester gender.
    pub gender: Gender,
    /// Requester address.
    pub address: String,
    /// Terms acceptance flag.
    pub terms: bool,
    /// Lifecycle status.
    pub status: BookingStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingDto {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            reference: b.reference,
            user_id: b.user_id,
            hostel_id: b.hostel_id,
            hostel_name: b.hostel_name,
            name: b.name,
            phone: b.phone,
            gender: b.gender,
            address: b.address,
            terms: b.terms_accepted,
            status: b.status,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

/// Query parameters for `GET /bookings`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookingListQuery {
    /// Restrict to one status (`PENDING`, `CONFIRMED`, `CANCELLED`).
    pub status: Option<String>,
    /// Restrict to one owner. Honoured for administrators only.
    pub user_id: Option<uuid::Uuid>,
}

/// Paginated list response for `GET /bookings`.
#[derive(Debug, Serialize, ToSchema)]
pub struct BookingListResponse {
    /// Bookings on this page, newest first.
    pub data: Vec<BookingDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Request body for `PATCH /bookings/{id}/status`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// Target status.
    pub status: String,
}

/// Request body for `PUT /admin/bookings/{id}`. Absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AdminUpdateBookingRequest {
    /// New hostel name snapshot.
    #[serde(default)]
    pub hostel_name: Option<String>,
    /// New requester name.
    #[serde(default)]
    pub name: Option<String>,
    /// New phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// New gender.
    #[serde(default)]
    pub gender: Option<String>,
    /// New address.
    #[serde(default)]
    pub address: Option<String>,
    /// New status, applied without transition checks.
    #[serde(default)]
    pub status: Option<String>,
}

/// Parses a status string from a request, reporting it as a field error.
///
/// # Errors
///
/// [`ServiceError::Validation`] naming `field` when the value is not one
/// of the known statuses.
pub fn parse_status(field: &'static str, raw: &str) -> Result<BookingStatus, ServiceError> {
    raw.parse::<BookingStatus>().map_err(|e| {
        ServiceError::Validation(vec![FieldError {
            field: field.into(),
            message: e.to_string(),
        }])
    })
}

impl TryFrom<AdminUpdateBookingRequest> for BookingPatch {
    type Error = ServiceError;

    fn try_from(req: AdminUpdateBookingRequest) -> Result<Self, Self::Error> {
        let status = req
            .status
            .as_deref()
            .map(|raw| parse_status("status", raw))
            .transpose()?;
        Ok(Self {
            hostel_name: req.hostel_name,
            name: req.name,
            phone: req.phone,
            gender: req.gender,
            address: req.address,
            status,
        })
    }
}
