//! Service error types with HTTP status code mapping.
//!
//! [`ServiceError`] is the central error type for the booking core. Each
//! variant maps to a specific HTTP status code and structured JSON error
//! response. Store adapters report [`StoreError`], which converts into
//! [`ServiceError`] at the service boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{BookingId, BookingStatus, FieldError, HostelId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid booking request",
///     "fields": [{ "field": "phone", "message": "..." }]
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see [`ServiceError`] code ranges).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Offending fields for validation failures.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
    /// Optional additional details (only outside production).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Failures reported by persistence adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The write would leave two active bookings for one (user, hostel).
    #[error("active booking already exists for this user and hostel")]
    Conflict,

    /// Connection, query, or decoding failure.
    #[error("database error: {0}")]
    Database(String),
}

/// Partial unique index enforcing one active booking per (user, hostel).
pub const ACTIVE_BOOKING_CONSTRAINT: &str = "bookings_one_active_per_user_hostel";

/// Only a violation of [`ACTIVE_BOOKING_CONSTRAINT`] is a booking conflict;
/// any other unique violation (e.g. a reference code collision) is a
/// database error.
fn is_active_booking_conflict(db: &dyn sqlx::error::DatabaseError) -> bool {
    db.is_unique_violation() && db.constraint() == Some(ACTIVE_BOOKING_CONSTRAINT)
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e
            && is_active_booking_conflict(db.as_ref())
        {
            return Self::Conflict;
        }
        Self::Database(e.to_string())
    }
}

/// Booking core error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category            | HTTP Status               |
/// |-----------|---------------------|---------------------------|
/// | 1000–1999 | Request / rules     | 400 Bad Request           |
/// | 2000–2999 | Identity            | 401 / 403                 |
/// | 3000–3999 | Not found           | 404 Not Found             |
/// | 5000–5999 | Server              | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// One or more request fields failed validation.
    #[error("invalid booking request")]
    Validation(Vec<FieldError>),

    /// The caller already holds an active booking for this hostel.
    #[error("you already have an active booking for this hostel")]
    DuplicateBooking,

    /// The requested status change is not allowed from the current status.
    #[error("cannot change booking status from {from} to {to}")]
    InvalidTransition {
        /// Status observed before the change.
        from: BookingStatus,
        /// Requested status.
        to: BookingStatus,
    },

    /// The booking is not in a state that permits the operation.
    #[error("booking must be {required} to be deleted (currently {actual})")]
    InvalidState {
        /// Status the operation requires.
        required: BookingStatus,
        /// Current status.
        actual: BookingStatus,
    },

    /// No caller identity was supplied.
    #[error("authentication required")]
    Unauthenticated,

    /// The caller is not allowed to perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    /// Booking does not exist (or is not visible to the caller).
    #[error("booking not found: {0}")]
    BookingNotFound(BookingId),

    /// Referenced hostel does not exist.
    #[error("hostel not found: {0}")]
    HostelNotFound(HostelId),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Insights could not be recomputed or loaded.
    #[error("insights unavailable")]
    InsightsUnavailable(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::InvalidTransition { .. } => 1101,
            Self::InvalidState { .. } => 1102,
            Self::DuplicateBooking => 1201,
            Self::Unauthenticated => 2001,
            Self::Forbidden(_) => 2002,
            Self::BookingNotFound(_) => 3001,
            Self::HostelNotFound(_) => 3002,
            Self::Internal(_) => 5000,
            Self::Persistence(_) => 5001,
            Self::InsightsUnavailable(_) => 5002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::DuplicateBooking
            | Self::InvalidTransition { .. }
            | Self::InvalidState { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BookingNotFound(_) | Self::HostelNotFound(_) => StatusCode::NOT_FOUND,
            Self::Persistence(_) | Self::InsightsUnavailable(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Builds the client-facing body.
    ///
    /// Server-side failures never leak their internal message; the detail is
    /// attached only when `expose_details` is set (non-production).
    #[must_use]
    pub fn to_body(&self, expose_details: bool) -> ErrorResponse {
        let (message, details) = match self {
            Self::Persistence(detail) | Self::Internal(detail) => (
                "internal server error".to_string(),
                expose_details.then(|| detail.clone()),
            ),
            Self::InsightsUnavailable(detail) => {
                (self.to_string(), expose_details.then(|| detail.clone()))
            }
            other => (other.to_string(), None),
        };
        let fields = match self {
            Self::Validation(fields) => fields.clone(),
            _ => Vec::new(),
        };
        ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message,
                fields,
                details,
            },
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict => Self::DuplicateBooking,
            StoreError::Database(message) => Self::Persistence(message),
        }
    }
}

/// A [`ServiceError`] paired with the detail-exposure policy of the running
/// deployment. Handlers return this so the response body honours
/// `EXPOSE_ERROR_DETAILS`.
#[derive(Debug)]
pub struct ApiError {
    /// Underlying error.
    pub error: ServiceError,
    /// Whether internal details may be shown to the client.
    pub expose_details: bool,
}

impl ApiError {
    /// Wraps `error` with the given exposure policy.
    #[must_use]
    pub const fn new(error: ServiceError, expose_details: bool) -> Self {
        Self {
            error,
            expose_details,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let mut response = axum::Json(self.error.to_body(self.expose_details)).into_response();
        *response.status_mut() = status;
        response
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        ApiError::new(self, false).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as StdError;
    use std::fmt;

    use super::*;

    #[derive(Debug)]
    struct UniqueViolation(&'static str);

    impl fmt::Display for UniqueViolation {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "duplicate key value violates unique constraint {:?}", self.0)
        }
    }

    impl StdError for UniqueViolation {}

    impl sqlx::error::DatabaseError for UniqueViolation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn constraint(&self) -> Option<&str> {
            Some(self.0)
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }
    }

    fn store_error(constraint: &'static str) -> StoreError {
        StoreError::from(sqlx::Error::Database(Box::new(UniqueViolation(constraint))))
    }

    #[test]
    fn only_the_active_booking_index_is_a_conflict() {
        assert_eq!(store_error(ACTIVE_BOOKING_CONSTRAINT), StoreError::Conflict);
        assert!(matches!(
            store_error("bookings_reference_key"),
            StoreError::Database(_)
        ));
    }

    #[test]
    fn rule_violations_are_bad_requests() {
        assert_eq!(
            ServiceError::DuplicateBooking.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::InvalidState {
                required: BookingStatus::Cancelled,
                actual: BookingStatus::Pending,
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Forbidden("not yours").status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn store_conflict_maps_to_duplicate_booking() {
        let err = ServiceError::from(StoreError::Conflict);
        assert!(matches!(err, ServiceError::DuplicateBooking));
    }

    #[test]
    fn persistence_detail_is_hidden_unless_exposed() {
        let err = ServiceError::Persistence("connection refused on 10.0.0.4".to_string());
        let hidden = err.to_body(false);
        assert_eq!(hidden.error.message, "internal server error");
        assert!(hidden.error.details.is_none());

        let shown = err.to_body(true);
        assert_eq!(
            shown.error.details.as_deref(),
            Some("connection refused on 10.0.0.4")
        );
    }

    #[test]
    fn insights_failure_uses_generic_message() {
        let body = ServiceError::InsightsUnavailable("timeout".to_string()).to_body(false);
        assert_eq!(body.error.message, "insights unavailable");
        assert_eq!(body.error.code, 5002);
    }

    #[test]
    fn validation_body_lists_fields() {
        let err = ServiceError::Validation(vec![FieldError {
            field: "phone".into(),
            message: "bad".to_string(),
        }]);
        let body = err.to_body(false);
        assert_eq!(body.error.fields.len(), 1);
    }
}
