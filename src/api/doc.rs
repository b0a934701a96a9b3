//! OpenAPI document for the REST API.
//!
//! Served at `/api-docs/openapi.json` and, with the `swagger-ui` feature,
//! browsable at `/swagger-ui`.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::dto::{
    AdminUpdateBookingRequest, BookingDto, BookingListResponse, CreateBookingRequest,
    InsightsResponse, PaginationMeta, UpdateStatusRequest,
};
use super::extract::{USER_ID_HEADER, USER_ROLE_HEADER};
use super::handlers::system::HealthResponse;
use crate::domain::{AdminInsights, BookingStatus, FieldError, Gender, HistoricalDataPoint};
use crate::error::{ErrorBody, ErrorResponse};

/// Registers the upstream identity headers as security schemes.
#[derive(Debug)]
struct IdentityHeaders;

impl Modify for IdentityHeaders {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "UserId",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                USER_ID_HEADER,
                "Authenticated user id (UUID), set by the upstream gateway.",
            ))),
        );
        components.add_security_scheme(
            "UserRole",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                USER_ROLE_HEADER,
                "Caller role: `admin` or `user` (default).",
            ))),
        );
    }
}

/// OpenAPI document for the booking service.
#[derive(Debug, OpenApi)]
#[openapi(
    modifiers(&IdentityHeaders),
    info(
        title = "Hostel bookings API",
        description = "Booking admission, lifecycle control, and admin insights.",
        license(name = "MIT")
    ),
    security(("UserId" = [])),
    paths(
        crate::api::handlers::bookings::create_booking,
        crate::api::handlers::bookings::list_bookings,
        crate::api::handlers::bookings::get_booking,
        crate::api::handlers::bookings::update_booking_status,
        crate::api::handlers::bookings::delete_booking,
        crate::api::handlers::admin::admin_update_booking,
        crate::api::handlers::admin::get_insights,
        crate::api::handlers::system::health_handler,
    ),
    components(schemas(
        CreateBookingRequest,
        UpdateStatusRequest,
        AdminUpdateBookingRequest,
        BookingDto,
        BookingListResponse,
        PaginationMeta,
        InsightsResponse,
        AdminInsights,
        HistoricalDataPoint,
        BookingStatus,
        Gender,
        FieldError,
        ErrorResponse,
        ErrorBody,
        HealthResponse,
    )),
    tags(
        (name = "Bookings", description = "Create, read, cancel, and delete bookings"),
        (name = "Admin", description = "Administrator operations and insights"),
        (name = "System", description = "Liveness"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/bookings",
            "/api/v1/bookings/{id}",
            "/api/v1/bookings/{id}/status",
            "/api/v1/admin/bookings/{id}",
            "/api/v1/admin/insights",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing path {path}");
        }
    }

    #[test]
    fn identity_headers_are_registered() {
        let doc = ApiDoc::openapi();
        let Some(components) = doc.components.as_ref() else {
            panic!("components missing");
        };
        assert!(components.security_schemes.contains_key("UserId"));
        assert!(components.security_schemes.contains_key("UserRole"));
        assert!(components.schemas.contains_key("ErrorResponse"));
    }
}
