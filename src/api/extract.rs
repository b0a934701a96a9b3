//! Request extractors: caller identity and request payloads.
//!
//! Authentication is terminated upstream. The gateway in front of this
//! service forwards the caller as `x-user-id` (UUID) and an optional
//! `x-user-role` (`admin` or `user`, default `user`).
//!
//! Body and query extractors reject with [`ServiceError::Validation`], so a
//! malformed payload gets the same error body as a failed field rule.

use std::borrow::Cow;

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::http::{HeaderMap, header};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::domain::{Actor, FieldErrors, Role, UserId};
use crate::error::ServiceError;

/// Field name reported when a failure cannot be tied to one field.
pub const BODY_FIELD: &str = "body";

/// Field name reported for an undecodable query string.
pub const QUERY_FIELD: &str = "query";

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the caller role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Extractor yielding the [`Actor`] behind a request.
///
/// Rejects with [`ServiceError::Unauthenticated`] when the id header is
/// missing, not a UUID, or the role is unrecognised.
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Actor);

fn header_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

fn parse_role(raw: Option<&str>) -> Option<Role> {
    match raw.map(str::trim) {
        None => Some(Role::User),
        Some(r) if r.eq_ignore_ascii_case("user") => Some(Role::User),
        Some(r) if r.eq_ignore_ascii_case("admin") => Some(Role::Admin),
        Some(_) => None,
    }
}

impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_value(parts, USER_ID_HEADER)
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .map(UserId::from_uuid)
            .ok_or(ServiceError::Unauthenticated)?;

        let Some(role) = parse_role(header_value(parts, USER_ROLE_HEADER)) else {
            tracing::debug!(%user_id, "unrecognised role header");
            return Err(ServiceError::Unauthenticated);
        };

        Ok(Self(Actor { user_id, role }))
    }
}

fn field_error(field: impl Into<Cow<'static, str>>, message: impl Into<String>) -> ServiceError {
    let mut errors = FieldErrors::new();
    errors.push(field, message);
    ServiceError::Validation(errors.into_inner())
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::trim)
        .is_some_and(|mime| {
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
}

/// Drops serde_json's ` at line N column M` suffix.
fn reason(err: &serde_json::Error) -> String {
    let text = err.to_string();
    text.split(" at line ").next().unwrap_or_default().to_string()
}

fn missing_field(message: &str) -> Option<&str> {
    message.strip_prefix("missing field `")?.split('`').next()
}

fn path_error(err: &serde_path_to_error::Error<serde_json::Error>) -> ServiceError {
    let inner = err.inner();
    let message = reason(inner);
    if !inner.is_data() {
        return field_error(BODY_FIELD, message);
    }
    let path = err.path().to_string();
    let field = if path != "." {
        path
    } else if let Some(name) = missing_field(&message) {
        name.to_string()
    } else {
        BODY_FIELD.to_string()
    };
    field_error(field, message)
}

/// Decodes a JSON document, naming the offending field on failure.
///
/// # Errors
///
/// [`ServiceError::Validation`] with the serde path of the failing field,
/// the missing field's name, or [`BODY_FIELD`] for syntax errors.
pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ServiceError> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize(&mut de).map_err(|e| path_error(&e))?;
    de.end().map_err(|e| field_error(BODY_FIELD, reason(&e)))?;
    Ok(value)
}

/// JSON request body extractor.
///
/// Unlike `axum::Json`, a missing or mistyped field is reported as a
/// `400` validation error naming that field.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_json(req.headers()) {
            return Err(field_error(BODY_FIELD, "expected an application/json body"));
        }
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| field_error(BODY_FIELD, e.body_text()))?;
        decode_json(&bytes).map(Self)
    }
}

/// Query string extractor rejecting with a validation error.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(|e| field_error(QUERY_FIELD, e.body_text()))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct NewBooking {
        #[allow(dead_code)]
        hostel_id: Uuid,
        #[allow(dead_code)]
        terms: bool,
    }

    fn rejected_field(result: Result<NewBooking, ServiceError>) -> String {
        let Err(ServiceError::Validation(fields)) = result else {
            panic!("expected validation error");
        };
        let [field] = fields.as_slice() else {
            panic!("expected a single field error");
        };
        field.field.to_string()
    }

    async fn extract(headers: &[(&str, &str)]) -> Result<CurrentActor, ServiceError> {
        let mut builder = Request::builder().uri("/api/v1/bookings");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let Ok(request) = builder.body(()) else {
            panic!("valid request");
        };
        let (mut parts, ()) = request.into_parts();
        CurrentActor::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn missing_id_is_unauthenticated() {
        let result = extract(&[]).await;
        assert!(matches!(result, Err(ServiceError::Unauthenticated)));
    }

    #[tokio::test]
    async fn malformed_id_is_unauthenticated() {
        let result = extract(&[(USER_ID_HEADER, "not-a-uuid")]).await;
        assert!(matches!(result, Err(ServiceError::Unauthenticated)));
    }

    #[tokio::test]
    async fn role_defaults_to_user() {
        let id = Uuid::new_v4();
        let Ok(CurrentActor(actor)) = extract(&[(USER_ID_HEADER, &id.to_string())]).await else {
            panic!("extraction failed");
        };
        assert_eq!(actor.user_id, UserId::from_uuid(id));
        assert!(!actor.is_admin());
    }

    #[tokio::test]
    async fn admin_role_is_case_insensitive() {
        let id = Uuid::new_v4().to_string();
        let Ok(CurrentActor(actor)) =
            extract(&[(USER_ID_HEADER, &id), (USER_ROLE_HEADER, "Admin")]).await
        else {
            panic!("extraction failed");
        };
        assert!(actor.is_admin());
    }

    #[tokio::test]
    async fn unknown_role_is_rejected() {
        let id = Uuid::new_v4().to_string();
        let result = extract(&[(USER_ID_HEADER, &id), (USER_ROLE_HEADER, "root")]).await;
        assert!(matches!(result, Err(ServiceError::Unauthenticated)));
    }

    #[test]
    fn missing_field_is_named() {
        let result = decode_json::<NewBooking>(br#"{"terms": true}"#);
        assert_eq!(rejected_field(result), "hostel_id");
    }

    #[test]
    fn mistyped_field_is_named() {
        let body = format!(r#"{{"hostel_id": "{}", "terms": "yes"}}"#, Uuid::new_v4());
        let result = decode_json::<NewBooking>(body.as_bytes());
        assert_eq!(rejected_field(result), "terms");
    }

    #[test]
    fn malformed_json_is_a_body_error() {
        let result = decode_json::<NewBooking>(b"{\"terms\": tru");
        assert_eq!(rejected_field(result), BODY_FIELD);
    }

    #[test]
    fn trailing_garbage_is_a_body_error() {
        let body = format!(r#"{{"hostel_id": "{}", "terms": true}} x"#, Uuid::new_v4());
        let result = decode_json::<NewBooking>(body.as_bytes());
        assert_eq!(rejected_field(result), BODY_FIELD);
    }

    #[tokio::test]
    async fn non_json_content_type_is_rejected() {
        let Ok(request) = Request::builder()
            .method("POST")
            .uri("/api/v1/bookings")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("{}"))
        else {
            panic!("valid request");
        };
        let result = JsonBody::<NewBooking>::from_request(request, &()).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn bad_query_value_is_a_query_error() {
        #[derive(Debug, Deserialize)]
        struct Paging {
            #[allow(dead_code)]
            page: u32,
        }

        let Ok(request) = Request::builder().uri("/api/v1/bookings?page=abc").body(()) else {
            panic!("valid request");
        };
        let (mut parts, ()) = request.into_parts();
        let result = QueryParams::<Paging>::from_request_parts(&mut parts, &()).await;
        let Err(ServiceError::Validation(fields)) = result else {
            panic!("expected validation error");
        };
        assert!(fields.iter().any(|f| f.field == QUERY_FIELD));
    }
}
