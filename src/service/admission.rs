//! Booking admission: validates new requests and inserts them as `PENDING`.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;

use super::store_failure;
use crate::domain::validation::{
    validate_gender, validate_phone, validate_required, validate_terms,
};
use crate::domain::{
    Actor, Booking, BookingId, BookingStatus, FieldErrors, Gender, HostelId, ReferenceCode,
};
use crate::error::ServiceError;
use crate::persistence::BookingRepository;

/// Unvalidated booking request as submitted by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    /// Hostel to book.
    pub hostel_id: HostelId,
    /// Hostel name as displayed to the user; the stored name is used when
    /// absent or blank.
    pub hostel_name: Option<String>,
    /// Requester display name.
    pub name: String,
    /// Terms-acceptance flag; must be `true`.
    pub terms: bool,
    /// Phone number.
    pub phone: String,
    /// Gender, one of `MALE`, `FEMALE`, `OTHER`.
    pub gender: String,
    /// Postal address.
    pub address: String,
}

/// A request that passed every field check.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ValidRequest {
    hostel_id: HostelId,
    hostel_name: Option<String>,
    name: String,
    phone: String,
    gender: Gender,
    address: String,
}

/// Checks every field and reports all failures at once.
fn validate(request: &BookingRequest) -> Result<ValidRequest, ServiceError> {
    let mut errors = FieldErrors::new();

    let name = errors.check("name", validate_required(&request.name));
    let terms = errors.check("terms", validate_terms(request.terms));
    let phone = errors.check("phone", validate_phone(&request.phone));
    let gender = errors.check("gender", validate_gender(&request.gender));
    let address = errors.check("address", validate_required(&request.address));

    match (name, terms, phone, gender, address) {
        (Some(name), Some(_), Some(phone), Some(gender), Some(address)) if errors.is_empty() => {
            Ok(ValidRequest {
                hostel_id: request.hostel_id,
                hostel_name: request
                    .hostel_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
                name,
                phone,
                gender,
                address,
            })
        }
        _ => Err(ServiceError::Validation(errors.into_inner())),
    }
}

/// Admits new bookings, enforcing one active booking per (user, hostel).
///
/// The duplicate pre-check gives a friendly answer in the common case; the
/// store's uniqueness guarantee is what closes the race between two
/// concurrent requests, and its conflict maps to the same error.
#[derive(Clone)]
pub struct AdmissionService {
    bookings: Arc<dyn BookingRepository>,
}

impl fmt::Debug for AdmissionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionService").finish_non_exhaustive()
    }
}

impl AdmissionService {
    /// Creates a new `AdmissionService`.
    #[must_use]
    pub fn new(bookings: Arc<dyn BookingRepository>) -> Self {
        Self { bookings }
    }

    /// Validates and persists a new booking for `actor`.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Validation`] listing every offending field.
    /// - [`ServiceError::HostelNotFound`] if the hostel does not exist.
    /// - [`ServiceError::DuplicateBooking`] if the caller already has a
    ///   `PENDING` or `CONFIRMED` booking for the hostel.
    /// - [`ServiceError::Persistence`] on store failure.
    #[tracing::instrument(
        skip(self, request),
        fields(user_id = %actor.user_id, hostel_id = %request.hostel_id)
    )]
    pub async fn create_booking(
        &self,
        actor: &Actor,
        request: BookingRequest,
    ) -> Result<Booking, ServiceError> {
        let valid = validate(&request)?;

        let hostel = self
            .bookings
            .find_hostel(valid.hostel_id)
            .await
            .map_err(store_failure("find_hostel"))?
            .ok_or(ServiceError::HostelNotFound(valid.hostel_id))?;

        let existing = self
            .bookings
            .find_active_booking(actor.user_id, hostel.id)
            .await
            .map_err(store_failure("find_active_booking"))?;
        if existing.is_some() {
            tracing::info!("duplicate booking rejected");
            return Err(ServiceError::DuplicateBooking);
        }

        let now = Utc::now();
        let booking = Booking {
            id: BookingId::new(),
            reference: ReferenceCode::generate(now),
            user_id: actor.user_id,
            hostel_id: hostel.id,
            hostel_name: valid.hostel_name.unwrap_or(hostel.name),
            name: valid.name,
            phone: valid.phone,
            gender: valid.gender,
            address: valid.address,
            terms_accepted: true,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        self.bookings
            .insert_booking(&booking)
            .await
            .map_err(store_failure("insert_booking"))?;

        tracing::info!(
            booking_id = %booking.id,
            reference = %booking.reference,
            "booking created"
        );
        Ok(booking)
    }
}
