//! Booking lifecycle: status transitions, deletion, caller-scoped reads, and
//! the privileged admin edit path.
//!
//! | From      | To        | Actor           |
//! |-----------|-----------|-----------------|
//! | PENDING   | CONFIRMED | admin           |
//! | PENDING   | CANCELLED | admin or owner  |
//! | CONFIRMED | CANCELLED | admin           |
//! | any       | any       | admin override  |
//!
//! Owners may delete their own bookings only once `CANCELLED`; admins may
//! delete any booking.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;

use super::store_failure;
use crate::domain::validation::{validate_gender, validate_phone, validate_required};
use crate::domain::{Actor, Booking, BookingId, BookingStatus, FieldErrors, UserId};
use crate::error::ServiceError;
use crate::persistence::{BookingFilter, BookingRepository, Page, PageRequest};

/// Fields an admin may overwrite through the generic update path.
///
/// Absent fields are left unchanged. The reference code, owner, hostel, and
/// creation time are never editable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingPatch {
    /// New hostel name snapshot.
    pub hostel_name: Option<String>,
    /// New requester name.
    pub name: Option<String>,
    /// New phone number.
    pub phone: Option<String>,
    /// New gender.
    pub gender: Option<String>,
    /// New address.
    pub address: Option<String>,
    /// New status, written without transition checks.
    pub status: Option<BookingStatus>,
}

impl BookingPatch {
    /// Validates the present fields and applies them to `booking`.
    fn apply_to(&self, booking: &mut Booking) -> Result<(), ServiceError> {
        let mut errors = FieldErrors::new();

        if let Some(raw) = &self.hostel_name
            && let Some(value) = errors.check("hostel_name", validate_required(raw))
        {
            booking.hostel_name = value;
        }
        if let Some(raw) = &self.name
            && let Some(value) = errors.check("name", validate_required(raw))
        {
            booking.name = value;
        }
        if let Some(raw) = &self.phone
            && let Some(value) = errors.check("phone", validate_phone(raw))
        {
            booking.phone = value;
        }
        if let Some(raw) = &self.gender
            && let Some(value) = errors.check("gender", validate_gender(raw))
        {
            booking.gender = value;
        }
        if let Some(raw) = &self.address
            && let Some(value) = errors.check("address", validate_required(raw))
        {
            booking.address = value;
        }
        if let Some(status) = self.status {
            booking.status = status;
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(errors.into_inner()))
        }
    }
}

/// Decides whether `actor` may move `booking` to `target`.
///
/// Returns the status the write must compare against: `Some(current)` for
/// guarded user transitions, `None` for the unrestricted admin override.
fn authorize_transition(
    actor: &Actor,
    booking: &Booking,
    target: BookingStatus,
) -> Result<Option<BookingStatus>, ServiceError> {
    if actor.is_admin() {
        return Ok(None);
    }
    if target != BookingStatus::Cancelled {
        return Err(ServiceError::Forbidden(
            "only administrators may confirm or reopen bookings",
        ));
    }
    if !booking.is_owned_by(actor.user_id) {
        return Err(ServiceError::Forbidden("booking belongs to another user"));
    }
    if booking.status != BookingStatus::Pending {
        return Err(ServiceError::InvalidTransition {
            from: booking.status,
            to: target,
        });
    }
    Ok(Some(BookingStatus::Pending))
}

/// Decides whether `actor` may delete `booking`.
///
/// Returns the status the delete must compare against.
fn authorize_delete(
    actor: &Actor,
    booking: &Booking,
) -> Result<Option<BookingStatus>, ServiceError> {
    if actor.is_admin() {
        return Ok(None);
    }
    if !booking.is_owned_by(actor.user_id) {
        return Err(ServiceError::Forbidden("booking belongs to another user"));
    }
    if booking.status != BookingStatus::Cancelled {
        return Err(ServiceError::InvalidState {
            required: BookingStatus::Cancelled,
            actual: booking.status,
        });
    }
    Ok(Some(BookingStatus::Cancelled))
}

/// Governs status changes, deletions, and reads of existing bookings.
#[derive(Clone)]
pub struct LifecycleController {
    bookings: Arc<dyn BookingRepository>,
}

impl fmt::Debug for LifecycleController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleController").finish_non_exhaustive()
    }
}

impl LifecycleController {
    /// Creates a new `LifecycleController`.
    #[must_use]
    pub fn new(bookings: Arc<dyn BookingRepository>) -> Self {
        Self { bookings }
    }

    async fn load(&self, id: BookingId) -> Result<Booking, ServiceError> {
        self.bookings
            .find_booking(id)
            .await
            .map_err(store_failure("find_booking"))?
            .ok_or(ServiceError::BookingNotFound(id))
    }

    /// Moves a booking to `target`.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::BookingNotFound`] if the booking does not exist.
    /// - [`ServiceError::Forbidden`] if a non-admin targets anything but
    ///   `CANCELLED` or someone else's booking.
    /// - [`ServiceError::InvalidTransition`] if a non-admin's booking is no
    ///   longer `PENDING` (including a concurrent change).
    /// - [`ServiceError::DuplicateBooking`] if an admin reactivation would
    ///   create a second active booking for the pair.
    #[tracing::instrument(skip(self), fields(actor_id = %actor.user_id))]
    pub async fn update_status(
        &self,
        actor: &Actor,
        id: BookingId,
        target: BookingStatus,
    ) -> Result<Booking, ServiceError> {
        let booking = self.load(id).await?;
        let expected = authorize_transition(actor, &booking, target)?;

        let updated = self
            .bookings
            .update_status(id, expected, target, Utc::now())
            .await
            .map_err(store_failure("update_status"))?;

        match updated {
            Some(updated) => {
                tracing::info!(from = %booking.status, to = %target, "booking status changed");
                Ok(updated)
            }
            // The row changed or vanished between the read and the write.
            None => {
                let current = self.load(id).await?;
                Err(ServiceError::InvalidTransition {
                    from: current.status,
                    to: target,
                })
            }
        }
    }

    /// Permanently removes a booking.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::BookingNotFound`] if the booking does not exist.
    /// - [`ServiceError::Forbidden`] if the caller is neither owner nor admin.
    /// - [`ServiceError::InvalidState`] if a non-admin owner's booking is not
    ///   `CANCELLED`.
    #[tracing::instrument(skip(self), fields(actor_id = %actor.user_id))]
    pub async fn delete_booking(&self, actor: &Actor, id: BookingId) -> Result<(), ServiceError> {
        let booking = self.load(id).await?;
        let expected = authorize_delete(actor, &booking)?;

        let removed = self
            .bookings
            .delete_booking(id, expected)
            .await
            .map_err(store_failure("delete_booking"))?;

        if removed {
            tracing::info!(status = %booking.status, "booking deleted");
            return Ok(());
        }

        let current = self.load(id).await?;
        Err(ServiceError::InvalidState {
            required: BookingStatus::Cancelled,
            actual: current.status,
        })
    }

    /// Returns one booking visible to `actor`.
    ///
    /// Bookings owned by other users are reported as not found.
    ///
    /// # Errors
    ///
    /// [`ServiceError::BookingNotFound`] or [`ServiceError::Persistence`].
    pub async fn get_booking(&self, actor: &Actor, id: BookingId) -> Result<Booking, ServiceError> {
        let booking = self.load(id).await?;
        if actor.is_admin() || booking.is_owned_by(actor.user_id) {
            Ok(booking)
        } else {
            Err(ServiceError::BookingNotFound(id))
        }
    }

    /// Lists the caller's own bookings, or every booking for admins.
    ///
    /// `owner` narrows an admin listing to one user and is ignored for
    /// regular users.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Persistence`] on store failure.
    pub async fn list_bookings(
        &self,
        actor: &Actor,
        owner: Option<UserId>,
        status: Option<BookingStatus>,
        page: PageRequest,
    ) -> Result<Page<Booking>, ServiceError> {
        let user_id = if actor.is_admin() {
            owner
        } else {
            Some(actor.user_id)
        };
        let filter = BookingFilter { user_id, status };

        self.bookings
            .list_bookings(&filter, page)
            .await
            .map_err(store_failure("list_bookings"))
    }

    /// Admin-only generic update of a booking's mutable fields.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Forbidden`] for non-admins.
    /// - [`ServiceError::Validation`] if a present field is invalid.
    /// - [`ServiceError::BookingNotFound`] if the booking does not exist.
    /// - [`ServiceError::DuplicateBooking`] if the new status would create a
    ///   second active booking for the pair.
    #[tracing::instrument(skip(self, patch), fields(actor_id = %actor.user_id))]
    pub async fn admin_update_booking(
        &self,
        actor: &Actor,
        id: BookingId,
        patch: &BookingPatch,
    ) -> Result<Booking, ServiceError> {
        if !actor.is_admin() {
            return Err(ServiceError::Forbidden("administrator role required"));
        }

        let mut booking = self.load(id).await?;
        patch.apply_to(&mut booking)?;
        booking.updated_at = Utc::now();

        let updated = self
            .bookings
            .replace_booking(&booking)
            .await
            .map_err(store_failure("replace_booking"))?
            .ok_or(ServiceError::BookingNotFound(id))?;

        tracing::info!(status = %updated.status, "booking updated by admin");
        Ok(updated)
    }
}
