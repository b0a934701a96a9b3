//! Persistence layer: ports consumed by the booking core and their adapters.
//!
//! The services only see the [`BookingRepository`] and
//! [`InsightsRepository`] traits. Two adapters implement both:
//! [`postgres::PostgresStore`] (`sqlx::PgPool`) for deployments and
//! [`memory::MemoryStore`] for tests and database-less local runs.
//!
//! Adapters own the race-free guarantees: an insert or update that would
//! leave two active bookings for one (user, hostel) pair must fail with
//! [`StoreError::Conflict`], and conditional updates must compare-and-set
//! on the expected status.

pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};

pub use models::{BookingFilter, Page, PageRequest};

use crate::domain::{
    AdminInsights, Booking, BookingId, BookingStatus, Hostel, HostelId, ListingRequestStatus,
    TimeWindow, UserId,
};
use crate::error::StoreError;

/// Booking reads and writes plus the hostel lookup admission needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Looks up a hostel by id.
    async fn find_hostel(&self, id: HostelId) -> Result<Option<Hostel>, StoreError>;

    /// Returns the active (`PENDING` or `CONFIRMED`) booking for the pair,
    /// if any.
    async fn find_active_booking(
        &self,
        user_id: UserId,
        hostel_id: HostelId,
    ) -> Result<Option<Booking>, StoreError>;

    /// Inserts a new booking.
    ///
    /// Fails with [`StoreError::Conflict`] if the pair already has an
    /// active booking.
    async fn insert_booking(&self, booking: &Booking) -> Result<(), StoreError>;

    /// Looks up a booking by id.
    async fn find_booking(&self, id: BookingId) -> Result<Option<Booking>, StoreError>;

    /// Lists bookings matching `filter`, newest first.
    async fn list_bookings(
        &self,
        filter: &BookingFilter,
        page: PageRequest,
    ) -> Result<Page<Booking>, StoreError>;

    /// Sets the status of a booking.
    ///
    /// When `expected` is `Some`, the write only happens if the stored
    /// status still equals it. Returns `None` when no row was written.
    async fn update_status(
        &self,
        id: BookingId,
        expected: Option<BookingStatus>,
        status: BookingStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Booking>, StoreError>;

    /// Overwrites the mutable fields of an existing booking with the
    /// values in `booking`. Id, reference, owner, hostel, and creation time
    /// are never written. Returns `None` when the booking does not exist.
    async fn replace_booking(&self, booking: &Booking) -> Result<Option<Booking>, StoreError>;

    /// Hard-deletes a booking, optionally only if its status equals
    /// `expected`. Returns `true` if a row was removed.
    async fn delete_booking(
        &self,
        id: BookingId,
        expected: Option<BookingStatus>,
    ) -> Result<bool, StoreError>;
}

/// Exclusive right to run an insights recomputation across instances.
///
/// A PostgreSQL lease holds a transaction-scoped advisory lock; the lock is
/// released when the lease is released or dropped, since dropping the
/// transaction rolls it back.
pub struct RunLease {
    tx: Option<Transaction<'static, Postgres>>,
}

impl RunLease {
    /// A lease for stores without cross-instance contention.
    #[must_use]
    pub fn local() -> Self {
        Self { tx: None }
    }

    /// A lease whose lock lives as long as `tx`.
    #[must_use]
    pub fn held_by(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Releases the lock.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the rollback fails. The lock is
    /// released by the server when the connection closes regardless.
    pub async fn release(self) -> Result<(), StoreError> {
        if let Some(tx) = self.tx {
            tx.rollback().await?;
        }
        Ok(())
    }
}

impl fmt::Debug for RunLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunLease")
            .field("cross_instance", &self.tx.is_some())
            .finish()
    }
}

/// Aggregate reads over bookings, users, hostels, and listing requests, and
/// the single insights row.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InsightsRepository: Send + Sync {
    /// Counts bookings created in `window`, optionally of one status.
    async fn count_bookings(
        &self,
        status: Option<BookingStatus>,
        window: TimeWindow,
    ) -> Result<i64, StoreError>;

    /// Counts users created in `window`.
    async fn count_users(&self, window: TimeWindow) -> Result<i64, StoreError>;

    /// Counts hostels currently flagged as available.
    async fn count_available_hostels(&self) -> Result<i64, StoreError>;

    /// Counts hostels created in `window`.
    async fn count_hostels(&self, window: TimeWindow) -> Result<i64, StoreError>;

    /// Returns the hostel with the most bookings created in `window`.
    ///
    /// Ties go to the hostel whose latest booking in the window is most
    /// recent, then to the smallest hostel id.
    async fn trending_hostel(&self, window: TimeWindow) -> Result<Option<HostelId>, StoreError>;

    /// Counts listing requests, optionally of one status.
    async fn count_listing_requests(
        &self,
        status: Option<ListingRequestStatus>,
    ) -> Result<i64, StoreError>;

    /// Takes the cross-instance run lock without waiting.
    ///
    /// Returns `None` when another process holds it.
    async fn try_acquire_run_lock(&self) -> Result<Option<RunLease>, StoreError>;

    /// Inserts or fully replaces the sentinel insights row.
    ///
    /// A snapshot older than the stored one is ignored, so a slow run never
    /// overwrites a newer result.
    async fn upsert_insights(&self, insights: &AdminInsights) -> Result<(), StoreError>;

    /// Loads the sentinel insights row.
    async fn load_insights(&self) -> Result<Option<AdminInsights>, StoreError>;
}
