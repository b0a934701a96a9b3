//! Database row models and query parameter types.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    AdminInsights, Booking, BookingId, BookingStatus, Gender, HostelId, ReferenceCode, UserId,
};
use crate::error::StoreError;

/// Filter applied to booking listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookingFilter {
    /// Restrict to one owner.
    pub user_id: Option<UserId>,
    /// Restrict to one status.
    pub status: Option<BookingStatus>,
}

impl BookingFilter {
    /// Returns `true` if `booking` passes the filter.
    #[must_use]
    pub fn matches(&self, booking: &Booking) -> bool {
        self.user_id.is_none_or(|u| booking.user_id == u)
            && self.status.is_none_or(|s| booking.status == s)
    }
}

/// Page selector for list queries (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number, starting at 1.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
}

impl PageRequest {
    /// Number of items to skip.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }
}

/// One page of results plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Total number of matching items across all pages.
    pub total: u64,
}

/// A row from the `bookings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingRow {
    /// Primary key.
    pub id: Uuid,
    /// Reference code.
    pub reference: String,
    /// Owner.
    pub user_id: Uuid,
    /// Target hostel.
    pub hostel_id: Uuid,
    /// Hostel name snapshot.
    pub hostel_name: String,
    /// Requester name.
    pub name: String,
    /// Requester phone.
    pub phone: String,
    /// Gender discriminator (`MALE`, `FEMALE`, `OTHER`).
    pub gender: String,
    /// Requester address.
    pub address: String,
    /// Terms acceptance flag.
    pub terms_accepted: bool,
    /// Status discriminator.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<BookingStatus>()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let gender = row
            .gender
            .parse::<Gender>()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(Self {
            id: BookingId::from_uuid(row.id),
            reference: ReferenceCode::from_stored(row.reference),
            user_id: UserId::from_uuid(row.user_id),
            hostel_id: HostelId::from_uuid(row.hostel_id),
            hostel_name: row.hostel_name,
            name: row.name,
            phone: row.phone,
            gender,
            address: row.address,
            terms_accepted: row.terms_accepted,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// The sentinel row of the `admin_insights` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InsightsRow {
    /// Total bookings.
    pub total_bookings: i64,
    /// Confirmed bookings.
    pub confirmed_bookings: i64,
    /// Cancelled bookings.
    pub cancelled_bookings: i64,
    /// Total users.
    pub total_users: i64,
    /// Users created in the trailing month.
    pub new_users_this_month: i64,
    /// Available hostels.
    pub active_hostels: i64,
    /// Conversion rate percentage.
    pub conversion_rate: f64,
    /// Cancellation rate percentage.
    pub cancellation_rate: f64,
    /// Bookings per user.
    pub avg_bookings_per_user: f64,
    /// Trending hostel, if any.
    pub trending_hostel_id: Option<Uuid>,
    /// Listing requests in any status.
    pub listing_requests_total: i64,
    /// Pending listing requests.
    pub listing_requests_pending: i64,
    /// Rejected listing requests.
    pub listing_requests_rejected: i64,
    /// Computation timestamp.
    pub computed_at: DateTime<Utc>,
}

impl From<InsightsRow> for AdminInsights {
    fn from(row: InsightsRow) -> Self {
        Self {
            total_bookings: row.total_bookings,
            confirmed_bookings: row.confirmed_bookings,
            cancelled_bookings: row.cancelled_bookings,
            total_users: row.total_users,
            new_users_this_month: row.new_users_this_month,
            active_hostels: row.active_hostels,
            conversion_rate: row.conversion_rate,
            cancellation_rate: row.cancellation_rate,
            avg_bookings_per_user: row.avg_bookings_per_user,
            trending_hostel_id: row.trending_hostel_id.map(HostelId::from_uuid),
            listing_requests_total: row.listing_requests_total,
            listing_requests_pending: row.listing_requests_pending,
            listing_requests_rejected: row.listing_requests_rejected,
            computed_at: row.computed_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn row(status: &str) -> BookingRow {
        let now = Utc::now();
        BookingRow {
            id: Uuid::new_v4(),
            reference: "HB-20260101000000-ABC123".to_string(),
            user_id: Uuid::new_v4(),
            hostel_id: Uuid::new_v4(),
            hostel_name: "Harbour House".to_string(),
            name: "Ana".to_string(),
            phone: "+351912345678".to_string(),
            gender: "FEMALE".to_string(),
            address: "Rua Augusta 1".to_string(),
            terms_accepted: true,
            status: status.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn booking_row_converts() {
        let Ok(booking) = Booking::try_from(row("CONFIRMED")) else {
            panic!("conversion failed");
        };
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.gender, Gender::Female);
    }

    #[test]
    fn unknown_stored_status_is_a_database_error() {
        let result = Booking::try_from(row("COMPLETED"));
        assert!(matches!(result, Err(StoreError::Database(_))));
    }

    #[test]
    fn page_offset_is_zero_based() {
        assert_eq!(PageRequest { page: 1, per_page: 20 }.offset(), 0);
        assert_eq!(PageRequest { page: 3, per_page: 20 }.offset(), 40);
        assert_eq!(PageRequest { page: 0, per_page: 20 }.offset(), 0);
    }
}
