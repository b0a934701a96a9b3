//! PostgreSQL implementation of the persistence ports.
//!
//! Duplicate prevention relies on the partial unique index
//! `bookings_one_active_per_user_hostel`; any insert or update that
//! violates it surfaces as [`StoreError::Conflict`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{BookingFilter, BookingRow, InsightsRow, Page, PageRequest};
use super::{BookingRepository, InsightsRepository, RunLease};
use crate::domain::insights::INSIGHTS_SENTINEL_ID;
use crate::domain::{
    AdminInsights, Booking, BookingId, BookingStatus, Hostel, HostelId, ListingRequestStatus,
    TimeWindow, UserId,
};
use crate::error::StoreError;

/// Advisory lock key serializing insights runs across instances.
const INSIGHTS_LOCK_KEY: i64 = 0x486f_7374_656c_4931;

const BOOKING_COLUMNS: &str = "id, reference, user_id, hostel_id, hostel_name, name, phone, \
     gender, address, terms_accepted, status, created_at, updated_at";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

fn into_booking(row: Option<BookingRow>) -> Result<Option<Booking>, StoreError> {
    row.map(Booking::try_from).transpose()
}

#[async_trait]
impl BookingRepository for PostgresStore {
    async fn find_hostel(&self, id: HostelId) -> Result<Option<Hostel>, StoreError> {
        let row = sqlx::query_as::<_, (Uuid, String, bool, DateTime<Utc>)>(
            "SELECT id, name, available, created_at FROM hostels WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, name, available, created_at)| Hostel {
            id: HostelId::from_uuid(id),
            name,
            available,
            created_at,
        }))
    }

    async fn find_active_booking(
        &self,
        user_id: UserId,
        hostel_id: HostelId,
    ) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE user_id = $1 AND hostel_id = $2 AND status IN ('PENDING', 'CONFIRMED') \
             LIMIT 1"
        ))
        .bind(user_id.as_uuid())
        .bind(hostel_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        into_booking(row)
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        ))
        .bind(booking.id.as_uuid())
        .bind(booking.reference.as_str())
        .bind(booking.user_id.as_uuid())
        .bind(booking.hostel_id.as_uuid())
        .bind(&booking.hostel_name)
        .bind(&booking.name)
        .bind(&booking.phone)
        .bind(booking.gender.as_str())
        .bind(&booking.address)
        .bind(booking.terms_accepted)
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_booking(&self, id: BookingId) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        into_booking(row)
    }

    async fn list_bookings(
        &self,
        filter: &BookingFilter,
        page: PageRequest,
    ) -> Result<Page<Booking>, StoreError> {
        let user_id = filter.user_id.map(Uuid::from);
        let status = filter.status.map(BookingStatus::as_str);
        let limit = i64::from(page.per_page);
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);

        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE ($1::uuid IS NULL OR user_id = $1) AND ($2::text IS NULL OR status = $2) \
             ORDER BY created_at DESC, id ASC LIMIT $3 OFFSET $4"
        ))
        .bind(user_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM bookings \
             WHERE ($1::uuid IS NULL OR user_id = $1) AND ($2::text IS NULL OR status = $2)",
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(Booking::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    async fn update_status(
        &self,
        id: BookingId,
        expected: Option<BookingStatus>,
        status: BookingStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "UPDATE bookings SET status = $1, updated_at = $2 \
             WHERE id = $3 AND ($4::text IS NULL OR status = $4) \
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(at)
        .bind(id.as_uuid())
        .bind(expected.map(BookingStatus::as_str))
        .fetch_optional(&self.pool)
        .await?;

        into_booking(row)
    }

    async fn replace_booking(&self, booking: &Booking) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "UPDATE bookings SET hostel_name = $1, name = $2, phone = $3, gender = $4, \
             address = $5, status = $6, updated_at = $7 \
             WHERE id = $8 RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(&booking.hostel_name)
        .bind(&booking.name)
        .bind(&booking.phone)
        .bind(booking.gender.as_str())
        .bind(&booking.address)
        .bind(booking.status.as_str())
        .bind(booking.updated_at)
        .bind(booking.id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        into_booking(row)
    }

    async fn delete_booking(
        &self,
        id: BookingId,
        expected: Option<BookingStatus>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "DELETE FROM bookings WHERE id = $1 AND ($2::text IS NULL OR status = $2)",
        )
        .bind(id.as_uuid())
        .bind(expected.map(BookingStatus::as_str))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl InsightsRepository for PostgresStore {
    async fn count_bookings(
        &self,
        status: Option<BookingStatus>,
        window: TimeWindow,
    ) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM bookings \
             WHERE ($1::text IS NULL OR status = $1) \
             AND ($2::timestamptz IS NULL OR created_at >= $2) \
             AND ($3::timestamptz IS NULL OR created_at < $3)",
        )
        .bind(status.map(BookingStatus::as_str))
        .bind(window.from)
        .bind(window.until)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_users(&self, window: TimeWindow) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users \
             WHERE ($1::timestamptz IS NULL OR created_at >= $1) \
             AND ($2::timestamptz IS NULL OR created_at < $2)",
        )
        .bind(window.from)
        .bind(window.until)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_available_hostels(&self) -> Result<i64, StoreError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM hostels WHERE available = TRUE")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn count_hostels(&self, window: TimeWindow) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM hostels \
             WHERE ($1::timestamptz IS NULL OR created_at >= $1) \
             AND ($2::timestamptz IS NULL OR created_at < $2)",
        )
        .bind(window.from)
        .bind(window.until)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn trending_hostel(&self, window: TimeWindow) -> Result<Option<HostelId>, StoreError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "SELECT hostel_id FROM bookings \
             WHERE ($1::timestamptz IS NULL OR created_at >= $1) \
             AND ($2::timestamptz IS NULL OR created_at < $2) \
             GROUP BY hostel_id \
             ORDER BY COUNT(*) DESC, MAX(created_at) DESC, hostel_id ASC \
             LIMIT 1",
        )
        .bind(window.from)
        .bind(window.until)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id.map(HostelId::from_uuid))
    }

    async fn count_listing_requests(
        &self,
        status: Option<ListingRequestStatus>,
    ) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM listing_requests WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status.map(ListingRequestStatus::as_str))
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn try_acquire_run_lock(&self) -> Result<Option<RunLease>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let acquired = sqlx::query_scalar::<_, bool>("SELECT pg_try_advisory_xact_lock($1)")
            .bind(INSIGHTS_LOCK_KEY)
            .fetch_one(&mut *tx)
            .await?;

        if acquired {
            Ok(Some(RunLease::held_by(tx)))
        } else {
            tx.rollback().await?;
            Ok(None)
        }
    }

    async fn upsert_insights(&self, insights: &AdminInsights) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO admin_insights (id, total_bookings, confirmed_bookings, \
             cancelled_bookings, total_users, new_users_this_month, active_hostels, \
             conversion_rate, cancellation_rate, avg_bookings_per_user, trending_hostel_id, \
             listing_requests_total, listing_requests_pending, listing_requests_rejected, \
             computed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             ON CONFLICT (id) DO UPDATE SET \
             total_bookings = EXCLUDED.total_bookings, \
             confirmed_bookings = EXCLUDED.confirmed_bookings, \
             cancelled_bookings = EXCLUDED.cancelled_bookings, \
             total_users = EXCLUDED.total_users, \
             new_users_this_month = EXCLUDED.new_users_this_month, \
             active_hostels = EXCLUDED.active_hostels, \
             conversion_rate = EXCLUDED.conversion_rate, \
             cancellation_rate = EXCLUDED.cancellation_rate, \
             avg_bookings_per_user = EXCLUDED.avg_bookings_per_user, \
             trending_hostel_id = EXCLUDED.trending_hostel_id, \
             listing_requests_total = EXCLUDED.listing_requests_total, \
             listing_requests_pending = EXCLUDED.listing_requests_pending, \
             listing_requests_rejected = EXCLUDED.listing_requests_rejected, \
             computed_at = EXCLUDED.computed_at \
             WHERE admin_insights.computed_at <= EXCLUDED.computed_at",
        )
        .bind(INSIGHTS_SENTINEL_ID)
        .bind(insights.total_bookings)
        .bind(insights.confirmed_bookings)
        .bind(insights.cancelled_bookings)
        .bind(insights.total_users)
        .bind(insights.new_users_this_month)
        .bind(insights.active_hostels)
        .bind(insights.conversion_rate)
        .bind(insights.cancellation_rate)
        .bind(insights.avg_bookings_per_user)
        .bind(insights.trending_hostel_id.map(Uuid::from))
        .bind(insights.listing_requests_total)
        .bind(insights.listing_requests_pending)
        .bind(insights.listing_requests_rejected)
        .bind(insights.computed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_insights(&self) -> Result<Option<AdminInsights>, StoreError> {
        let row = sqlx::query_as::<_, InsightsRow>(
            "SELECT total_bookings, confirmed_bookings, cancelled_bookings, total_users, \
             new_users_this_month, active_hostels, conversion_rate, cancellation_rate, \
             avg_bookings_per_user, trending_hostel_id, listing_requests_total, \
             listing_requests_pending, listing_requests_rejected, computed_at \
             FROM admin_insights WHERE id = $1",
        )
        .bind(INSIGHTS_SENTINEL_ID)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AdminInsights::from))
    }
}
