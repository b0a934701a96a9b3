//! Admin insights snapshot and historical rollup types.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::HostelId;

/// Fixed primary key of the single persisted insights row.
pub const INSIGHTS_SENTINEL_ID: i32 = 1;

/// Aggregate metrics cached in the single insights row.
///
/// This is a cache of derived values and is replaced wholesale on every
/// recomputation. It is never a source of truth for individual bookings.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AdminInsights {
    /// Number of bookings in any status.
    pub total_bookings: i64,
    /// Number of `CONFIRMED` bookings.
    pub confirmed_bookings: i64,
    /// Number of `CANCELLED` bookings.
    pub cancelled_bookings: i64,
    /// Number of registered users.
    pub total_users: i64,
    /// Users created within the trailing month.
    pub new_users_this_month: i64,
    /// Hostels currently flagged as available.
    pub active_hostels: i64,
    /// `confirmed / total * 100`, zero when there are no bookings.
    pub conversion_rate: f64,
    /// `cancelled / total * 100`, zero when there are no bookings.
    pub cancellation_rate: f64,
    /// `total_bookings / total_users`, zero when there are no users.
    pub avg_bookings_per_user: f64,
    /// Hostel with the most bookings over the trailing 30 days.
    pub trending_hostel_id: Option<HostelId>,
    /// Number of listing requests in any status.
    pub listing_requests_total: i64,
    /// Listing requests awaiting review.
    pub listing_requests_pending: i64,
    /// Listing requests that were declined.
    pub listing_requests_rejected: i64,
    /// When this snapshot was computed.
    pub computed_at: DateTime<Utc>,
}

/// Bookings, users, and hostels created within one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HistoricalDataPoint {
    /// Three-letter month label, e.g. `"Mar"`.
    pub month: String,
    /// Calendar year.
    pub year: i32,
    /// Bookings created in the month.
    pub bookings: i64,
    /// Of those, currently `CONFIRMED`.
    pub confirmed: i64,
    /// Of those, currently `CANCELLED`.
    pub cancelled: i64,
    /// Users created in the month.
    pub new_users: i64,
    /// Hostels created in the month.
    pub new_hostels: i64,
    /// `confirmed / bookings * 100`, zero when there are no bookings.
    pub conversion_rate: f64,
}

/// Half-open time interval `[from, until)`; `None` bounds are unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeWindow {
    /// Inclusive lower bound.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound.
    pub until: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// The unbounded window.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            from: None,
            until: None,
        }
    }

    /// Everything at or after `from`.
    #[must_use]
    pub const fn since(from: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            until: None,
        }
    }

    /// Everything in `[from, until)`.
    #[must_use]
    pub const fn between(from: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            until: Some(until),
        }
    }

    /// Returns `true` if `at` falls inside the window.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| at >= from) && self.until.is_none_or(|until| at < until)
    }
}

/// One calendar month in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    /// First day of the month.
    pub first_day: NaiveDate,
    /// `[first day, first day of next month)`.
    pub window: TimeWindow,
}

impl MonthWindow {
    /// Returns the three-letter month label.
    #[must_use]
    pub fn label(&self) -> String {
        self.first_day.format("%b").to_string()
    }
}

/// Returns the trailing `months_back` calendar months ending with the month
/// containing `now`, oldest first.
///
/// Returns `None` only if the calendar arithmetic leaves chrono's range.
#[must_use]
pub fn trailing_months(now: DateTime<Utc>, months_back: u32) -> Option<Vec<MonthWindow>> {
    let current = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)?;
    (0..months_back)
        .rev()
        .map(|offset| {
            let first_day = current.checked_sub_months(Months::new(offset))?;
            let next = first_day.checked_add_months(Months::new(1))?;
            Some(MonthWindow {
                first_day,
                window: TimeWindow::between(
                    first_day.and_hms_opt(0, 0, 0)?.and_utc(),
                    next.and_hms_opt(0, 0, 0)?.and_utc(),
                ),
            })
        })
        .collect()
}

/// `part / total * 100`, or zero when `total` is zero.
#[must_use]
pub fn percentage(part: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let rate = part as f64 / total as f64 * 100.0;
    rate
}

/// `numerator / denominator`, or zero when `denominator` is zero.
#[must_use]
pub fn ratio(numerator: i64, denominator: i64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let value = numerator as f64 / denominator as f64;
    value
}
