//! Admin insights: the cached snapshot row and the trailing-months series.
//!
//! Every run recomputes all metrics from scratch and upserts the sentinel
//! row as its last step, so a failed run leaves the previous snapshot in
//! place.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Months, Utc};
use tokio::sync::Mutex;

use crate::domain::insights::{percentage, ratio, trailing_months};
use crate::domain::{
    AdminInsights, BookingStatus, HistoricalDataPoint, ListingRequestStatus, TimeWindow,
};
use crate::error::{ServiceError, StoreError};
use crate::persistence::InsightsRepository;

/// Number of months returned when the caller does not ask for a range.
pub const DEFAULT_HISTORY_MONTHS: u32 = 6;

/// Largest accepted history range.
pub const MAX_HISTORY_MONTHS: u32 = 24;

/// Trailing window used to pick the trending hostel.
const TRENDING_WINDOW_DAYS: i64 = 30;

/// Snapshot, series, and generation time returned to admins.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightsReport {
    /// The freshly recomputed snapshot as stored.
    pub snapshot: AdminInsights,
    /// Trailing months, oldest first.
    pub history: Vec<HistoricalDataPoint>,
    /// When this report was assembled.
    pub generated_at: DateTime<Utc>,
}

fn unavailable(operation: &'static str) -> impl FnOnce(StoreError) -> ServiceError {
    move |e| {
        tracing::error!(operation, error = %e, "insights query failed");
        ServiceError::InsightsUnavailable(e.to_string())
    }
}

/// Computes and caches admin insights.
///
/// Clones share one run lock, so at most one recomputation is in flight per
/// process.
#[derive(Clone)]
pub struct InsightsAggregator {
    store: Arc<dyn InsightsRepository>,
    run_lock: Arc<Mutex<()>>,
}

impl fmt::Debug for InsightsAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsightsAggregator").finish_non_exhaustive()
    }
}

impl InsightsAggregator {
    /// Creates a new `InsightsAggregator`.
    #[must_use]
    pub fn new(store: Arc<dyn InsightsRepository>) -> Self {
        Self {
            store,
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Recomputes and stores the snapshot, waiting for any in-flight run in
    /// this process.
    ///
    /// When another instance holds the cross-instance run lock, its run is
    /// left to finish and the stored snapshot is returned.
    ///
    /// # Errors
    ///
    /// [`ServiceError::InsightsUnavailable`] if any query or the upsert
    /// fails. The stored snapshot is untouched in that case.
    pub async fn recompute_snapshot(&self) -> Result<AdminInsights, ServiceError> {
        let _guard = self.run_lock.lock().await;
        if let Some(snapshot) = self.compute_and_store(Utc::now()).await? {
            return Ok(snapshot);
        }
        self.store
            .load_insights()
            .await
            .map_err(unavailable("load_insights"))?
            .ok_or_else(|| {
                ServiceError::InsightsUnavailable("no insights snapshot stored".to_string())
            })
    }

    /// Recomputes the snapshot unless another run is in flight, here or in
    /// another instance.
    ///
    /// Returns `Ok(None)` when the run was skipped.
    ///
    /// # Errors
    ///
    /// [`ServiceError::InsightsUnavailable`] as for
    /// [`recompute_snapshot`](Self::recompute_snapshot).
    pub async fn try_recompute_snapshot(&self) -> Result<Option<AdminInsights>, ServiceError> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            tracing::debug!("insights run already in flight, skipping");
            return Ok(None);
        };
        self.compute_and_store(Utc::now()).await
    }

    /// Computes and stores the snapshot as of `now` under the cross-instance
    /// run lock. Returns `None` if another instance holds it.
    ///
    /// Callers must hold the process run lock.
    #[tracing::instrument(skip(self))]
    async fn compute_and_store(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<AdminInsights>, ServiceError> {
        let Some(lease) = self
            .store
            .try_acquire_run_lock()
            .await
            .map_err(unavailable("try_acquire_run_lock"))?
        else {
            tracing::info!("insights run held by another instance, skipping");
            return Ok(None);
        };

        let snapshot = self.compute(now).await?;
        self.store
            .upsert_insights(&snapshot)
            .await
            .map_err(unavailable("upsert_insights"))?;

        if let Err(e) = lease.release().await {
            tracing::warn!(error = %e, "failed to release insights run lock");
        }

        tracing::info!(
            total_bookings = snapshot.total_bookings,
            total_users = snapshot.total_users,
            conversion_rate = snapshot.conversion_rate,
            "insights snapshot refreshed"
        );
        Ok(Some(snapshot))
    }

    async fn compute(&self, now: DateTime<Utc>) -> Result<AdminInsights, ServiceError> {
        let all = TimeWindow::all();
        let month_ago = now
            .checked_sub_months(Months::new(1))
            .ok_or_else(|| ServiceError::Internal("date out of range".to_string()))?;
        let trending_since = now - Duration::days(TRENDING_WINDOW_DAYS);

        let store = &self.store;
        let (
            total_bookings,
            confirmed_bookings,
            cancelled_bookings,
            total_users,
            new_users_this_month,
            active_hostels,
            trending_hostel_id,
        ) = tokio::try_join!(
            store.count_bookings(None, all),
            store.count_bookings(Some(BookingStatus::Confirmed), all),
            store.count_bookings(Some(BookingStatus::Cancelled), all),
            store.count_users(all),
            store.count_users(TimeWindow::since(month_ago)),
            store.count_available_hostels(),
            store.trending_hostel(TimeWindow::since(trending_since)),
        )
        .map_err(unavailable("snapshot_counts"))?;

        let (listing_requests_total, listing_requests_pending, listing_requests_rejected) =
            tokio::try_join!(
                store.count_listing_requests(None),
                store.count_listing_requests(Some(ListingRequestStatus::Pending)),
                store.count_listing_requests(Some(ListingRequestStatus::Rejected)),
            )
            .map_err(unavailable("listing_request_counts"))?;

        Ok(AdminInsights {
            total_bookings,
            confirmed_bookings,
            cancelled_bookings,
            total_users,
            new_users_this_month,
            active_hostels,
            conversion_rate: percentage(confirmed_bookings, total_bookings),
            cancellation_rate: percentage(cancelled_bookings, total_bookings),
            avg_bookings_per_user: ratio(total_bookings, total_users),
            trending_hostel_id,
            listing_requests_total,
            listing_requests_pending,
            listing_requests_rejected,
            computed_at: now,
        })
    }

    /// Returns the trailing `months_back` calendar months, oldest first.
    ///
    /// # Errors
    ///
    /// [`ServiceError::InsightsUnavailable`] if any query fails.
    pub async fn historical_series(
        &self,
        months_back: u32,
    ) -> Result<Vec<HistoricalDataPoint>, ServiceError> {
        self.historical_series_at(Utc::now(), months_back).await
    }

    /// [`historical_series`](Self::historical_series) as of `now`.
    ///
    /// # Errors
    ///
    /// [`ServiceError::InsightsUnavailable`] if any query fails.
    pub async fn historical_series_at(
        &self,
        now: DateTime<Utc>,
        months_back: u32,
    ) -> Result<Vec<HistoricalDataPoint>, ServiceError> {
        let months = trailing_months(now, months_back)
            .ok_or_else(|| ServiceError::Internal("date out of range".to_string()))?;

        let mut series = Vec::with_capacity(months.len());
        for month in months {
            let window = month.window;
            let (bookings, confirmed, cancelled, new_users, new_hostels) = tokio::try_join!(
                self.store.count_bookings(None, window),
                self.store.count_bookings(Some(BookingStatus::Confirmed), window),
                self.store.count_bookings(Some(BookingStatus::Cancelled), window),
                self.store.count_users(window),
                self.store.count_hostels(window),
            )
            .map_err(unavailable("historical_series"))?;

            series.push(HistoricalDataPoint {
                month: month.label(),
                year: month.first_day.year(),
                bookings,
                confirmed,
                cancelled,
                new_users,
                new_hostels,
                conversion_rate: percentage(confirmed, bookings),
            });
        }
        Ok(series)
    }

    /// Recomputes the snapshot and assembles the admin report.
    ///
    /// # Errors
    ///
    /// [`ServiceError::InsightsUnavailable`] if recomputation, loading the
    /// stored snapshot, or the series fails.
    #[tracing::instrument(skip(self))]
    pub async fn insights_report(&self, months_back: u32) -> Result<InsightsReport, ServiceError> {
        self.recompute_snapshot().await?;

        let snapshot = self
            .store
            .load_insights()
            .await
            .map_err(unavailable("load_insights"))?
            .ok_or_else(|| {
                ServiceError::InsightsUnavailable("no insights snapshot stored".to_string())
            })?;

        let generated_at = Utc::now();
        let history = self.historical_series_at(generated_at, months_back).await?;

        Ok(InsightsReport {
            snapshot,
            history,
            generated_at,
        })
    }
}
