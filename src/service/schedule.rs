//! Monthly insights refresh.
//!
//! A single background task sleeps until 00:00 UTC on the first day of the
//! next calendar month, refreshes the snapshot, and repeats. Failed runs are
//! logged and the loop keeps going.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use tokio::task::JoinHandle;

use super::InsightsAggregator;

/// Fallback delay when the next month boundary cannot be computed.
const FALLBACK_DELAY: std::time::Duration = std::time::Duration::from_secs(24 * 60 * 60);

/// Returns 00:00 UTC on the first day of the month after `now`.
#[must_use]
pub fn next_month_start(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(now.year(), now.month(), 1)?
        .checked_add_months(Months::new(1))?
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc())
}

/// Time to sleep from `now` until the next month boundary.
fn delay_until_next_run(now: DateTime<Utc>) -> std::time::Duration {
    next_month_start(now)
        .and_then(|next| (next - now).to_std().ok())
        .unwrap_or(FALLBACK_DELAY)
}

/// Runs one scheduled refresh, skipping if a run is already in flight.
pub async fn run_scheduled(aggregator: &InsightsAggregator) {
    match aggregator.try_recompute_snapshot().await {
        Ok(Some(snapshot)) => {
            tracing::info!(computed_at = %snapshot.computed_at, "scheduled insights run complete");
        }
        Ok(None) => tracing::info!("scheduled insights run skipped, another run in flight"),
        Err(e) => tracing::error!(error = %e, "scheduled insights run failed"),
    }
}

/// Spawns the monthly refresh loop.
///
/// The first run happens at the next month boundary; startup population is
/// the caller's job.
pub fn spawn_monthly_refresh(aggregator: Arc<InsightsAggregator>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let delay = delay_until_next_run(Utc::now());
            tracing::debug!(delay_secs = delay.as_secs(), "next insights run scheduled");
            tokio::time::sleep(delay).await;
            run_scheduled(&aggregator).await;
        }
    })
}
