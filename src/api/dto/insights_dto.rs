//! Admin insights DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{AdminInsights, HistoricalDataPoint};
use crate::service::InsightsReport;
use crate::service::insights::{DEFAULT_HISTORY_MONTHS, MAX_HISTORY_MONTHS};

/// Query parameters for `GET /admin/insights`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InsightsQuery {
    /// Months of history to return (1 to 24, default 6).
    pub months: Option<u32>,
}

impl InsightsQuery {
    /// Requested history length clamped to `1..=24`.
    #[must_use]
    pub fn months_back(&self) -> u32 {
        self.months
            .unwrap_or(DEFAULT_HISTORY_MONTHS)
            .clamp(1, MAX_HISTORY_MONTHS)
    }
}

/// Response body for `GET /admin/insights`.
#[derive(Debug, Serialize, ToSchema)]
pub struct InsightsResponse {
    /// Freshly recomputed snapshot.
    pub snapshot: AdminInsights,
    /// Trailing calendar months, oldest first.
    pub history: Vec<HistoricalDataPoint>,
    /// When the response was generated.
    pub generated_at: DateTime<Utc>,
}

impl From<InsightsReport> for InsightsResponse {
    fn from(report: InsightsReport) -> Self {
        Self {
            snapshot: report.snapshot,
            history: report.history,
            generated_at: report.generated_at,
        }
    }
}
