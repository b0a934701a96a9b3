//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::error::{ApiError, ServiceError};
use crate::persistence::{BookingRepository, InsightsRepository};
use crate::service::{AdmissionService, InsightsAggregator, LifecycleController};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Booking admission.
    pub admission: Arc<AdmissionService>,
    /// Status changes, deletion, and reads.
    pub lifecycle: Arc<LifecycleController>,
    /// Admin insights.
    pub insights: Arc<InsightsAggregator>,
    /// Whether 5xx responses may carry internal details.
    pub expose_error_details: bool,
}

impl AppState {
    /// Wires every service to the given store.
    #[must_use]
    pub fn new<S>(store: Arc<S>, expose_error_details: bool) -> Self
    where
        S: BookingRepository + InsightsRepository + 'static,
    {
        Self {
            admission: Arc::new(AdmissionService::new(Arc::clone(&store) as _)),
            lifecycle: Arc::new(LifecycleController::new(Arc::clone(&store) as _)),
            insights: Arc::new(InsightsAggregator::new(store)),
            expose_error_details,
        }
    }

    /// Wraps `error` with this deployment's detail-exposure policy.
    #[must_use]
    pub fn reject(&self, error: ServiceError) -> ApiError {
        ApiError::new(error, self.expose_error_details)
    }
}
