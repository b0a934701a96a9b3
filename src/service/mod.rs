//! Service layer: booking admission, lifecycle control, and insights.
//!
//! Services hold only `Arc`s to the persistence ports and are cheap to
//! clone. Every business-rule violation is returned as a typed
//! [`ServiceError`]; store failures are logged here, with the operation
//! name, before they are surfaced.

pub mod admission;
pub mod insights;
pub mod lifecycle;
pub mod schedule;

#[cfg(test)]
mod fixtures;

pub use admission::{AdmissionService, BookingRequest};
pub use insights::{InsightsAggregator, InsightsReport};
pub use lifecycle::{BookingPatch, LifecycleController};

use crate::error::{ServiceError, StoreError};

/// Maps a store failure to a [`ServiceError`], logging database errors.
///
/// Conflicts are business outcomes and are not logged as failures.
pub(crate) fn store_failure(operation: &'static str) -> impl FnOnce(StoreError) -> ServiceError {
    move |e| {
        if let StoreError::Database(message) = &e {
            tracing::error!(operation, error = %message, "persistence failure");
        }
        ServiceError::from(e)
    }
}
