//! Shared test fixtures for the service layer.

use std::sync::Arc;

use chrono::Utc;

use super::{AdmissionService, BookingRequest, InsightsAggregator, LifecycleController};
use crate::domain::{Hostel, HostelId, User, UserId};
use crate::persistence::memory::MemoryStore;

/// Services wired to one in-memory store, with a seeded hostel and users.
pub(crate) struct Fixture {
    pub store: Arc<MemoryStore>,
    pub admission: AdmissionService,
    pub lifecycle: LifecycleController,
    pub insights: InsightsAggregator,
    pub hostel: HostelId,
    pub alice: UserId,
    pub bob: UserId,
    pub admin: UserId,
}

impl Fixture {
    pub(crate) async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let hostel = HostelId::new();
        store
            .insert_hostel(Hostel {
                id: hostel,
                name: "Harbour House".to_string(),
                available: true,
                created_at: Utc::now(),
            })
            .await;

        let (alice, bob, admin) = (UserId::new(), UserId::new(), UserId::new());
        for id in [alice, bob, admin] {
            store
                .insert_user(User {
                    id,
                    created_at: Utc::now(),
                })
                .await;
        }

        Self {
            admission: AdmissionService::new(Arc::clone(&store) as _),
            lifecycle: LifecycleController::new(Arc::clone(&store) as _),
            insights: InsightsAggregator::new(Arc::clone(&store) as _),
            store,
            hostel,
            alice,
            bob,
            admin,
        }
    }
}

/// A request that passes every validation rule.
pub(crate) fn booking_request(hostel_id: HostelId) -> BookingRequest {
    BookingRequest {
        hostel_id,
        hostel_name: None,
        name: "Ana Silva".to_string(),
        terms: true,
        phone: "+919876543210".to_string(),
        gender: "FEMALE".to_string(),
        address: "12 Harbour Road".to_string(),
    }
}
