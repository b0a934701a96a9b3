//! In-process store backed by `tokio::sync::RwLock`.
//!
//! All tables live behind a single lock so the active-booking check and
//! the write that depends on it happen atomically, mirroring the partial
//! unique index of the PostgreSQL schema.

use std::cmp::Reverse;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::models::{BookingFilter, Page, PageRequest};
use super::{BookingRepository, InsightsRepository, RunLease};
use crate::domain::{
    AdminInsights, Booking, BookingId, BookingStatus, Hostel, HostelId, ListingRequest,
    ListingRequestStatus, TimeWindow, User, UserId,
};
use crate::error::StoreError;

#[derive(Debug, Default)]
struct Tables {
    bookings: HashMap<BookingId, Booking>,
    hostels: HashMap<HostelId, Hostel>,
    users: HashMap<UserId, User>,
    listing_requests: Vec<ListingRequest>,
    insights: Option<AdminInsights>,
}

impl Tables {
    /// Returns `true` if another active booking exists for the pair.
    fn has_active_conflict(&self, candidate: &Booking) -> bool {
        candidate.status.is_active()
            && self.bookings.values().any(|b| {
                b.id != candidate.id
                    && b.user_id == candidate.user_id
                    && b.hostel_id == candidate.hostel_id
                    && b.status.is_active()
            })
    }
}

/// Volatile store for tests and database-less runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a hostel.
    pub async fn insert_hostel(&self, hostel: Hostel) {
        self.tables.write().await.hostels.insert(hostel.id, hostel);
    }

    /// Adds or replaces a user.
    pub async fn insert_user(&self, user: User) {
        self.tables.write().await.users.insert(user.id, user);
    }

    /// Adds a listing request.
    pub async fn insert_listing_request(&self, request: ListingRequest) {
        self.tables.write().await.listing_requests.push(request);
    }

    /// Number of stored bookings.
    pub async fn booking_count(&self) -> usize {
        self.tables.read().await.bookings.len()
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn find_hostel(&self, id: HostelId) -> Result<Option<Hostel>, StoreError> {
        Ok(self.tables.read().await.hostels.get(&id).cloned())
    }

    async fn find_active_booking(
        &self,
        user_id: UserId,
        hostel_id: HostelId,
    ) -> Result<Option<Booking>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .values()
            .find(|b| b.user_id == user_id && b.hostel_id == hostel_id && b.status.is_active())
            .cloned())
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.has_active_conflict(booking) {
            return Err(StoreError::Conflict);
        }
        if tables.bookings.contains_key(&booking.id) {
            return Err(StoreError::Database(format!(
                "booking {} already exists",
                booking.id
            )));
        }
        tables.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn find_booking(&self, id: BookingId) -> Result<Option<Booking>, StoreError> {
        Ok(self.tables.read().await.bookings.get(&id).cloned())
    }

    async fn list_bookings(
        &self,
        filter: &BookingFilter,
        page: PageRequest,
    ) -> Result<Page<Booking>, StoreError> {
        let tables = self.tables.read().await;
        let mut matching: Vec<&Booking> = tables
            .bookings
            .values()
            .filter(|b| filter.matches(b))
            .collect();
        matching.sort_by_key(|b| (Reverse(b.created_at), b.id));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.per_page as usize)
            .cloned()
            .collect();

        Ok(Page { items, total })
    }

    async fn update_status(
        &self,
        id: BookingId,
        expected: Option<BookingStatus>,
        status: BookingStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Booking>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(current) = tables.bookings.get(&id) else {
            return Ok(None);
        };
        if expected.is_some_and(|s| s != current.status) {
            return Ok(None);
        }

        let mut updated = current.clone();
        updated.status = status;
        updated.updated_at = at;
        if tables.has_active_conflict(&updated) {
            return Err(StoreError::Conflict);
        }
        tables.bookings.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn replace_booking(&self, booking: &Booking) -> Result<Option<Booking>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(current) = tables.bookings.get(&booking.id) else {
            return Ok(None);
        };

        let updated = Booking {
            hostel_name: booking.hostel_name.clone(),
            name: booking.name.clone(),
            phone: booking.phone.clone(),
            gender: booking.gender,
            address: booking.address.clone(),
            status: booking.status,
            updated_at: booking.updated_at,
            ..current.clone()
        };
        if tables.has_active_conflict(&updated) {
            return Err(StoreError::Conflict);
        }
        tables.bookings.insert(updated.id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete_booking(
        &self,
        id: BookingId,
        expected: Option<BookingStatus>,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let removable = tables
            .bookings
            .get(&id)
            .is_some_and(|b| expected.is_none_or(|s| s == b.status));
        if removable {
            tables.bookings.remove(&id);
        }
        Ok(removable)
    }
}

#[async_trait]
impl InsightsRepository for MemoryStore {
    async fn count_bookings(
        &self,
        status: Option<BookingStatus>,
        window: TimeWindow,
    ) -> Result<i64, StoreError> {
        let tables = self.tables.read().await;
        let count = tables
            .bookings
            .values()
            .filter(|b| status.is_none_or(|s| b.status == s) && window.contains(b.created_at))
            .count();
        Ok(to_i64(count))
    }

    async fn count_users(&self, window: TimeWindow) -> Result<i64, StoreError> {
        let tables = self.tables.read().await;
        let count = tables
            .users
            .values()
            .filter(|u| window.contains(u.created_at))
            .count();
        Ok(to_i64(count))
    }

    async fn count_available_hostels(&self) -> Result<i64, StoreError> {
        let tables = self.tables.read().await;
        Ok(to_i64(tables.hostels.values().filter(|h| h.available).count()))
    }

    async fn count_hostels(&self, window: TimeWindow) -> Result<i64, StoreError> {
        let tables = self.tables.read().await;
        let count = tables
            .hostels
            .values()
            .filter(|h| window.contains(h.created_at))
            .count();
        Ok(to_i64(count))
    }

    async fn trending_hostel(&self, window: TimeWindow) -> Result<Option<HostelId>, StoreError> {
        let tables = self.tables.read().await;
        let mut tally: HashMap<HostelId, (usize, DateTime<Utc>)> = HashMap::new();
        for booking in tables
            .bookings
            .values()
            .filter(|b| window.contains(b.created_at))
        {
            let entry = tally
                .entry(booking.hostel_id)
                .or_insert((0, booking.created_at));
            entry.0 += 1;
            entry.1 = entry.1.max(booking.created_at);
        }

        Ok(tally
            .into_iter()
            .max_by_key(|(id, (count, latest))| (*count, *latest, Reverse(*id)))
            .map(|(id, _)| id))
    }

    async fn count_listing_requests(
        &self,
        status: Option<ListingRequestStatus>,
    ) -> Result<i64, StoreError> {
        let tables = self.tables.read().await;
        let count = tables
            .listing_requests
            .iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .count();
        Ok(to_i64(count))
    }

    async fn try_acquire_run_lock(&self) -> Result<Option<RunLease>, StoreError> {
        Ok(Some(RunLease::local()))
    }

    async fn upsert_insights(&self, insights: &AdminInsights) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables
            .insights
            .as_ref()
            .is_none_or(|stored| stored.computed_at <= insights.computed_at)
        {
            tables.insights = Some(insights.clone());
        }
        Ok(())
    }

    async fn load_insights(&self) -> Result<Option<AdminInsights>, StoreError> {
        Ok(self.tables.read().await.insights.clone())
    }
}

fn to_i64(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Gender, ReferenceCode};
    use chrono::Duration;

    fn booking(user_id: UserId, hostel_id: HostelId, status: BookingStatus) -> Booking {
        let now = Utc::now();
        Booking {
            id: BookingId::new(),
            reference: ReferenceCode::generate(now),
            user_id,
            hostel_id,
            hostel_name: "Harbour House".to_string(),
            name: "Ana".to_string(),
            phone: "+351912345678".to_string(),
            gender: Gender::Female,
            address: "Rua Augusta 1".to_string(),
            terms_accepted: true,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn second_active_insert_conflicts() {
        let store = MemoryStore::new();
        let (user, hostel) = (UserId::new(), HostelId::new());

        let first = store
            .insert_booking(&booking(user, hostel, BookingStatus::Pending))
            .await;
        assert!(first.is_ok());

        let second = store
            .insert_booking(&booking(user, hostel, BookingStatus::Pending))
            .await;
        assert_eq!(second, Err(StoreError::Conflict));
    }

    #[tokio::test]
    async fn cancelled_bookings_do_not_block_new_ones() {
        let store = MemoryStore::new();
        let (user, hostel) = (UserId::new(), HostelId::new());

        let old = booking(user, hostel, BookingStatus::Cancelled);
        assert!(store.insert_booking(&old).await.is_ok());
        assert!(
            store
                .insert_booking(&booking(user, hostel, BookingStatus::Pending))
                .await
                .is_ok()
        );

        // Reactivating the cancelled one would create a second active booking.
        let reactivated = store
            .update_status(old.id, None, BookingStatus::Pending, Utc::now())
            .await;
        assert_eq!(reactivated, Err(StoreError::Conflict));
    }

    #[tokio::test]
    async fn update_status_compares_expected() {
        let store = MemoryStore::new();
        let b = booking(UserId::new(), HostelId::new(), BookingStatus::Confirmed);
        assert!(store.insert_booking(&b).await.is_ok());

        let stale = store
            .update_status(
                b.id,
                Some(BookingStatus::Pending),
                BookingStatus::Cancelled,
                Utc::now(),
            )
            .await;
        assert_eq!(stale, Ok(None));

        let Ok(Some(updated)) = store
            .update_status(
                b.id,
                Some(BookingStatus::Confirmed),
                BookingStatus::Cancelled,
                Utc::now(),
            )
            .await
        else {
            panic!("expected update");
        };
        assert_eq!(updated.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn conditional_delete_respects_status() {
        let store = MemoryStore::new();
        let b = booking(UserId::new(), HostelId::new(), BookingStatus::Pending);
        assert!(store.insert_booking(&b).await.is_ok());

        assert_eq!(
            store
                .delete_booking(b.id, Some(BookingStatus::Cancelled))
                .await,
            Ok(false)
        );
        assert_eq!(store.delete_booking(b.id, None).await, Ok(true));
        assert_eq!(store.booking_count().await, 0);
    }

    #[tokio::test]
    async fn list_is_filtered_and_paginated_newest_first() {
        let store = MemoryStore::new();
        let user = UserId::new();
        for offset in 0..5 {
            let mut b = booking(user, HostelId::new(), BookingStatus::Pending);
            b.created_at = Utc::now() - Duration::minutes(offset);
            assert!(store.insert_booking(&b).await.is_ok());
        }
        assert!(
            store
                .insert_booking(&booking(
                    UserId::new(),
                    HostelId::new(),
                    BookingStatus::Pending
                ))
                .await
                .is_ok()
        );

        let filter = BookingFilter {
            user_id: Some(user),
            status: None,
        };
        let Ok(page) = store
            .list_bookings(&filter, PageRequest { page: 1, per_page: 2 })
            .await
        else {
            panic!("list failed");
        };
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        let [first, second] = page.items.as_slice() else {
            panic!("two items");
        };
        assert!(first.created_at >= second.created_at);
    }

    #[tokio::test]
    async fn trending_ties_prefer_most_recent_booking() {
        let store = MemoryStore::new();
        let (older, newer) = (HostelId::new(), HostelId::new());
        let now = Utc::now();

        let mut a = booking(UserId::new(), older, BookingStatus::Pending);
        a.created_at = now - Duration::days(3);
        let mut b = booking(UserId::new(), newer, BookingStatus::Pending);
        b.created_at = now - Duration::days(1);
        assert!(store.insert_booking(&a).await.is_ok());
        assert!(store.insert_booking(&b).await.is_ok());

        let window = TimeWindow::since(now - Duration::days(30));
        assert_eq!(store.trending_hostel(window).await, Ok(Some(newer)));
    }
}
