//! Read-only records owned by other parts of the platform.
//!
//! Hostels, users, and listing requests are written elsewhere; the booking
//! core only looks them up and counts them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{HostelId, ListingRequestId, UserId};

/// A hostel listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hostel {
    /// Hostel identifier.
    pub id: HostelId,
    /// Display name.
    pub name: String,
    /// Whether the hostel currently accepts bookings.
    pub available: bool,
    /// When the listing was created.
    pub created_at: DateTime<Utc>,
}

/// A registered user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
}

/// Review status of a "list my hostel" request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingRequestStatus {
    /// Not yet reviewed.
    Pending,
    /// Accepted and published.
    Approved,
    /// Declined.
    Rejected,
}

impl ListingRequestStatus {
    /// Returns the persisted string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

/// A request from a hostel owner to have their hostel listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingRequest {
    /// Request identifier.
    pub id: ListingRequestId,
    /// Review status.
    pub status: ListingRequestStatus,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}
