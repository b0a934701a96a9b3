//! Booking aggregate: status, requester details, and reference code.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{BookingId, HostelId, UserId};

/// Lifecycle status of a booking.
///
/// `PENDING` and `CONFIRMED` are "active": at most one active booking may
/// exist per (user, hostel). `CANCELLED` is terminal except for deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Awaiting an admin decision.
    Pending,
    /// Accepted by an admin.
    Confirmed,
    /// Withdrawn by the owner or cancelled by an admin.
    Cancelled,
}

impl BookingStatus {
    /// Returns the persisted string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Returns `true` for `PENDING` and `CONFIRMED`.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown enumeration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    /// Name of the enumeration being parsed.
    pub kind: &'static str,
    /// Rejected input.
    pub value: String,
}

impl FromStr for BookingStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(UnknownVariant {
                kind: "booking status",
                value: s.to_string(),
            }),
        }
    }
}

/// Gender declared by the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    /// Male.
    Male,
    /// Female.
    Female,
    /// Any other answer.
    Other,
}

impl Gender {
    /// Returns the persisted string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
            Self::Other => "OTHER",
        }
    }
}

impl FromStr for Gender {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MALE" => Ok(Self::Male),
            "FEMALE" => Ok(Self::Female),
            "OTHER" => Ok(Self::Other),
            _ => Err(UnknownVariant {
                kind: "gender",
                value: s.to_string(),
            }),
        }
    }
}

/// Human-readable booking reference shown to users.
///
/// Format: `HB-<YYYYMMDDHHMMSS>-<6 uppercase alphanumerics>`, derived from
/// the creation time. Assigned once at admission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ReferenceCode(String);

impl ReferenceCode {
    /// Prefix shared by every reference code.
    pub const PREFIX: &'static str = "HB";

    const SUFFIX_LEN: usize = 6;

    /// Generates a new reference code for a booking created at `at`.
    #[must_use]
    pub fn generate(at: DateTime<Utc>) -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(Self::SUFFIX_LEN)
            .map(|b| char::from(b).to_ascii_uppercase())
            .collect();
        Self(format!(
            "{}-{}-{suffix}",
            Self::PREFIX,
            at.format("%Y%m%d%H%M%S")
        ))
    }

    /// Rehydrates a stored reference code.
    #[must_use]
    pub fn from_stored(value: String) -> Self {
        Self(value)
    }

    /// Borrows the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferenceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One user's request to reserve a hostel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Booking {
    /// Unique booking identifier.
    pub id: BookingId,
    /// Reference code shown to the user (immutable).
    pub reference: ReferenceCode,
    /// Owning user.
    pub user_id: UserId,
    /// Target hostel.
    pub hostel_id: HostelId,
    /// Hostel name at the time of booking.
    pub hostel_name: String,
    /// Requester display name.
    pub name: String,
    /// Requester phone number.
    pub phone: String,
    /// Requester gender.
    pub gender: Gender,
    /// Requester address.
    pub address: String,
    /// Whether the requester accepted the terms.
    pub terms_accepted: bool,
    /// Current lifecycle status.
    pub status: BookingStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Returns `true` if `user_id` owns this booking.
    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}
