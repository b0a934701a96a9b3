//! Domain layer: booking aggregate, identities, validation rules, and the
//! insights data model.
//!
//! Nothing in here touches I/O. Services in [`crate::service`] combine
//! these types with the persistence ports.

pub mod actor;
pub mod booking;
pub mod directory;
pub mod ids;
pub mod insights;
pub mod validation;

pub use actor::{Actor, Role};
pub use booking::{Booking, BookingStatus, Gender, ReferenceCode};
pub use directory::{Hostel, ListingRequest, ListingRequestStatus, User};
pub use ids::{BookingId, HostelId, ListingRequestId, UserId};
pub use insights::{AdminInsights, HistoricalDataPoint, TimeWindow};
pub use validation::{FieldError, FieldErrors};
