//! # hostel-bookings
//!
//! Booking admission, lifecycle control, and admin insights for a hostel
//! listing platform.
//!
//! Users request bookings for hostels; a booking starts `PENDING`, can be
//! confirmed by an administrator, and can be cancelled by its owner (while
//! pending) or by an administrator. A user holds at most one active
//! (`PENDING` or `CONFIRMED`) booking per hostel, enforced atomically by the
//! store. Administrators get a cached insights snapshot plus a trailing
//! monthly history.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, identity via x-user-id / x-user-role)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── AdmissionService, LifecycleController,
//!     │   InsightsAggregator + monthly schedule (service/)
//!     │
//!     ├── Booking, validation, insights model (domain/)
//!     │
//!     └── BookingRepository / InsightsRepository (persistence/)
//!             ├── PostgreSQL (sqlx)
//!             └── in-memory
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
