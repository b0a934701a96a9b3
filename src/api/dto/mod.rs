//! Data Transfer Objects for REST request/response serialization.
//!
//! Enumerated request values (status, gender) arrive as plain strings and
//! are parsed by the service layer so that unknown values are reported as
//! field validation errors rather than body rejections.

pub mod bookings_dto;
pub mod common_dto;
pub mod insights_dto;

pub use bookings_dto::*;
pub use common_dto::*;
pub use insights_dto::*;
