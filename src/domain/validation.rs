//! Field validation for booking requests and admin edits.
//!
//! Validators never stop at the first problem: every offending field is
//! collected into a [`FieldErrors`] list so clients can fix them at once.

use std::borrow::Cow;

use serde::Serialize;
use utoipa::ToSchema;

use super::Gender;

/// Maximum number of digits accepted in a phone number.
pub const PHONE_MAX_DIGITS: usize = 15;

/// A single rejected field and the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    /// Request field name as the client sent it.
    #[schema(value_type = String)]
    pub field: Cow<'static, str>,
    /// Human-readable reason.
    pub message: String,
}

/// Accumulator for field errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure for `field`.
    pub fn push(&mut self, field: impl Into<Cow<'static, str>>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Runs `check` and records its error under `field`, returning the
    /// validated value when it passes.
    pub fn check<T>(&mut self, field: &'static str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.push(field, message);
                None
            }
        }
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the recorded errors.
    #[must_use]
    pub fn into_inner(self) -> Vec<FieldError> {
        self.0
    }
}

/// Accepts an optional leading `+` followed by 1 to 15 ASCII digits.
///
/// # Errors
///
/// Returns a message describing the expected format.
pub fn validate_phone(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if digits.is_empty()
        || digits.len() > PHONE_MAX_DIGITS
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(format!(
            "must be an optional '+' followed by 1 to {PHONE_MAX_DIGITS} digits"
        ));
    }
    Ok(trimmed.to_string())
}

/// Parses a gender value, case-insensitively.
///
/// # Errors
///
/// Returns a message listing the accepted values.
pub fn validate_gender(raw: &str) -> Result<Gender, String> {
    raw.parse()
        .map_err(|_| "must be one of MALE, FEMALE, OTHER".to_string())
}

/// Requires a non-blank value and returns it trimmed.
///
/// # Errors
///
/// Returns a message when the value is blank.
pub fn validate_required(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("must not be empty".to_string());
    }
    Ok(trimmed.to_string())
}

/// Requires the terms-acceptance flag to be set.
///
/// # Errors
///
/// Returns a message when the terms were not accepted.
pub fn validate_terms(accepted: bool) -> Result<bool, String> {
    if accepted {
        Ok(true)
    } else {
        Err("terms and conditions must be accepted".to_string())
    }
}
