//! Authenticated caller identity.
//!
//! Authentication itself happens upstream; the core only receives the
//! caller's user id and role and makes authorization decisions from them.

use serde::{Deserialize, Serialize};

use super::UserId;

/// Coarse role of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular end user.
    #[default]
    User,
    /// Back-office administrator.
    Admin,
}

/// The user performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Caller identity.
    pub user_id: UserId,
    /// Caller role.
    pub role: Role,
}

impl Actor {
    /// Creates a regular user actor.
    #[must_use]
    pub const fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::User,
        }
    }

    /// Creates an admin actor.
    #[must_use]
    pub const fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Admin,
        }
    }

    /// Returns `true` if the caller is an administrator.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}
