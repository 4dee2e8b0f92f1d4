//! Role domain model.

use serde::{Deserialize, Serialize};

/// Identity of a role.
///
/// Assigned by the store on creation and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(i64);

impl RoleId {
    /// Wraps a raw identity value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw identity value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A named category assignable to users and tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub role_id: RoleId,
    /// Unique across all roles (case-sensitive).
    pub role_name: String,
}

impl Role {
    #[must_use]
    pub fn new(role_id: RoleId, role_name: impl Into<String>) -> Self {
        Self {
            role_id,
            role_name: role_name.into(),
        }
    }
}

/// Field set accepted when creating or renaming a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRole {
    pub role_name: String,
}

impl NewRole {
    #[must_use]
    pub fn new(role_name: impl Into<String>) -> Self {
        Self {
            role_name: role_name.into(),
        }
    }

    /// Builds the stored record once an identity has been assigned.
    #[must_use]
    pub fn into_role(self, role_id: RoleId) -> Role {
        Role::new(role_id, self.role_name)
    }
}
