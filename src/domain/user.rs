//! User domain model.
//!
//! Users reference their role by id only; the role is resolved by lookup
//! when needed, never held as a live object.

use serde::{Deserialize, Serialize};

use super::role::RoleId;

/// Identity of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Lowercases the domain part of `email`, leaving the local part as given.
///
/// Addresses without an `@` are returned unchanged for validation to reject.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// A stored user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    /// Unique across all users.
    pub email: String,
    /// `YYYY-MM-DD`, kept as text.
    pub hire_date: String,
    pub role_id: RoleId,
    pub bio: Option<String>,
}

/// Complete field set of a user, used for creation and full replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub hire_date: String,
    pub role_id: RoleId,
    pub bio: Option<String>,
}

impl UserDraft {
    #[must_use]
    pub fn into_user(self, user_id: UserId) -> User {
        User {
            user_id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            hire_date: self.hire_date,
            role_id: self.role_id,
            bio: self.bio,
        }
    }
}

/// Partial field set of a user.
///
/// Each field has three states: `None` (absent, left untouched),
/// `Some(Some(value))` (overwrite) and `Some(None)` (explicit null).
/// Explicit null clears `bio`; on the other fields it is rejected by
/// validation and ignored by [`UserPatch::apply_to`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub first_name: Option<Option<String>>,
    pub last_name: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub hire_date: Option<Option<String>>,
    pub role_id: Option<Option<RoleId>>,
    pub bio: Option<Option<String>>,
}

impl UserPatch {
    /// Merges the present fields over `current`.
    #[must_use]
    pub fn apply_to(self, current: &User) -> User {
        let mut user = current.clone();
        if let Some(Some(first_name)) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(Some(last_name)) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(Some(email)) = self.email {
            user.email = email;
        }
        if let Some(Some(hire_date)) = self.hire_date {
            user.hire_date = hire_date;
        }
        if let Some(Some(role_id)) = self.role_id {
            user.role_id = role_id;
        }
        if let Some(bio) = self.bio {
            user.bio = bio;
        }
        user
    }
}

/// How an update request changes a stored user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserChanges {
    /// Every field is overwritten (`PUT`).
    Replace(UserDraft),
    /// Only present fields are overwritten (`PATCH`).
    Merge(UserPatch),
}

impl UserChanges {
    /// Computes the record that results from applying these changes.
    #[must_use]
    pub fn apply_to(self, current: &User) -> User {
        match self {
            Self::Replace(draft) => draft.into_user(current.user_id),
            Self::Merge(patch) => patch.apply_to(current),
        }
    }
}
