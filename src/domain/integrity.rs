//! Cross-entity admission rules.
//!
//! These decide whether a mutation keeps the store consistent: role names
//! and user emails stay unique, and every `role_id` points at an existing
//! role. They are pure; each store performs the lookups inside its own
//! transaction or write guard and feeds the results here, so the check and
//! the write that follows are atomic.

use thiserror::Error;

use super::role::{Role, RoleId};
use super::user::UserId;

/// Kind of record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Role,
    User,
    Task,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Role => "Role",
            Self::User => "User",
            Self::Task => "Task",
        };
        formatter.write_str(name)
    }
}

/// A mutation would break existence, uniqueness or referential integrity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IntegrityError {
    /// The record being read, updated or deleted does not exist.
    #[error("{0} not found")]
    NotFound(EntityKind),

    /// Another role already carries this name.
    #[error("Role with this name already exists")]
    DuplicateRoleName,

    /// Another user already carries this email.
    #[error("Email already exists")]
    DuplicateEmail,

    /// The referenced role does not exist.
    #[error("Invalid role_id")]
    UnknownRole,
}

/// Admits a new role unless `holder`, the role currently carrying the
/// requested name, exists. Names compare exactly (case-sensitive).
///
/// # Errors
///
/// Returns [`IntegrityError::DuplicateRoleName`] if the name is taken.
pub fn validate_role_create(holder: Option<&Role>) -> Result<(), IntegrityError> {
    match holder {
        Some(_) => Err(IntegrityError::DuplicateRoleName),
        None => Ok(()),
    }
}

/// Admits renaming role `role_id`.
///
/// `target` is the stored role with that id and `holder` the role that
/// currently carries the new name. Keeping the current name is allowed.
///
/// # Errors
///
/// Returns [`IntegrityError::NotFound`] if `target` is absent, otherwise
/// [`IntegrityError::DuplicateRoleName`] if a different role holds the name.
pub fn validate_role_update(
    role_id: RoleId,
    target: Option<&Role>,
    holder: Option<&Role>,
) -> Result<(), IntegrityError> {
    if target.is_none() {
        return Err(IntegrityError::NotFound(EntityKind::Role));
    }
    match holder {
        Some(role) if role.role_id != role_id => Err(IntegrityError::DuplicateRoleName),
        _ => Ok(()),
    }
}

/// Admits a reference to a role given whether that role exists.
///
/// # Errors
///
/// Returns [`IntegrityError::UnknownRole`] if it does not.
pub const fn validate_user_role_ref(role_exists: bool) -> Result<(), IntegrityError> {
    if role_exists {
        Ok(())
    } else {
        Err(IntegrityError::UnknownRole)
    }
}

/// Admits an email given `holder`, the user currently carrying it.
///
/// When updating, `excluding` is the user being updated; it may keep its
/// own email.
///
/// # Errors
///
/// Returns [`IntegrityError::DuplicateEmail`] if another user holds it.
pub fn validate_user_email_unique(
    holder: Option<UserId>,
    excluding: Option<UserId>,
) -> Result<(), IntegrityError> {
    match holder {
        Some(user_id) if Some(user_id) != excluding => Err(IntegrityError::DuplicateEmail),
        _ => Ok(()),
    }
}
