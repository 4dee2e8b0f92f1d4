//! Repository traits for domain entities.
//!
//! Every method returns a boxed `Send` future so the backend can be picked
//! at runtime and shared as `Arc<dyn ... + Send + Sync>`.
//!
//! Each mutation is atomic with respect to the records it reads: the
//! existence, uniqueness and role-reference checks run under the same lock
//! or transaction as the write. Outcomes surface as [`RepositoryError`];
//! a store never drops a write silently.

use futures::future::BoxFuture;
use thiserror::Error;

use crate::domain::{
    EntityKind, IntegrityError, NewRole, Role, RoleId, Task, TaskChanges, TaskDraft, TaskId, User,
    UserChanges, UserDraft, UserId,
};

// =============================================================================
// Repository Error
// =============================================================================

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The addressed record does not exist.
    #[error("{0} not found")]
    NotFound(EntityKind),

    /// A unique field collides with another record.
    #[error("{0}")]
    Conflict(String),

    /// A `role_id` points at no role.
    #[error("{0}")]
    InvalidReference(String),

    /// The backend failed.
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<IntegrityError> for RepositoryError {
    fn from(error: IntegrityError) -> Self {
        match error {
            IntegrityError::NotFound(kind) => Self::NotFound(kind),
            IntegrityError::DuplicateRoleName | IntegrityError::DuplicateEmail => {
                Self::Conflict(error.to_string())
            }
            IntegrityError::UnknownRole => Self::InvalidReference(error.to_string()),
        }
    }
}

/// Result of a repository operation.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

// =============================================================================
// Role Repository
// =============================================================================

/// Repository trait for Role entities. Roles cannot be deleted.
pub trait RoleRepository: Send + Sync {
    /// Stores a new role under the next identity.
    ///
    /// Fails with `Conflict` if the name is taken.
    fn create(&self, role: NewRole) -> BoxFuture<'static, RepositoryResult<Role>>;

    /// Finds a role by its ID.
    fn find_by_id(&self, id: RoleId) -> BoxFuture<'static, RepositoryResult<Option<Role>>>;

    /// Lists all roles in insertion order.
    fn list(&self) -> BoxFuture<'static, RepositoryResult<Vec<Role>>>;

    /// Renames a role.
    ///
    /// Fails with `NotFound` if absent, then `Conflict` if another role
    /// holds the new name.
    fn update(&self, id: RoleId, role: NewRole) -> BoxFuture<'static, RepositoryResult<Role>>;
}

// =============================================================================
// User Repository
// =============================================================================

/// Repository trait for User entities.
pub trait UserRepository: Send + Sync {
    /// Stores a new user.
    ///
    /// Fails with `Conflict` for a taken email, then `InvalidReference`
    /// for an unknown role.
    fn create(&self, user: UserDraft) -> BoxFuture<'static, RepositoryResult<User>>;

    fn find_by_id(&self, id: UserId) -> BoxFuture<'static, RepositoryResult<Option<User>>>;

    /// Lists all users in insertion order.
    fn list(&self) -> BoxFuture<'static, RepositoryResult<Vec<User>>>;

    /// Applies a full or partial update.
    ///
    /// Fails with `NotFound`, then `Conflict`, then `InvalidReference`.
    fn update(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> BoxFuture<'static, RepositoryResult<User>>;

    /// Deletes a user by its ID.
    ///
    /// Returns `Ok(true)` if the user was deleted, `Ok(false)` if it didn't exist.
    fn delete(&self, id: UserId) -> BoxFuture<'static, RepositoryResult<bool>>;
}

// =============================================================================
// Task Repository
// =============================================================================

/// Repository trait for Task entities.
pub trait TaskRepository: Send + Sync {
    /// Stores a new task. Fails with `InvalidReference` for an unknown role.
    fn create(&self, task: TaskDraft) -> BoxFuture<'static, RepositoryResult<Task>>;

    fn find_by_id(&self, id: TaskId) -> BoxFuture<'static, RepositoryResult<Option<Task>>>;

    /// Lists all tasks in insertion order.
    fn list(&self) -> BoxFuture<'static, RepositoryResult<Vec<Task>>>;

    /// Lists the tasks assigned to `role_id`, in insertion order.
    fn list_by_role(&self, role_id: RoleId) -> BoxFuture<'static, RepositoryResult<Vec<Task>>>;

    /// Applies a full or partial update.
    ///
    /// Fails with `NotFound`, then `InvalidReference`.
    fn update(
        &self,
        id: TaskId,
        changes: TaskChanges,
    ) -> BoxFuture<'static, RepositoryResult<Task>>;

    /// Deletes a task. Returns `Ok(false)` if it didn't exist.
    fn delete(&self, id: TaskId) -> BoxFuture<'static, RepositoryResult<bool>>;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn repository_error_display() {
        let error = RepositoryError::NotFound(EntityKind::Task);
        assert_eq!(format!("{error}"), "Task not found");

        let error = RepositoryError::DatabaseError("disk I/O error".to_string());
        assert_eq!(format!("{error}"), "Database error: disk I/O error");
    }

    #[rstest]
    #[case(IntegrityError::DuplicateRoleName, RepositoryError::Conflict("Role with this name already exists".to_string()))]
    #[case(IntegrityError::DuplicateEmail, RepositoryError::Conflict("Email already exists".to_string()))]
    #[case(IntegrityError::UnknownRole, RepositoryError::InvalidReference("Invalid role_id".to_string()))]
    #[case(IntegrityError::NotFound(EntityKind::Role), RepositoryError::NotFound(EntityKind::Role))]
    fn integrity_error_conversion(
        #[case] error: IntegrityError,
        #[case] expected: RepositoryError,
    ) {
        assert_eq!(RepositoryError::from(error), expected);
    }
}
