//! Domain module for the roster service.
//!
//! This module contains the entity records, the payload shapes accepted by
//! each operation, and the pure validation rules applied before any mutation.

pub mod integrity;
pub mod role;
pub mod task;
pub mod user;
pub mod validation;

pub use integrity::{
    EntityKind, IntegrityError, validate_role_create, validate_role_update,
    validate_user_email_unique, validate_user_role_ref,
};
pub use role::{NewRole, Role, RoleId};
pub use task::{Task, TaskChanges, TaskDraft, TaskId, TaskPatch};
pub use user::{User, UserChanges, UserDraft, UserId, UserPatch, normalize_email};
pub use validation::{
    FieldError, ValidationError, validate_new_role, validate_task_draft, validate_task_patch,
    validate_user_draft, validate_user_patch,
};
