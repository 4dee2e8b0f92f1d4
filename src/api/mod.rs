//! API module for HTTP handlers.
//!
//! This module contains route definitions and request/response handlers.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod roles;
pub mod routes;
pub mod tasks;
pub mod users;

pub use dto::{
    DeletedResponse, RoleRequest, RoleResponse, TaskPatchRequest, TaskRequest, TaskResponse,
    UserPatchRequest, UserRequest, UserResponse,
};
pub use error::{ApiError, ApiErrorResponse};
pub use handlers::{AppState, HealthResponse, health_check};
pub use roles::{create_role, get_role, list_roles, update_role};
pub use routes::{cors_layer, create_application, create_router};
pub use tasks::{
    create_task, delete_task, get_task, list_tasks, list_tasks_by_role, patch_task, replace_task,
};
pub use users::{create_user, delete_user, get_user, list_users, patch_user, replace_user};
