//! Route configuration.
//!
//! # Routes
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET | /health | `health_check` |
//! | POST, GET | /roles | `create_role`, `list_roles` |
//! | GET, PUT | /roles/{id} | `get_role`, `update_role` |
//! | POST, GET | /users | `create_user`, `list_users` |
//! | GET, PUT, PATCH, DELETE | /users/{id} | `get_user`, `replace_user`, `patch_user`, `delete_user` |
//! | POST, GET | /tasks | `create_task`, `list_tasks` |
//! | GET | /tasks/role/{id} | `list_tasks_by_role` |
//! | GET, PUT, PATCH, DELETE | /tasks/{id} | `get_task`, `replace_task`, `patch_task`, `delete_task` |
//!
//! The collection paths also answer with a trailing slash.
//!
//! # Example
//!
//! ```rust,ignore
//! use roster_api::api::{AppState, create_application};
//!
//! let state = AppState::from_repositories(repositories);
//! let application = create_application(state, &server_config.cors_allowed_origins);
//! ```

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{AppState, health_check};
use super::roles::{create_role, get_role, list_roles, update_role};
use super::tasks::{
    create_task, delete_task, get_task, list_tasks, list_tasks_by_role, patch_task, replace_task,
};
use super::users::{create_user, delete_user, get_user, list_users, patch_user, replace_user};
use crate::infrastructure::CorsOrigins;

/// Creates the router with every route, without middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Roles
        .route("/roles", post(create_role).get(list_roles))
        .route("/roles/", post(create_role).get(list_roles))
        .route("/roles/{id}", get(get_role).put(update_role))
        // Users
        .route("/users", post(create_user).get(list_users))
        .route("/users/", post(create_user).get(list_users))
        .route(
            "/users/{id}",
            get(get_user)
                .put(replace_user)
                .patch(patch_user)
                .delete(delete_user),
        )
        // Tasks
        .route("/tasks", post(create_task).get(list_tasks))
        .route("/tasks/", post(create_task).get(list_tasks))
        .route("/tasks/role/{id}", get(list_tasks_by_role))
        .route(
            "/tasks/{id}",
            get(get_task)
                .put(replace_task)
                .patch(patch_task)
                .delete(delete_task),
        )
        .with_state(state)
}

/// Creates the router wrapped in request tracing and CORS.
pub fn create_application(state: AppState, origins: &CorsOrigins) -> Router {
    create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(origins))
}

/// Builds the CORS layer for `origins`. Any method and header is allowed.
///
/// Origins that are not valid header values are skipped with a warning.
pub fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    match origins {
        CorsOrigins::Any => layer.allow_origin(Any),
        CorsOrigins::List(list) => {
            let values: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(error) => {
                        tracing::warn!(%origin, %error, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            layer.allow_origin(AllowOrigin::list(values))
        }
    }
}
