//! Shared handler state and the health endpoint.

use std::sync::Arc;

use axum::Json;

use crate::infrastructure::{Repositories, RoleRepository, TaskRepository, UserRepository};

// =============================================================================
// Application State
// =============================================================================

/// Shared application dependencies.
///
/// Holds trait objects so the backend chosen by `RepositoryFactory` at
/// runtime can be swapped in without changing the handlers.
#[derive(Clone)]
pub struct AppState {
    pub role_repository: Arc<dyn RoleRepository + Send + Sync>,
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub task_repository: Arc<dyn TaskRepository + Send + Sync>,
}

impl AppState {
    /// Creates a new `AppState` from initialized repositories.
    #[must_use]
    pub fn from_repositories(repositories: Repositories) -> Self {
        Self {
            role_repository: repositories.role_repository,
            user_repository: repositories.user_repository,
            task_repository: repositories.task_repository,
        }
    }
}

// =============================================================================
// GET /health Handler
// =============================================================================

/// Health check response body.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Health check endpoint.
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn health_check_reports_crate_version() {
        let Json(response) = health_check().await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.version, env!("CARGO_PKG_VERSION"));
    }
}
