//! Role handlers.
//!
//! Roles can be created, read, listed and renamed. There is no delete.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use super::dto::{RoleRequest, RoleResponse};
use super::error::ApiErrorResponse;
use super::handlers::AppState;
use crate::domain::{EntityKind, NewRole, RoleId, validate_new_role};
use crate::infrastructure::RepositoryError;

/// `POST /roles`
///
/// # Errors
///
/// - 422 if `role_name` is outside 2..=100 characters
/// - 400 `CONFLICT` if another role has the name
pub async fn create_role(
    State(state): State<AppState>,
    payload: Result<Json<RoleRequest>, JsonRejection>,
) -> Result<Json<RoleResponse>, ApiErrorResponse> {
    let Json(request) = payload?;
    let role = NewRole::from(request);
    validate_new_role(&role)?;

    let role = state.role_repository.create(role).await?;
    tracing::info!(role_id = %role.role_id, role_name = %role.role_name, "Role created");

    Ok(Json(RoleResponse::from(role)))
}

/// `GET /roles`
///
/// # Errors
///
/// Returns 500 if the store fails.
pub async fn list_roles(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoleResponse>>, ApiErrorResponse> {
    let roles = state.role_repository.list().await?;
    Ok(Json(roles.into_iter().map(RoleResponse::from).collect()))
}

/// `GET /roles/{id}`
///
/// # Errors
///
/// Returns 404 if the role does not exist.
pub async fn get_role(
    State(state): State<AppState>,
    Path(role_id): Path<i64>,
) -> Result<Json<RoleResponse>, ApiErrorResponse> {
    let role = state
        .role_repository
        .find_by_id(RoleId::new(role_id))
        .await?
        .ok_or(RepositoryError::NotFound(EntityKind::Role))?;
    Ok(Json(RoleResponse::from(role)))
}

/// `PUT /roles/{id}`
///
/// # Errors
///
/// - 404 if the role does not exist
/// - 422 if `role_name` is outside 2..=100 characters
/// - 400 `CONFLICT` if a different role has the name
pub async fn update_role(
    State(state): State<AppState>,
    Path(role_id): Path<i64>,
    payload: Result<Json<RoleRequest>, JsonRejection>,
) -> Result<Json<RoleResponse>, ApiErrorResponse> {
    let role_id = RoleId::new(role_id);
    if state.role_repository.find_by_id(role_id).await?.is_none() {
        return Err(RepositoryError::NotFound(EntityKind::Role).into());
    }
    let Json(request) = payload?;

    let role = NewRole::from(request);
    validate_new_role(&role)?;

    let role = state.role_repository.update(role_id, role).await?;
    tracing::info!(role_id = %role.role_id, role_name = %role.role_name, "Role renamed");

    Ok(Json(RoleResponse::from(role)))
}
