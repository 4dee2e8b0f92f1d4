//! User handlers.
//!
//! Update and delete check that the user exists before anything else, so a
//! missing user is always reported as 404 whatever the payload holds.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use super::dto::{DeletedResponse, UserPatchRequest, UserRequest, UserResponse};
use super::error::ApiErrorResponse;
use super::handlers::AppState;
use crate::domain::{
    EntityKind, UserChanges, UserDraft, UserId, UserPatch, validate_user_draft,
    validate_user_patch,
};
use crate::infrastructure::RepositoryError;

async fn require_user(state: &AppState, user_id: UserId) -> Result<(), ApiErrorResponse> {
    match state.user_repository.find_by_id(user_id).await? {
        Some(_) => Ok(()),
        None => Err(RepositoryError::NotFound(EntityKind::User).into()),
    }
}

async fn apply_changes(
    state: &AppState,
    user_id: UserId,
    changes: UserChanges,
) -> Result<Json<UserResponse>, ApiErrorResponse> {
    let user = state.user_repository.update(user_id, changes).await?;
    tracing::info!(user_id = %user.user_id, "User updated");
    Ok(Json(UserResponse::from(user)))
}

/// `POST /users`
///
/// # Errors
///
/// - 422 if a field breaks its shape rule
/// - 400 `CONFLICT` if the email is taken
/// - 400 `INVALID_REFERENCE` if `role_id` names no role
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiErrorResponse> {
    let Json(request) = payload?;
    let user = UserDraft::from(request);
    validate_user_draft(&user)?;

    let user = state.user_repository.create(user).await?;
    tracing::info!(user_id = %user.user_id, role_id = %user.role_id, "User created");

    Ok(Json(UserResponse::from(user)))
}

/// `GET /users`
///
/// # Errors
///
/// Returns 500 if the store fails.
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiErrorResponse> {
    let users = state.user_repository.list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// `GET /users/{id}`
///
/// # Errors
///
/// Returns 404 if the user does not exist.
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, ApiErrorResponse> {
    let user = state
        .user_repository
        .find_by_id(UserId::new(user_id))
        .await?
        .ok_or(RepositoryError::NotFound(EntityKind::User))?;
    Ok(Json(UserResponse::from(user)))
}

/// `PUT /users/{id}`: replaces every field.
///
/// # Errors
///
/// 404, then 422, then 400 `CONFLICT`, then 400 `INVALID_REFERENCE`.
pub async fn replace_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiErrorResponse> {
    let user_id = UserId::new(user_id);
    require_user(&state, user_id).await?;
    let Json(request) = payload?;

    let draft = UserDraft::from(request);
    validate_user_draft(&draft)?;

    apply_changes(&state, user_id, UserChanges::Replace(draft)).await
}

/// `PATCH /users/{id}`: overwrites only the fields present in the body.
///
/// An empty body leaves the user unchanged.
///
/// # Errors
///
/// 404, then 422, then 400 `CONFLICT`, then 400 `INVALID_REFERENCE`.
pub async fn patch_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    payload: Result<Json<UserPatchRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiErrorResponse> {
    let user_id = UserId::new(user_id);
    require_user(&state, user_id).await?;
    let Json(request) = payload?;

    let patch = UserPatch::from(request);
    validate_user_patch(&patch)?;

    apply_changes(&state, user_id, UserChanges::Merge(patch)).await
}

/// `DELETE /users/{id}`
///
/// # Errors
///
/// Returns 404 if the user does not exist.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<DeletedResponse>, ApiErrorResponse> {
    let user_id = UserId::new(user_id);
    if !state.user_repository.delete(user_id).await? {
        return Err(RepositoryError::NotFound(EntityKind::User).into());
    }
    tracing::info!(%user_id, "User deleted");

    Ok(Json(DeletedResponse::new("User deleted successfully")))
}
