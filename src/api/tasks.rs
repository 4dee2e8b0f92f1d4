//! Task handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use super::dto::{DeletedResponse, TaskPatchRequest, TaskRequest, TaskResponse};
use super::error::ApiErrorResponse;
use super::handlers::AppState;
use crate::domain::{
    EntityKind, RoleId, TaskChanges, TaskDraft, TaskId, TaskPatch, validate_task_draft,
    validate_task_patch,
};
use crate::infrastructure::RepositoryError;

async fn require_task(state: &AppState, task_id: TaskId) -> Result<(), ApiErrorResponse> {
    match state.task_repository.find_by_id(task_id).await? {
        Some(_) => Ok(()),
        None => Err(RepositoryError::NotFound(EntityKind::Task).into()),
    }
}

async fn apply_changes(
    state: &AppState,
    task_id: TaskId,
    changes: TaskChanges,
) -> Result<Json<TaskResponse>, ApiErrorResponse> {
    let task = state.task_repository.update(task_id, changes).await?;
    tracing::info!(task_id = %task.task_id, role_id = %task.role_id, "Task updated");
    Ok(Json(TaskResponse::from(task)))
}

/// `POST /tasks`
///
/// # Errors
///
/// - 422 if the description or timeline breaks its shape rule
/// - 400 `INVALID_REFERENCE` if `role_id` names no role
pub async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<TaskRequest>, JsonRejection>,
) -> Result<Json<TaskResponse>, ApiErrorResponse> {
    let Json(request) = payload?;
    let task = TaskDraft::from(request);
    validate_task_draft(&task)?;

    let task = state.task_repository.create(task).await?;
    tracing::info!(task_id = %task.task_id, role_id = %task.role_id, "Task created");

    Ok(Json(TaskResponse::from(task)))
}

/// `GET /tasks`
///
/// # Errors
///
/// Returns 500 if the store fails.
pub async fn list_tasks(
    State(state): State<AppState>,
) -> Result<Json<Vec<TaskResponse>>, ApiErrorResponse> {
    let tasks = state.task_repository.list().await?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

/// `GET /tasks/{id}`
///
/// # Errors
///
/// Returns 404 if the task does not exist.
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
) -> Result<Json<TaskResponse>, ApiErrorResponse> {
    let task = state
        .task_repository
        .find_by_id(TaskId::new(task_id))
        .await?
        .ok_or(RepositoryError::NotFound(EntityKind::Task))?;
    Ok(Json(TaskResponse::from(task)))
}

/// `GET /tasks/role/{id}`: tasks assigned to one role, oldest first.
///
/// # Errors
///
/// Returns 404 if the role does not exist.
pub async fn list_tasks_by_role(
    State(state): State<AppState>,
    Path(role_id): Path<i64>,
) -> Result<Json<Vec<TaskResponse>>, ApiErrorResponse> {
    let role_id = RoleId::new(role_id);
    if state.role_repository.find_by_id(role_id).await?.is_none() {
        return Err(RepositoryError::NotFound(EntityKind::Role).into());
    }

    let tasks = state.task_repository.list_by_role(role_id).await?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

/// `PUT /tasks/{id}`: replaces every field.
///
/// # Errors
///
/// 404, then 422, then 400 `INVALID_REFERENCE`.
pub async fn replace_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    payload: Result<Json<TaskRequest>, JsonRejection>,
) -> Result<Json<TaskResponse>, ApiErrorResponse> {
    let task_id = TaskId::new(task_id);
    require_task(&state, task_id).await?;
    let Json(request) = payload?;

    let draft = TaskDraft::from(request);
    validate_task_draft(&draft)?;

    apply_changes(&state, task_id, TaskChanges::Replace(draft)).await
}

/// `PATCH /tasks/{id}`: overwrites only the fields present in the body.
///
/// # Errors
///
/// 404, then 422, then 400 `INVALID_REFERENCE`.
pub async fn patch_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    payload: Result<Json<TaskPatchRequest>, JsonRejection>,
) -> Result<Json<TaskResponse>, ApiErrorResponse> {
    let task_id = TaskId::new(task_id);
    require_task(&state, task_id).await?;
    let Json(request) = payload?;

    let patch = TaskPatch::from(request);
    validate_task_patch(&patch)?;

    apply_changes(&state, task_id, TaskChanges::Merge(patch)).await
}

/// `DELETE /tasks/{id}`
///
/// # Errors
///
/// Returns 404 if the task does not exist.
pub async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
) -> Result<Json<DeletedResponse>, ApiErrorResponse> {
    let task_id = TaskId::new(task_id);
    if !state.task_repository.delete(task_id).await? {
        return Err(RepositoryError::NotFound(EntityKind::Task).into());
    }
    tracing::info!(%task_id, "Task deleted");

    Ok(Json(DeletedResponse::new("Task deleted successfully")))
}
