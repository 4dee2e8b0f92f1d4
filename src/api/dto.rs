//! Data Transfer Objects for API requests and responses.
//!
//! Request shapes are kept apart from the domain types: ids arrive as bare
//! integers and partial updates arrive with every field optional.

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{
    NewRole, Role, RoleId, Task, TaskDraft, TaskPatch, User, UserDraft, UserPatch,
    normalize_email,
};

/// Deserializes a field that distinguishes absent from `null`.
///
/// Combined with `#[serde(default)]`: absent yields `None`, `null` yields
/// `Some(None)` and a value yields `Some(Some(value))`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// =============================================================================
// Role DTOs
// =============================================================================

/// Request DTO for creating or renaming a role.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleRequest {
    pub role_name: String,
}

impl From<RoleRequest> for NewRole {
    fn from(request: RoleRequest) -> Self {
        Self::new(request.role_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleResponse {
    pub role_id: i64,
    pub role_name: String,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            role_id: role.role_id.get(),
            role_name: role.role_name,
        }
    }
}

// =============================================================================
// User DTOs
// =============================================================================

/// Request DTO for creating a user or replacing all of its fields.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// `YYYY-MM-DD`.
    pub hire_date: String,
    pub role_id: i64,
    #[serde(default)]
    pub bio: Option<String>,
}

impl From<UserRequest> for UserDraft {
    fn from(request: UserRequest) -> Self {
        Self {
            first_name: request.first_name,
            last_name: request.last_name,
            email: normalize_email(&request.email),
            hire_date: request.hire_date,
            role_id: RoleId::new(request.role_id),
            bio: request.bio,
        }
    }
}

/// Request DTO for a partial user update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatchRequest {
    #[serde(default, deserialize_with = "present")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub hire_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub role_id: Option<Option<i64>>,
    /// `null` clears the stored bio.
    #[serde(default, deserialize_with = "present")]
    pub bio: Option<Option<String>>,
}

impl From<UserPatchRequest> for UserPatch {
    fn from(request: UserPatchRequest) -> Self {
        Self {
            first_name: request.first_name,
            last_name: request.last_name,
            email: request
                .email
                .map(|email| email.as_deref().map(normalize_email)),
            hire_date: request.hire_date,
            role_id: request.role_id.map(|role_id| role_id.map(RoleId::new)),
            bio: request.bio,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub hire_date: String,
    pub role_id: i64,
    pub bio: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id.get(),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            hire_date: user.hire_date,
            role_id: user.role_id.get(),
            bio: user.bio,
        }
    }
}

// =============================================================================
// Task DTOs
// =============================================================================

/// Request DTO for creating a task or replacing all of its fields.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskRequest {
    pub role_id: i64,
    pub task_description: String,
    /// `YYYY-MM-DD`.
    pub completion_timeline: String,
}

impl From<TaskRequest> for TaskDraft {
    fn from(request: TaskRequest) -> Self {
        Self {
            role_id: RoleId::new(request.role_id),
            task_description: request.task_description,
            completion_timeline: request.completion_timeline,
        }
    }
}

/// Request DTO for a partial task update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatchRequest {
    #[serde(default, deserialize_with = "present")]
    pub role_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub task_description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub completion_timeline: Option<Option<String>>,
}

impl From<TaskPatchRequest> for TaskPatch {
    fn from(request: TaskPatchRequest) -> Self {
        Self {
            role_id: request.role_id.map(|role_id| role_id.map(RoleId::new)),
            task_description: request.task_description,
            completion_timeline: request.completion_timeline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResponse {
    pub task_id: i64,
    pub role_id: i64,
    pub task_description: String,
    pub completion_timeline: String,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            task_id: task.task_id.get(),
            role_id: task.role_id.get(),
            task_description: task.task_description,
            completion_timeline: task.completion_timeline,
        }
    }
}

// =============================================================================
// Shared DTOs
// =============================================================================

/// Body returned by a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub detail: String,
}

impl DeletedResponse {
    #[must_use]
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn user_patch_distinguishes_absent_from_null() {
        let request: UserPatchRequest =
            serde_json::from_str(r#"{"first_name": "Jonathan", "bio": null}"#).unwrap();

        assert_eq!(request.first_name, Some(Some("Jonathan".to_string())));
        assert_eq!(request.bio, Some(None));
        assert_eq!(request.last_name, None);
        assert_eq!(request.role_id, None);
    }

    #[rstest]
    fn empty_user_patch_maps_to_empty_domain_patch() {
        let request: UserPatchRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(UserPatch::from(request), UserPatch::default());
    }

    #[rstest]
    fn email_domain_is_normalized_on_create_and_patch() {
        let request: UserRequest = serde_json::from_str(
            r#"{"first_name":"Test","last_name":"User","email":"Test@Example.COM",
                "hire_date":"2025-01-01","role_id":1}"#,
        )
        .unwrap();
        assert_eq!(UserDraft::from(request).email, "Test@example.com");

        let patch: UserPatchRequest =
            serde_json::from_str(r#"{"email": "Jane@EXAMPLE.org"}"#).unwrap();
        assert_eq!(
            UserPatch::from(patch).email,
            Some(Some("Jane@example.org".to_string()))
        );
    }

    #[rstest]
    fn user_request_defaults_bio_to_none() {
        let request: UserRequest = serde_json::from_str(
            r#"{"first_name":"Test","last_name":"User","email":"test@example.com",
                "hire_date":"2025-01-01","role_id":1}"#,
        )
        .unwrap();

        let draft = UserDraft::from(request);
        assert_eq!(draft.bio, None);
        assert_eq!(draft.role_id, RoleId::new(1));
    }

    #[rstest]
    #[case(r#"{"role_id": 2}"#, Some(Some(2)))]
    #[case(r#"{"role_id": null}"#, Some(None))]
    #[case("{}", None)]
    fn task_patch_role_id_states(#[case] body: &str, #[case] expected: Option<Option<i64>>) {
        let request: TaskPatchRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.role_id, expected);
    }

    #[rstest]
    fn user_response_serializes_null_bio() {
        let response = UserResponse {
            user_id: 1,
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: "test@example.com".to_string(),
            hire_date: "2025-01-01".to_string(),
            role_id: 1,
            bio: None,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["bio"].is_null());
        assert!(json.as_object().unwrap().contains_key("bio"));
    }
}
