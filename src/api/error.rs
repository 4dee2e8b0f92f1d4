//! API error handling.
//!
//! Maps store and validation outcomes to status codes and a JSON body of
//! the form `{"code", "message", "details"?}`.
//!
//! | Outcome | Status | Code |
//! |---------|--------|------|
//! | not found | 404 | `NOT_FOUND` |
//! | unique field taken | 400 | `CONFLICT` |
//! | unknown `role_id` | 400 | `INVALID_REFERENCE` |
//! | field shape | 422 | `VALIDATION_ERROR` |
//! | unreadable body | 400 / 415 / 422 | `INVALID_REQUEST` |
//! | store failure | 500 | `INTERNAL_ERROR` |

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::domain::{FieldError, ValidationError};
use crate::infrastructure::RepositoryError;

// =============================================================================
// API Error
// =============================================================================

/// API error structure for JSON responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Field-level errors, present for validation failures only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl ApiError {
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a validation error with field-level details.
    #[must_use]
    pub fn validation(message: impl Into<String>, details: Vec<FieldError>) -> Self {
        Self {
            code: "VALIDATION_ERROR".to_string(),
            message: message.into(),
            details: Some(details),
        }
    }
}

// =============================================================================
// API Error Response
// =============================================================================

/// API error response containing status code and error details.
#[derive(Debug, Clone)]
pub struct ApiErrorResponse {
    pub status: StatusCode,
    pub error: ApiError,
}

impl ApiErrorResponse {
    #[must_use]
    pub const fn new(status: StatusCode, error: ApiError) -> Self {
        Self { status, error }
    }

    /// Creates a 404 Not Found response.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", message))
    }

    /// Creates a 400 Bad Request response for a unique-field collision.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiError::new("CONFLICT", message))
    }

    /// Creates a 400 Bad Request response for a dangling `role_id`.
    #[must_use]
    pub fn invalid_reference(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ApiError::new("INVALID_REFERENCE", message),
        )
    }

    /// Creates a 422 Unprocessable Entity response for field-shape failures.
    #[must_use]
    pub fn validation_error(message: impl Into<String>, details: Vec<FieldError>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::validation(message, details),
        )
    }

    /// Creates a 500 Internal Server Error response.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::new("INTERNAL_ERROR", message),
        )
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        if self.status.is_client_error() {
            tracing::debug!(
                status = self.status.as_u16(),
                code = %self.error.code,
                message = %self.error.message,
                "Request rejected"
            );
        }
        (self.status, Json(self.error)).into_response()
    }
}

impl From<RepositoryError> for ApiErrorResponse {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound(kind) => Self::not_found(format!("{kind} not found")),
            RepositoryError::Conflict(message) => Self::conflict(message),
            RepositoryError::InvalidReference(message) => Self::invalid_reference(message),
            RepositoryError::DatabaseError(detail) => {
                tracing::error!(%detail, "Store operation failed");
                Self::internal_error("An internal error occurred")
            }
        }
    }
}

impl From<ValidationError> for ApiErrorResponse {
    fn from(error: ValidationError) -> Self {
        Self::validation_error("Validation failed", error.errors)
    }
}

impl From<JsonRejection> for ApiErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(
            rejection.status(),
            ApiError::new("INVALID_REQUEST", rejection.body_text()),
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntityKind;
    use rstest::rstest;

    #[rstest]
    fn test_api_error_new() {
        let error = ApiError::new("TEST_ERROR", "Test message");
        assert_eq!(error.code, "TEST_ERROR");
        assert_eq!(error.message, "Test message");
        assert!(error.details.is_none());
    }

    #[rstest]
    fn test_api_error_serialization_omits_missing_details() {
        let json = serde_json::to_value(ApiError::new("NOT_FOUND", "User not found")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"code": "NOT_FOUND", "message": "User not found"})
        );
    }

    #[rstest]
    fn test_api_error_validation_carries_details() {
        let details = vec![FieldError::new("email", "must be a valid email address")];
        let json = serde_json::to_value(ApiError::validation("Validation failed", details)).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["details"][0]["field"], "email");
    }

    #[rstest]
    #[case(RepositoryError::NotFound(EntityKind::Role), StatusCode::NOT_FOUND, "NOT_FOUND", "Role not found")]
    #[case(RepositoryError::Conflict("Email already exists".to_string()), StatusCode::BAD_REQUEST, "CONFLICT", "Email already exists")]
    #[case(RepositoryError::InvalidReference("Invalid role_id".to_string()), StatusCode::BAD_REQUEST, "INVALID_REFERENCE", "Invalid role_id")]
    #[case(RepositoryError::DatabaseError("disk I/O error".to_string()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "An internal error occurred")]
    fn test_repository_error_to_api_error_response(
        #[case] error: RepositoryError,
        #[case] status: StatusCode,
        #[case] code: &str,
        #[case] message: &str,
    ) {
        let response = ApiErrorResponse::from(error);
        assert_eq!(response.status, status);
        assert_eq!(response.error.code, code);
        assert_eq!(response.error.message, message);
    }

    #[rstest]
    fn test_internal_error_hides_detail() {
        let response =
            ApiErrorResponse::from(RepositoryError::DatabaseError("secret path".to_string()));
        assert!(!response.error.message.contains("secret"));
    }

    #[rstest]
    fn test_validation_error_to_api_error_response() {
        let error = ValidationError::single("role_name", "must be at least 2 characters");
        let response: ApiErrorResponse = error.into();
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.error.code, "VALIDATION_ERROR");
        assert_eq!(response.error.details.map(|details| details.len()), Some(1));
    }

    #[rstest]
    fn test_into_response_uses_status() {
        let response = ApiErrorResponse::not_found("Task not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
