//! Field-shape validation.
//!
//! Pure functions that decide whether a payload is admissible before any
//! store access. Every failing field is reported, not just the first one.
//!
//! # Validation Rules
//!
//! | Field | Rule |
//! |-------|------|
//! | `role_name` | 2..=100 characters |
//! | `first_name`, `last_name` | 2..=100 characters |
//! | `email` | 6..=255 characters, `local@domain.tld` |
//! | `hire_date`, `completion_timeline` | `YYYY-MM-DD` (no calendar check) |
//! | `bio` | at most 500 characters |
//! | `task_description` | 5..=500 characters |
//!
//! Lengths count Unicode scalar values.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::role::NewRole;
use super::task::{TaskDraft, TaskPatch};
use super::user::{UserDraft, UserPatch};

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 100;
const EMAIL_MIN: usize = 6;
const EMAIL_MAX: usize = 255;
const BIO_MAX: usize = 500;
const DESCRIPTION_MIN: usize = 5;
const DESCRIPTION_MAX: usize = 500;

static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("Invalid date regex pattern")
});

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)+$").expect("Invalid email regex pattern")
});

// =============================================================================
// Error Types
// =============================================================================

/// Field-level error for validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the field that failed validation.
    pub field: String,
    /// Error message for this field.
    pub message: String,
}

impl FieldError {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A payload failed one or more shape constraints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validation failed for {} field(s)", errors.len())]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    #[must_use]
    pub const fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![FieldError::new(field, message)])
    }

    /// Returns true if `field` is among the failing fields.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|error| error.field == field)
    }
}

/// Accumulates field errors for one payload.
#[derive(Debug, Default)]
struct Collector {
    errors: Vec<FieldError>,
}

impl Collector {
    fn check(&mut self, field: &str, outcome: Result<(), String>) {
        if let Err(message) = outcome {
            self.errors.push(FieldError::new(field, message));
        }
    }

    /// Checks a present, non-nullable patch field.
    fn check_present<T>(
        &mut self,
        field: &str,
        value: Option<&Option<T>>,
        rule: impl FnOnce(&T) -> Result<(), String>,
    ) {
        match value {
            None => {}
            Some(None) => self.check(field, Err("must not be null".to_string())),
            Some(Some(value)) => self.check(field, rule(value)),
        }
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.errors))
        }
    }
}

// =============================================================================
// Field Rules
// =============================================================================

fn length_between(value: &str, minimum: usize, maximum: usize) -> Result<(), String> {
    let length = value.chars().count();
    if length < minimum {
        Err(format!("must be at least {minimum} characters"))
    } else if length > maximum {
        Err(format!("must be at most {maximum} characters"))
    } else {
        Ok(())
    }
}

fn name_rule(value: &str) -> Result<(), String> {
    length_between(value, NAME_MIN, NAME_MAX)
}

fn email_rule(value: &str) -> Result<(), String> {
    length_between(value, EMAIL_MIN, EMAIL_MAX)?;
    if EMAIL_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err("must be a valid email address".to_string())
    }
}

fn date_rule(value: &str) -> Result<(), String> {
    if DATE_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err("must match YYYY-MM-DD".to_string())
    }
}

fn bio_rule(value: &str) -> Result<(), String> {
    length_between(value, 0, BIO_MAX)
}

fn description_rule(value: &str) -> Result<(), String> {
    length_between(value, DESCRIPTION_MIN, DESCRIPTION_MAX)
}

// =============================================================================
// Payload Validators
// =============================================================================

/// Validates a role creation or rename payload.
///
/// # Errors
///
/// Returns [`ValidationError`] if `role_name` is outside 2..=100 characters.
pub fn validate_new_role(role: &NewRole) -> Result<(), ValidationError> {
    let mut collector = Collector::default();
    collector.check("role_name", name_rule(&role.role_name));
    collector.finish()
}

/// Validates a complete user field set.
///
/// # Errors
///
/// Returns [`ValidationError`] listing every field that breaks its rule.
pub fn validate_user_draft(user: &UserDraft) -> Result<(), ValidationError> {
    let mut collector = Collector::default();
    collector.check("first_name", name_rule(&user.first_name));
    collector.check("last_name", name_rule(&user.last_name));
    collector.check("email", email_rule(&user.email));
    collector.check("hire_date", date_rule(&user.hire_date));
    if let Some(bio) = &user.bio {
        collector.check("bio", bio_rule(bio));
    }
    collector.finish()
}

/// Validates the present fields of a user patch.
///
/// # Errors
///
/// Returns [`ValidationError`] if a present field breaks its rule, or if
/// a non-nullable field is explicitly null.
pub fn validate_user_patch(patch: &UserPatch) -> Result<(), ValidationError> {
    let mut collector = Collector::default();
    collector.check_present("first_name", patch.first_name.as_ref(), |value| {
        name_rule(value)
    });
    collector.check_present("last_name", patch.last_name.as_ref(), |value| {
        name_rule(value)
    });
    collector.check_present("email", patch.email.as_ref(), |value| email_rule(value));
    collector.check_present("hire_date", patch.hire_date.as_ref(), |value| {
        date_rule(value)
    });
    collector.check_present("role_id", patch.role_id.as_ref(), |_| Ok(()));
    if let Some(Some(bio)) = &patch.bio {
        collector.check("bio", bio_rule(bio));
    }
    collector.finish()
}

/// Validates a complete task field set.
///
/// # Errors
///
/// Returns [`ValidationError`] listing every field that breaks its rule.
pub fn validate_task_draft(task: &TaskDraft) -> Result<(), ValidationError> {
    let mut collector = Collector::default();
    collector.check("task_description", description_rule(&task.task_description));
    collector.check("completion_timeline", date_rule(&task.completion_timeline));
    collector.finish()
}

/// Validates the present fields of a task patch.
///
/// # Errors
///
/// Returns [`ValidationError`] if a present field breaks its rule or is null.
pub fn validate_task_patch(patch: &TaskPatch) -> Result<(), ValidationError> {
    let mut collector = Collector::default();
    collector.check_present("role_id", patch.role_id.as_ref(), |_| Ok(()));
    collector.check_present("task_description", patch.task_description.as_ref(), |value| {
        description_rule(value)
    });
    collector.check_present(
        "completion_timeline",
        patch.completion_timeline.as_ref(),
        |value| date_rule(value),
    );
    collector.finish()
}

// =============================================================================
// Tests
// =============================================================================
