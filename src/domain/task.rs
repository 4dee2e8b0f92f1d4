//! Task domain model.
//!
//! A task is a unit of work assigned to a role, with a free-text
//! description and a completion date.

use serde::{Deserialize, Serialize};

use super::role::RoleId;

/// Identity of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A stored task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: TaskId,
    pub role_id: RoleId,
    pub task_description: String,
    /// `YYYY-MM-DD`, kept as text.
    pub completion_timeline: String,
}

/// Complete field set of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub role_id: RoleId,
    pub task_description: String,
    pub completion_timeline: String,
}

impl TaskDraft {
    #[must_use]
    pub fn into_task(self, task_id: TaskId) -> Task {
        Task {
            task_id,
            role_id: self.role_id,
            task_description: self.task_description,
            completion_timeline: self.completion_timeline,
        }
    }
}

/// Partial field set of a task. No task field is nullable, so an explicit
/// null is rejected by validation and ignored here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub role_id: Option<Option<RoleId>>,
    pub task_description: Option<Option<String>>,
    pub completion_timeline: Option<Option<String>>,
}

impl TaskPatch {
    #[must_use]
    pub fn apply_to(self, current: &Task) -> Task {
        let mut task = current.clone();
        if let Some(Some(role_id)) = self.role_id {
            task.role_id = role_id;
        }
        if let Some(Some(task_description)) = self.task_description {
            task.task_description = task_description;
        }
        if let Some(Some(completion_timeline)) = self.completion_timeline {
            task.completion_timeline = completion_timeline;
        }
        task
    }
}

/// How an update request changes a stored task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskChanges {
    Replace(TaskDraft),
    Merge(TaskPatch),
}

impl TaskChanges {
    #[must_use]
    pub fn apply_to(self, current: &Task) -> Task {
        match self {
            Self::Replace(draft) => draft.into_task(current.task_id),
            Self::Merge(patch) => patch.apply_to(current),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn stored_task() -> Task {
        Task {
            task_id: TaskId::new(4),
            role_id: RoleId::new(1),
            task_description: "Original task".to_string(),
            completion_timeline: "2025-12-31".to_string(),
        }
    }

    #[rstest]
    fn patch_keeps_timeline_when_only_description_given() {
        let patch = TaskPatch {
            task_description: Some(Some("Updated task description".to_string())),
            ..TaskPatch::default()
        };

        let updated = TaskChanges::Merge(patch).apply_to(&stored_task());

        assert_eq!(updated.task_description, "Updated task description");
        assert_eq!(updated.completion_timeline, "2025-12-31");
        assert_eq!(updated.task_id, TaskId::new(4));
    }

    #[rstest]
    fn empty_patch_leaves_task_unchanged() {
        let patch = TaskPatch::default();
        assert_eq!(patch.apply_to(&stored_task()), stored_task());
    }

    #[rstest]
    fn replace_keeps_identity() {
        let draft = TaskDraft {
            role_id: RoleId::new(2),
            task_description: "Rewrite the importer".to_string(),
            completion_timeline: "2026-01-31".to_string(),
        };

        let updated = TaskChanges::Replace(draft).apply_to(&stored_task());

        assert_eq!(updated.task_id, TaskId::new(4));
        assert_eq!(updated.role_id, RoleId::new(2));
        assert_eq!(updated.completion_timeline, "2026-01-31");
    }
}
