//! In-memory repository implementations.
//!
//! All three collections live in one [`Tables`] value behind a single
//! `tokio::sync::RwLock`. Every mutation takes the write guard, runs its
//! existence / reference / uniqueness checks and writes before releasing
//! it, so two concurrent requests can never both pass a uniqueness check.
//!
//! Each [`InMemoryStore`] owns its own tables; independent stores can
//! coexist in one process.
//!
//! # Example
//!
//! ```ignore
//! use roster_api::infrastructure::InMemoryStore;
//!
//! let store = InMemoryStore::new();
//! let roles = store.role_repository();
//! let role = roles.create(NewRole::new("Developer")).await?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::domain::{
    EntityKind, NewRole, Role, RoleId, Task, TaskChanges, TaskDraft, TaskId, User, UserChanges,
    UserDraft, UserId, validate_role_create, validate_role_update, validate_user_email_unique,
    validate_user_role_ref,
};
use crate::infrastructure::{
    RepositoryError, RepositoryResult, RoleRepository, TaskRepository, UserRepository,
};

// =============================================================================
// Tables
// =============================================================================

/// The three collections plus their identity counters.
///
/// Maps are keyed by identity and identities only grow, so iteration order
/// is insertion order.
#[derive(Debug, Default)]
struct Tables {
    roles: BTreeMap<RoleId, Role>,
    users: BTreeMap<UserId, User>,
    tasks: BTreeMap<TaskId, Task>,
    last_role_id: i64,
    last_user_id: i64,
    last_task_id: i64,
}

impl Tables {
    fn role_named(&self, role_name: &str) -> Option<&Role> {
        self.roles.values().find(|role| role.role_name == role_name)
    }

    fn user_with_email(&self, email: &str) -> Option<UserId> {
        self.users
            .values()
            .find(|user| user.email == email)
            .map(|user| user.user_id)
    }

    const fn next_role_id(&mut self) -> RoleId {
        self.last_role_id += 1;
        RoleId::new(self.last_role_id)
    }

    const fn next_user_id(&mut self) -> UserId {
        self.last_user_id += 1;
        UserId::new(self.last_user_id)
    }

    const fn next_task_id(&mut self) -> TaskId {
        self.last_task_id += 1;
        TaskId::new(self.last_task_id)
    }
}

type SharedTables = Arc<RwLock<Tables>>;

// =============================================================================
// In-Memory Store
// =============================================================================

/// Owner of one set of in-memory tables.
///
/// Hands out repositories that share those tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: SharedTables,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn role_repository(&self) -> InMemoryRoleRepository {
        InMemoryRoleRepository {
            tables: Arc::clone(&self.tables),
        }
    }

    #[must_use]
    pub fn user_repository(&self) -> InMemoryUserRepository {
        InMemoryUserRepository {
            tables: Arc::clone(&self.tables),
        }
    }

    #[must_use]
    pub fn task_repository(&self) -> InMemoryTaskRepository {
        InMemoryTaskRepository {
            tables: Arc::clone(&self.tables),
        }
    }
}

// =============================================================================
// In-Memory Role Repository
// =============================================================================

/// In-memory implementation of `RoleRepository`.
#[derive(Debug, Clone)]
pub struct InMemoryRoleRepository {
    tables: SharedTables,
}

impl RoleRepository for InMemoryRoleRepository {
    fn create(&self, role: NewRole) -> BoxFuture<'static, RepositoryResult<Role>> {
        let tables = Arc::clone(&self.tables);
        async move {
            let mut guard = tables.write().await;
            validate_role_create(guard.role_named(&role.role_name))?;

            let role = role.into_role(guard.next_role_id());
            guard.roles.insert(role.role_id, role.clone());
            Ok(role)
        }
        .boxed()
    }

    fn find_by_id(&self, id: RoleId) -> BoxFuture<'static, RepositoryResult<Option<Role>>> {
        let tables = Arc::clone(&self.tables);
        async move {
            let guard = tables.read().await;
            Ok(guard.roles.get(&id).cloned())
        }
        .boxed()
    }

    fn list(&self) -> BoxFuture<'static, RepositoryResult<Vec<Role>>> {
        let tables = Arc::clone(&self.tables);
        async move {
            let guard = tables.read().await;
            Ok(guard.roles.values().cloned().collect())
        }
        .boxed()
    }

    fn update(&self, id: RoleId, role: NewRole) -> BoxFuture<'static, RepositoryResult<Role>> {
        let tables = Arc::clone(&self.tables);
        async move {
            let mut guard = tables.write().await;
            validate_role_update(id, guard.roles.get(&id), guard.role_named(&role.role_name))?;

            let role = role.into_role(id);
            guard.roles.insert(id, role.clone());
            Ok(role)
        }
        .boxed()
    }
}

// =============================================================================
// In-Memory User Repository
// =============================================================================

/// In-memory implementation of `UserRepository`.
#[derive(Debug, Clone)]
pub struct InMemoryUserRepository {
    tables: SharedTables,
}

impl UserRepository for InMemoryUserRepository {
    fn create(&self, user: UserDraft) -> BoxFuture<'static, RepositoryResult<User>> {
        let tables = Arc::clone(&self.tables);
        async move {
            let mut guard = tables.write().await;
            validate_user_email_unique(guard.user_with_email(&user.email), None)?;
            validate_user_role_ref(guard.roles.contains_key(&user.role_id))?;

            let user = user.into_user(guard.next_user_id());
            guard.users.insert(user.user_id, user.clone());
            Ok(user)
        }
        .boxed()
    }

    fn find_by_id(&self, id: UserId) -> BoxFuture<'static, RepositoryResult<Option<User>>> {
        let tables = Arc::clone(&self.tables);
        async move {
            let guard = tables.read().await;
            Ok(guard.users.get(&id).cloned())
        }
        .boxed()
    }

    fn list(&self) -> BoxFuture<'static, RepositoryResult<Vec<User>>> {
        let tables = Arc::clone(&self.tables);
        async move {
            let guard = tables.read().await;
            Ok(guard.users.values().cloned().collect())
        }
        .boxed()
    }

    fn update(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> BoxFuture<'static, RepositoryResult<User>> {
        let tables = Arc::clone(&self.tables);
        async move {
            let mut guard = tables.write().await;
            let current = guard
                .users
                .get(&id)
                .ok_or(RepositoryError::NotFound(EntityKind::User))?;
            let updated = changes.apply_to(current);

            validate_user_email_unique(guard.user_with_email(&updated.email), Some(id))?;
            validate_user_role_ref(guard.roles.contains_key(&updated.role_id))?;

            guard.users.insert(id, updated.clone());
            Ok(updated)
        }
        .boxed()
    }

    fn delete(&self, id: UserId) -> BoxFuture<'static, RepositoryResult<bool>> {
        let tables = Arc::clone(&self.tables);
        async move {
            let mut guard = tables.write().await;
            Ok(guard.users.remove(&id).is_some())
        }
        .boxed()
    }
}

// =============================================================================
// In-Memory Task Repository
// =============================================================================

/// In-memory implementation of `TaskRepository`.
#[derive(Debug, Clone)]
pub struct InMemoryTaskRepository {
    tables: SharedTables,
}

impl TaskRepository for InMemoryTaskRepository {
    fn create(&self, task: TaskDraft) -> BoxFuture<'static, RepositoryResult<Task>> {
        let tables = Arc::clone(&self.tables);
        async move {
            let mut guard = tables.write().await;
            validate_user_role_ref(guard.roles.contains_key(&task.role_id))?;

            let task = task.into_task(guard.next_task_id());
            guard.tasks.insert(task.task_id, task.clone());
            Ok(task)
        }
        .boxed()
    }

    fn find_by_id(&self, id: TaskId) -> BoxFuture<'static, RepositoryResult<Option<Task>>> {
        let tables = Arc::clone(&self.tables);
        async move {
            let guard = tables.read().await;
            Ok(guard.tasks.get(&id).cloned())
        }
        .boxed()
    }

    fn list(&self) -> BoxFuture<'static, RepositoryResult<Vec<Task>>> {
        let tables = Arc::clone(&self.tables);
        async move {
            let guard = tables.read().await;
            Ok(guard.tasks.values().cloned().collect())
        }
        .boxed()
    }

    fn list_by_role(&self, role_id: RoleId) -> BoxFuture<'static, RepositoryResult<Vec<Task>>> {
        let tables = Arc::clone(&self.tables);
        async move {
            let guard = tables.read().await;
            Ok(guard
                .tasks
                .values()
                .filter(|task| task.role_id == role_id)
                .cloned()
                .collect())
        }
        .boxed()
    }

    fn update(
        &self,
        id: TaskId,
        changes: TaskChanges,
    ) -> BoxFuture<'static, RepositoryResult<Task>> {
        let tables = Arc::clone(&self.tables);
        async move {
            let mut guard = tables.write().await;
            let current = guard
                .tasks
                .get(&id)
                .ok_or(RepositoryError::NotFound(EntityKind::Task))?;
            let updated = changes.apply_to(current);

            validate_user_role_ref(guard.roles.contains_key(&updated.role_id))?;

            guard.tasks.insert(id, updated.clone());
            Ok(updated)
        }
        .boxed()
    }

    fn delete(&self, id: TaskId) -> BoxFuture<'static, RepositoryResult<bool>> {
        let tables = Arc::clone(&self.tables);
        async move {
            let mut guard = tables.write().await;
            Ok(guard.tasks.remove(&id).is_some())
        }
        .boxed()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TaskPatch, UserPatch};
    use proptest::prelude::*;
    use rstest::rstest;

    fn user_draft(email: &str, role_id: RoleId) -> UserDraft {
        UserDraft {
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: email.to_string(),
            hire_date: "2025-01-01".to_string(),
            role_id,
            bio: None,
        }
    }

    fn task_draft(description: &str, role_id: RoleId) -> TaskDraft {
        TaskDraft {
            role_id,
            task_description: description.to_string(),
            completion_timeline: "2025-12-31".to_string(),
        }
    }

    // -------------------------------------------------------------------------
    // Roles
    // -------------------------------------------------------------------------

    #[rstest]
    #[tokio::test]
    async fn first_role_gets_identity_one() {
        let roles = InMemoryStore::new().role_repository();

        let role = roles.create(NewRole::new("Developer")).await.unwrap();

        assert_eq!(role, Role::new(RoleId::new(1), "Developer"));
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_role_name_is_a_conflict() {
        let roles = InMemoryStore::new().role_repository();
        roles.create(NewRole::new("Developer")).await.unwrap();

        let result = roles.create(NewRole::new("Developer")).await;

        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
        assert_eq!(roles.list().await.unwrap().len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn role_names_compare_case_sensitively() {
        let roles = InMemoryStore::new().role_repository();
        roles.create(NewRole::new("admin")).await.unwrap();

        assert!(roles.create(NewRole::new("Admin")).await.is_ok());
    }

    #[rstest]
    #[tokio::test]
    async fn roles_list_in_insertion_order() {
        let roles = InMemoryStore::new().role_repository();
        for name in ["Manager", "Analyst", "Developer"] {
            roles.create(NewRole::new(name)).await.unwrap();
        }

        let names: Vec<String> = roles
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|role| role.role_name)
            .collect();

        assert_eq!(names, ["Manager", "Analyst", "Developer"]);
    }

    #[rstest]
    #[tokio::test]
    async fn role_update_outcomes() {
        let roles = InMemoryStore::new().role_repository();
        let developer = roles.create(NewRole::new("Developer")).await.unwrap();
        roles.create(NewRole::new("Manager")).await.unwrap();

        assert_eq!(
            roles.update(RoleId::new(42), NewRole::new("Tester")).await,
            Err(RepositoryError::NotFound(EntityKind::Role))
        );
        assert!(matches!(
            roles
                .update(developer.role_id, NewRole::new("Manager"))
                .await,
            Err(RepositoryError::Conflict(_))
        ));
        assert_eq!(
            roles
                .update(developer.role_id, NewRole::new("Developer"))
                .await
                .unwrap()
                .role_name,
            "Developer"
        );

        let renamed = roles
            .update(developer.role_id, NewRole::new("Engineer"))
            .await
            .unwrap();
        assert_eq!(renamed.role_id, developer.role_id);
        assert_eq!(
            roles.find_by_id(developer.role_id).await.unwrap(),
            Some(renamed)
        );
    }

    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    #[rstest]
    #[tokio::test]
    async fn user_with_unknown_role_is_invalid_reference() {
        let store = InMemoryStore::new();

        let result = store
            .user_repository()
            .create(user_draft("test@example.com", RoleId::new(999)))
            .await;

        assert_eq!(
            result,
            Err(RepositoryError::InvalidReference("Invalid role_id".to_string()))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_email_wins_over_unknown_role() {
        let store = InMemoryStore::new();
        let role = store
            .role_repository()
            .create(NewRole::new("Developer"))
            .await
            .unwrap();
        let users = store.user_repository();
        users
            .create(user_draft("test@example.com", role.role_id))
            .await
            .unwrap();

        let result = users
            .create(user_draft("test@example.com", RoleId::new(77)))
            .await;

        assert_eq!(
            result,
            Err(RepositoryError::Conflict("Email already exists".to_string()))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn user_round_trip_and_delete() {
        let store = InMemoryStore::new();
        let role = store
            .role_repository()
            .create(NewRole::new("Developer"))
            .await
            .unwrap();
        let users = store.user_repository();

        let created = users
            .create(user_draft("test@example.com", role.role_id))
            .await
            .unwrap();
        assert_eq!(
            users.find_by_id(created.user_id).await.unwrap(),
            Some(created.clone())
        );

        assert!(users.delete(created.user_id).await.unwrap());
        assert!(!users.delete(created.user_id).await.unwrap());
        assert_eq!(users.find_by_id(created.user_id).await.unwrap(), None);
    }

    #[rstest]
    #[tokio::test]
    async fn user_identities_are_not_reused_after_delete() {
        let store = InMemoryStore::new();
        let role = store
            .role_repository()
            .create(NewRole::new("Developer"))
            .await
            .unwrap();
        let users = store.user_repository();

        let first = users
            .create(user_draft("one@example.com", role.role_id))
            .await
            .unwrap();
        users.delete(first.user_id).await.unwrap();
        let second = users
            .create(user_draft("two@example.com", role.role_id))
            .await
            .unwrap();

        assert!(second.user_id > first.user_id);
    }

    #[rstest]
    #[tokio::test]
    async fn user_update_may_keep_own_email_but_not_take_another() {
        let store = InMemoryStore::new();
        let role = store
            .role_repository()
            .create(NewRole::new("Developer"))
            .await
            .unwrap();
        let users = store.user_repository();
        let john = users
            .create(user_draft("john@example.com", role.role_id))
            .await
            .unwrap();
        users
            .create(user_draft("jane@example.com", role.role_id))
            .await
            .unwrap();

        let keep = users
            .update(
                john.user_id,
                UserChanges::Replace(user_draft("john@example.com", role.role_id)),
            )
            .await;
        assert!(keep.is_ok());

        let take = users
            .update(
                john.user_id,
                UserChanges::Merge(UserPatch {
                    email: Some(Some("jane@example.com".to_string())),
                    ..UserPatch::default()
                }),
            )
            .await;
        assert_eq!(
            take,
            Err(RepositoryError::Conflict("Email already exists".to_string()))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn user_update_of_missing_user_is_not_found() {
        let users = InMemoryStore::new().user_repository();

        let result = users
            .update(UserId::new(5), UserChanges::Merge(UserPatch::default()))
            .await;

        assert_eq!(result, Err(RepositoryError::NotFound(EntityKind::User)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_with_same_email_admit_one() {
        let store = InMemoryStore::new();
        let role = store
            .role_repository()
            .create(NewRole::new("Developer"))
            .await
            .unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let users = store.user_repository();
                tokio::spawn(users.create(user_draft("race@example.com", role.role_id)))
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 1);
        assert_eq!(store.user_repository().list().await.unwrap().len(), 1);
    }

    // -------------------------------------------------------------------------
    // Tasks
    // -------------------------------------------------------------------------

    #[rstest]
    #[tokio::test]
    async fn tasks_list_by_role() {
        let store = InMemoryStore::new();
        let roles = store.role_repository();
        let developer = roles.create(NewRole::new("Developer")).await.unwrap();
        let manager = roles.create(NewRole::new("Manager")).await.unwrap();
        let tasks = store.task_repository();
        tasks
            .create(task_draft("Task 1 for Developer", developer.role_id))
            .await
            .unwrap();
        tasks
            .create(task_draft("Task for Manager", manager.role_id))
            .await
            .unwrap();
        tasks
            .create(task_draft("Task 2 for Developer", developer.role_id))
            .await
            .unwrap();

        let developer_tasks = tasks.list_by_role(developer.role_id).await.unwrap();

        assert_eq!(developer_tasks.len(), 2);
        assert_eq!(developer_tasks[0].task_description, "Task 1 for Developer");
        assert_eq!(developer_tasks[1].task_description, "Task 2 for Developer");
        assert_eq!(tasks.list_by_role(manager.role_id).await.unwrap().len(), 1);
        assert_eq!(tasks.list().await.unwrap().len(), 3);
    }

    #[rstest]
    #[tokio::test]
    async fn task_reassignment_to_unknown_role_is_rejected() {
        let store = InMemoryStore::new();
        let role = store
            .role_repository()
            .create(NewRole::new("Developer"))
            .await
            .unwrap();
        let tasks = store.task_repository();
        let task = tasks
            .create(task_draft("Write the report", role.role_id))
            .await
            .unwrap();

        let result = tasks
            .update(
                task.task_id,
                TaskChanges::Merge(TaskPatch {
                    role_id: Some(Some(RoleId::new(12))),
                    ..TaskPatch::default()
                }),
            )
            .await;

        assert!(matches!(result, Err(RepositoryError::InvalidReference(_))));
        assert_eq!(tasks.find_by_id(task.task_id).await.unwrap(), Some(task));
    }

    #[rstest]
    #[tokio::test]
    async fn separate_stores_do_not_share_records() {
        let first = InMemoryStore::new();
        let second = InMemoryStore::new();
        first
            .role_repository()
            .create(NewRole::new("Developer"))
            .await
            .unwrap();

        assert!(second.role_repository().list().await.unwrap().is_empty());
        assert!(
            second
                .role_repository()
                .create(NewRole::new("Developer"))
                .await
                .is_ok()
        );
    }

    proptest! {
        #[test]
        fn creating_a_role_twice_leaves_exactly_one(name in "[A-Za-z ]{2,30}") {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            let roles = InMemoryStore::new().role_repository();

            let (first, second, listed) = runtime.block_on(async {
                let first = roles.create(NewRole::new(name.clone())).await;
                let second = roles.create(NewRole::new(name.clone())).await;
                let listed = roles.list().await.unwrap();
                (first, second, listed)
            });

            prop_assert!(first.is_ok());
            prop_assert!(matches!(second, Err(RepositoryError::Conflict(_))));
            prop_assert_eq!(
                listed.iter().filter(|role| role.role_name == name).count(),
                1
            );
        }
    }
}
