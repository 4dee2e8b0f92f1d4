//! `SQLite` repository implementations.
//!
//! Uses `sqlx` with a shared `SqlitePool`. Every mutation runs in its own
//! `BEGIN IMMEDIATE` transaction, so writers are serialized: the lookups
//! feeding the integrity checks and the write that follows cannot be
//! interleaved with another mutation. The table constraints below back the
//! checks up.
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TABLE roles (
//!     role_id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     role_name TEXT NOT NULL UNIQUE
//! );
//!
//! CREATE TABLE users (
//!     user_id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     first_name TEXT NOT NULL,
//!     last_name TEXT NOT NULL,
//!     email TEXT NOT NULL UNIQUE,
//!     hire_date TEXT NOT NULL,
//!     role_id INTEGER NOT NULL REFERENCES roles(role_id),
//!     bio TEXT
//! );
//!
//! CREATE TABLE tasks (
//!     task_id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     role_id INTEGER NOT NULL REFERENCES roles(role_id),
//!     task_description TEXT NOT NULL,
//!     completion_timeline TEXT NOT NULL
//! );
//! CREATE INDEX idx_users_role_id ON users(role_id);
//! CREATE INDEX idx_tasks_role_id ON tasks(role_id);
//! ```

use std::str::FromStr;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use sqlx::error::ErrorKind;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, Sqlite, SqliteConnection, SqlitePool, Transaction};

use crate::domain::{
    EntityKind, IntegrityError, NewRole, Role, RoleId, Task, TaskChanges, TaskDraft, TaskId, User,
    UserChanges, UserDraft, UserId, validate_role_create, validate_role_update,
    validate_user_email_unique, validate_user_role_ref,
};
use crate::infrastructure::{
    RepositoryError, RepositoryResult, RoleRepository, TaskRepository, UserRepository,
};

/// How long a writer waits for the database lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: [&str; 5] = [
    "CREATE TABLE IF NOT EXISTS roles (
        role_id INTEGER PRIMARY KEY AUTOINCREMENT,
        role_name TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS users (
        user_id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        hire_date TEXT NOT NULL,
        role_id INTEGER NOT NULL REFERENCES roles(role_id),
        bio TEXT
    )",
    "CREATE TABLE IF NOT EXISTS tasks (
        task_id INTEGER PRIMARY KEY AUTOINCREMENT,
        role_id INTEGER NOT NULL REFERENCES roles(role_id),
        task_description TEXT NOT NULL,
        completion_timeline TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_users_role_id ON users(role_id)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_role_id ON tasks(role_id)",
];

const USER_COLUMNS: &str = "user_id, first_name, last_name, email, hire_date, role_id, bio";
const TASK_COLUMNS: &str = "task_id, role_id, task_description, completion_timeline";

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, FromRow)]
struct RoleRow {
    role_id: i64,
    role_name: String,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Self::new(RoleId::new(row.role_id), row.role_name)
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    user_id: i64,
    first_name: String,
    last_name: String,
    email: String,
    hire_date: String,
    role_id: i64,
    bio: Option<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: UserId::new(row.user_id),
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            hire_date: row.hire_date,
            role_id: RoleId::new(row.role_id),
            bio: row.bio,
        }
    }
}

#[derive(Debug, FromRow)]
struct TaskRow {
    task_id: i64,
    role_id: i64,
    task_description: String,
    completion_timeline: String,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            task_id: TaskId::new(row.task_id),
            role_id: RoleId::new(row.role_id),
            task_description: row.task_description,
            completion_timeline: row.completion_timeline,
        }
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

fn database_error(error: &sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(error.to_string())
}

/// Maps a failed INSERT or UPDATE, turning constraint violations into the
/// domain outcome they stand for.
fn write_error(error: sqlx::Error, on_unique_violation: IntegrityError) -> RepositoryError {
    if let sqlx::Error::Database(database) = &error {
        match database.kind() {
            ErrorKind::UniqueViolation => return on_unique_violation.into(),
            ErrorKind::ForeignKeyViolation => return IntegrityError::UnknownRole.into(),
            _ => {}
        }
    }
    database_error(&error)
}

/// Opens a transaction holding the write lock from `BEGIN`, so concurrent
/// writers queue on the busy timeout instead of failing on lock upgrade.
async fn begin_write(pool: &SqlitePool) -> RepositoryResult<Transaction<'static, Sqlite>> {
    pool.begin_with("BEGIN IMMEDIATE")
        .await
        .map_err(|error| database_error(&error))
}

async fn role_exists(connection: &mut SqliteConnection, role_id: RoleId) -> RepositoryResult<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT role_id FROM roles WHERE role_id = ?")
        .bind(role_id.get())
        .fetch_optional(&mut *connection)
        .await
        .map_err(|error| database_error(&error))?;
    Ok(row.is_some())
}

async fn email_holder(
    connection: &mut SqliteConnection,
    email: &str,
) -> RepositoryResult<Option<UserId>> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT user_id FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(&mut *connection)
        .await
        .map_err(|error| database_error(&error))?;
    Ok(row.map(|(user_id,)| UserId::new(user_id)))
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

// =============================================================================
// SQLite Store
// =============================================================================

/// Connection pool plus the repositories built on it.
///
/// # Example
///
/// ```ignore
/// let store = SqliteStore::connect("sqlite://roster.db").await?;
/// let users = store.user_repository();
/// ```
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if missing) the database at `url` and ensures the
    /// schema exists.
    ///
    /// An in-memory URL gets a single long-lived connection, since every
    /// `SQLite` connection to `:memory:` opens a fresh database.
    ///
    /// # Errors
    ///
    /// Returns the `sqlx` error if the URL is malformed, the database cannot
    /// be opened, or the schema cannot be created.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool_options = if is_memory_url(url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let store = Self {
            pool: pool_options.connect_with(options).await?,
        };
        store.initialize_schema().await?;
        Ok(store)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns the `sqlx` error if the schema cannot be created.
    pub async fn connect_in_memory() -> Result<Self, sqlx::Error> {
        Self::connect("sqlite::memory:").await
    }

    /// Creates the tables and indexes if they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns the `sqlx` error of the first failing statement.
    pub async fn initialize_schema(&self) -> Result<(), sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    #[must_use]
    pub fn role_repository(&self) -> SqliteRoleRepository {
        SqliteRoleRepository {
            pool: self.pool.clone(),
        }
    }

    #[must_use]
    pub fn user_repository(&self) -> SqliteUserRepository {
        SqliteUserRepository {
            pool: self.pool.clone(),
        }
    }

    #[must_use]
    pub fn task_repository(&self) -> SqliteTaskRepository {
        SqliteTaskRepository {
            pool: self.pool.clone(),
        }
    }
}

// =============================================================================
// SQLite Role Repository
// =============================================================================

/// `SQLite` implementation of `RoleRepository`.
#[derive(Debug, Clone)]
pub struct SqliteRoleRepository {
    pool: SqlitePool,
}

impl RoleRepository for SqliteRoleRepository {
    fn create(&self, role: NewRole) -> BoxFuture<'static, RepositoryResult<Role>> {
        let pool = self.pool.clone();
        async move {
            let mut transaction = begin_write(&pool).await?;

            let holder: Option<RoleRow> =
                sqlx::query_as("SELECT role_id, role_name FROM roles WHERE role_name = ?")
                    .bind(&role.role_name)
                    .fetch_optional(&mut *transaction)
                    .await
                    .map_err(|error| database_error(&error))?;
            validate_role_create(holder.map(Role::from).as_ref())?;

            let result = sqlx::query("INSERT INTO roles (role_name) VALUES (?)")
                .bind(&role.role_name)
                .execute(&mut *transaction)
                .await
                .map_err(|error| write_error(error, IntegrityError::DuplicateRoleName))?;

            transaction.commit().await.map_err(|error| database_error(&error))?;
            Ok(role.into_role(RoleId::new(result.last_insert_rowid())))
        }
        .boxed()
    }

    fn find_by_id(&self, id: RoleId) -> BoxFuture<'static, RepositoryResult<Option<Role>>> {
        let pool = self.pool.clone();
        async move {
            let row: Option<RoleRow> =
                sqlx::query_as("SELECT role_id, role_name FROM roles WHERE role_id = ?")
                    .bind(id.get())
                    .fetch_optional(&pool)
                    .await
                    .map_err(|error| database_error(&error))?;
            Ok(row.map(Role::from))
        }
        .boxed()
    }

    fn list(&self) -> BoxFuture<'static, RepositoryResult<Vec<Role>>> {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<RoleRow> =
                sqlx::query_as("SELECT role_id, role_name FROM roles ORDER BY role_id")
                    .fetch_all(&pool)
                    .await
                    .map_err(|error| database_error(&error))?;
            Ok(rows.into_iter().map(Role::from).collect())
        }
        .boxed()
    }

    fn update(&self, id: RoleId, role: NewRole) -> BoxFuture<'static, RepositoryResult<Role>> {
        let pool = self.pool.clone();
        async move {
            let mut transaction = begin_write(&pool).await?;

            let target: Option<RoleRow> =
                sqlx::query_as("SELECT role_id, role_name FROM roles WHERE role_id = ?")
                    .bind(id.get())
                    .fetch_optional(&mut *transaction)
                    .await
                    .map_err(|error| database_error(&error))?;
            let holder: Option<RoleRow> =
                sqlx::query_as("SELECT role_id, role_name FROM roles WHERE role_name = ?")
                    .bind(&role.role_name)
                    .fetch_optional(&mut *transaction)
                    .await
                    .map_err(|error| database_error(&error))?;
            validate_role_update(
                id,
                target.map(Role::from).as_ref(),
                holder.map(Role::from).as_ref(),
            )?;

            sqlx::query("UPDATE roles SET role_name = ? WHERE role_id = ?")
                .bind(&role.role_name)
                .bind(id.get())
                .execute(&mut *transaction)
                .await
                .map_err(|error| write_error(error, IntegrityError::DuplicateRoleName))?;

            transaction.commit().await.map_err(|error| database_error(&error))?;
            Ok(role.into_role(id))
        }
        .boxed()
    }
}

// =============================================================================
// SQLite User Repository
// =============================================================================

/// `SQLite` implementation of `UserRepository`.
#[derive(Debug, Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl UserRepository for SqliteUserRepository {
    fn create(&self, user: UserDraft) -> BoxFuture<'static, RepositoryResult<User>> {
        let pool = self.pool.clone();
        async move {
            let mut transaction = begin_write(&pool).await?;

            validate_user_email_unique(email_holder(&mut transaction, &user.email).await?, None)?;
            validate_user_role_ref(role_exists(&mut transaction, user.role_id).await?)?;

            let result = sqlx::query(
                "INSERT INTO users (first_name, last_name, email, hire_date, role_id, bio)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(&user.hire_date)
            .bind(user.role_id.get())
            .bind(&user.bio)
            .execute(&mut *transaction)
            .await
            .map_err(|error| write_error(error, IntegrityError::DuplicateEmail))?;

            transaction.commit().await.map_err(|error| database_error(&error))?;
            Ok(user.into_user(UserId::new(result.last_insert_rowid())))
        }
        .boxed()
    }

    fn find_by_id(&self, id: UserId) -> BoxFuture<'static, RepositoryResult<Option<User>>> {
        let pool = self.pool.clone();
        async move {
            let row: Option<UserRow> =
                sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?"))
                    .bind(id.get())
                    .fetch_optional(&pool)
                    .await
                    .map_err(|error| database_error(&error))?;
            Ok(row.map(User::from))
        }
        .boxed()
    }

    fn list(&self) -> BoxFuture<'static, RepositoryResult<Vec<User>>> {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<UserRow> =
                sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY user_id"))
                    .fetch_all(&pool)
                    .await
                    .map_err(|error| database_error(&error))?;
            Ok(rows.into_iter().map(User::from).collect())
        }
        .boxed()
    }

    fn update(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> BoxFuture<'static, RepositoryResult<User>> {
        let pool = self.pool.clone();
        async move {
            let mut transaction = begin_write(&pool).await?;

            let current: Option<UserRow> =
                sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?"))
                    .bind(id.get())
                    .fetch_optional(&mut *transaction)
                    .await
                    .map_err(|error| database_error(&error))?;
            let current = User::from(current.ok_or(RepositoryError::NotFound(EntityKind::User))?);
            let updated = changes.apply_to(&current);

            validate_user_email_unique(
                email_holder(&mut transaction, &updated.email).await?,
                Some(id),
            )?;
            validate_user_role_ref(role_exists(&mut transaction, updated.role_id).await?)?;

            sqlx::query(
                "UPDATE users
                 SET first_name = ?, last_name = ?, email = ?, hire_date = ?, role_id = ?, bio = ?
                 WHERE user_id = ?",
            )
            .bind(&updated.first_name)
            .bind(&updated.last_name)
            .bind(&updated.email)
            .bind(&updated.hire_date)
            .bind(updated.role_id.get())
            .bind(&updated.bio)
            .bind(id.get())
            .execute(&mut *transaction)
            .await
            .map_err(|error| write_error(error, IntegrityError::DuplicateEmail))?;

            transaction.commit().await.map_err(|error| database_error(&error))?;
            Ok(updated)
        }
        .boxed()
    }

    fn delete(&self, id: UserId) -> BoxFuture<'static, RepositoryResult<bool>> {
        let pool = self.pool.clone();
        async move {
            let result = sqlx::query("DELETE FROM users WHERE user_id = ?")
                .bind(id.get())
                .execute(&pool)
                .await
                .map_err(|error| database_error(&error))?;
            Ok(result.rows_affected() > 0)
        }
        .boxed()
    }
}

// =============================================================================
// SQLite Task Repository
// =============================================================================

/// `SQLite` implementation of `TaskRepository`.
#[derive(Debug, Clone)]
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl TaskRepository for SqliteTaskRepository {
    fn create(&self, task: TaskDraft) -> BoxFuture<'static, RepositoryResult<Task>> {
        let pool = self.pool.clone();
        async move {
            let mut transaction = begin_write(&pool).await?;

            validate_user_role_ref(role_exists(&mut transaction, task.role_id).await?)?;

            let result = sqlx::query(
                "INSERT INTO tasks (role_id, task_description, completion_timeline)
                 VALUES (?, ?, ?)",
            )
            .bind(task.role_id.get())
            .bind(&task.task_description)
            .bind(&task.completion_timeline)
            .execute(&mut *transaction)
            .await
            .map_err(|error| write_error(error, IntegrityError::UnknownRole))?;

            transaction.commit().await.map_err(|error| database_error(&error))?;
            Ok(task.into_task(TaskId::new(result.last_insert_rowid())))
        }
        .boxed()
    }

    fn find_by_id(&self, id: TaskId) -> BoxFuture<'static, RepositoryResult<Option<Task>>> {
        let pool = self.pool.clone();
        async move {
            let row: Option<TaskRow> =
                sqlx::query_as(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE task_id = ?"))
                    .bind(id.get())
                    .fetch_optional(&pool)
                    .await
                    .map_err(|error| database_error(&error))?;
            Ok(row.map(Task::from))
        }
        .boxed()
    }

    fn list(&self) -> BoxFuture<'static, RepositoryResult<Vec<Task>>> {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<TaskRow> =
                sqlx::query_as(&format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY task_id"))
                    .fetch_all(&pool)
                    .await
                    .map_err(|error| database_error(&error))?;
            Ok(rows.into_iter().map(Task::from).collect())
        }
        .boxed()
    }

    fn list_by_role(&self, role_id: RoleId) -> BoxFuture<'static, RepositoryResult<Vec<Task>>> {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<TaskRow> = sqlx::query_as(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE role_id = ? ORDER BY task_id"
            ))
            .bind(role_id.get())
            .fetch_all(&pool)
            .await
            .map_err(|error| database_error(&error))?;
            Ok(rows.into_iter().map(Task::from).collect())
        }
        .boxed()
    }

    fn update(
        &self,
        id: TaskId,
        changes: TaskChanges,
    ) -> BoxFuture<'static, RepositoryResult<Task>> {
        let pool = self.pool.clone();
        async move {
            let mut transaction = begin_write(&pool).await?;

            let current: Option<TaskRow> =
                sqlx::query_as(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE task_id = ?"))
                    .bind(id.get())
                    .fetch_optional(&mut *transaction)
                    .await
                    .map_err(|error| database_error(&error))?;
            let current = Task::from(current.ok_or(RepositoryError::NotFound(EntityKind::Task))?);
            let updated = changes.apply_to(&current);

            validate_user_role_ref(role_exists(&mut transaction, updated.role_id).await?)?;

            sqlx::query(
                "UPDATE tasks SET role_id = ?, task_description = ?, completion_timeline = ?
                 WHERE task_id = ?",
            )
            .bind(updated.role_id.get())
            .bind(&updated.task_description)
            .bind(&updated.completion_timeline)
            .bind(id.get())
            .execute(&mut *transaction)
            .await
            .map_err(|error| write_error(error, IntegrityError::UnknownRole))?;

            transaction.commit().await.map_err(|error| database_error(&error))?;
            Ok(updated)
        }
        .boxed()
    }

    fn delete(&self, id: TaskId) -> BoxFuture<'static, RepositoryResult<bool>> {
        let pool = self.pool.clone();
        async move {
            let result = sqlx::query("DELETE FROM tasks WHERE task_id = ?")
                .bind(id.get())
                .execute(&pool)
                .await
                .map_err(|error| database_error(&error))?;
            Ok(result.rows_affected() > 0)
        }
        .boxed()
    }
}

// =============================================================================
// Tests
// =============================================================================
