//! Repository factory for runtime backend selection.
//!
//! Picks the in-memory or `SQLite` store from configuration and hands the
//! three repositories out as trait objects.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `in_memory` (default) | `sqlite`
//! - `DATABASE_URL`: `SQLite` URL (required when `STORAGE_MODE=sqlite`)
//!
//! # Example
//!
//! ```ignore
//! use roster_api::infrastructure::{RepositoryConfig, RepositoryFactory};
//!
//! let config = RepositoryConfig::from_env()?;
//! let repositories = RepositoryFactory::new(config).create().await?;
//! let roles = repositories.role_repository.list().await?;
//! ```

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use super::{
    InMemoryStore, RepositoryError, RepositoryResult, RoleRepository, SqliteStore,
    TaskRepository, UserRepository,
};
use crate::domain::{NewRole, Role, validate_new_role};

// =============================================================================
// Configuration Types
// =============================================================================

/// Storage backend for roles, users and tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// Process-local tables; contents are lost on exit.
    #[default]
    InMemory,
    /// `SQLite` database addressed by `DATABASE_URL`.
    Sqlite,
}

impl FromStr for StorageMode {
    type Err = ConfigurationError;

    /// Parses a storage mode from a string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidStorageMode` if the string is not recognized.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(Self::InMemory),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            _ => Err(ConfigurationError::InvalidStorageMode(value.to_string())),
        }
    }
}

/// Configuration for repository factory.
#[derive(Debug, Clone, Default)]
pub struct RepositoryConfig {
    pub storage_mode: StorageMode,
    /// `SQLite` URL (required when `storage_mode` is `Sqlite`).
    pub database_url: Option<String>,
}

impl RepositoryConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RepositoryConfigBuilder {
        RepositoryConfigBuilder::default()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if `STORAGE_MODE` holds an unknown value
    /// or `DATABASE_URL` is missing when `STORAGE_MODE=sqlite`.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let storage_mode = match env::var("STORAGE_MODE") {
            Ok(value) => value.parse()?,
            Err(env::VarError::NotPresent) => StorageMode::default(),
            Err(env::VarError::NotUnicode(_)) => {
                return Err(ConfigurationError::InvalidStorageMode(
                    "<non-UTF-8 value>".to_string(),
                ));
            }
        };

        // Empty or whitespace-only counts as unset
        let database_url = env::var("DATABASE_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let config = Self {
            storage_mode,
            database_url,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingDatabaseUrl` if the `SQLite` backend
    /// is selected without a URL.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.storage_mode == StorageMode::Sqlite && self.database_url.is_none() {
            return Err(ConfigurationError::MissingDatabaseUrl);
        }
        Ok(())
    }
}

/// Builder for `RepositoryConfig`.
///
/// # Example
///
/// ```ignore
/// let config = RepositoryConfig::builder()
///     .storage_mode(StorageMode::Sqlite)
///     .database_url("sqlite://roster.db")
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct RepositoryConfigBuilder {
    storage_mode: StorageMode,
    database_url: Option<String>,
}

impl RepositoryConfigBuilder {
    #[must_use]
    pub const fn storage_mode(mut self, mode: StorageMode) -> Self {
        self.storage_mode = mode;
        self
    }

    #[must_use]
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the configuration is invalid.
    pub fn build(self) -> Result<RepositoryConfig, ConfigurationError> {
        let config = RepositoryConfig {
            storage_mode: self.storage_mode,
            database_url: self.database_url,
        };

        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// Invalid startup configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Invalid storage mode: '{0}'. Expected 'in_memory' or 'sqlite'")]
    InvalidStorageMode(String),

    #[error("DATABASE_URL environment variable is required when STORAGE_MODE=sqlite")]
    MissingDatabaseUrl,

    #[error("Invalid port: '{0}'. Expected an integer between 0 and 65535")]
    InvalidPort(String),
}

/// Errors that can occur during factory initialization.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Database connection error: {0}")]
    DatabaseConnection(String),
}

// =============================================================================
// Repositories
// =============================================================================

/// Collection of initialized repositories.
///
/// All repositories are wrapped in `Arc` so handlers can share them across
/// threads.
#[derive(Clone)]
pub struct Repositories {
    pub role_repository: Arc<dyn RoleRepository + Send + Sync>,
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub task_repository: Arc<dyn TaskRepository + Send + Sync>,
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Repositories")
            .field("role_repository", &"Arc<dyn RoleRepository>")
            .field("user_repository", &"Arc<dyn UserRepository>")
            .field("task_repository", &"Arc<dyn TaskRepository>")
            .finish()
    }
}

impl Repositories {
    /// Repositories over a fresh in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(&InMemoryStore::new())
    }

    #[must_use]
    pub fn from_in_memory(store: &InMemoryStore) -> Self {
        Self {
            role_repository: Arc::new(store.role_repository()),
            user_repository: Arc::new(store.user_repository()),
            task_repository: Arc::new(store.task_repository()),
        }
    }

    #[must_use]
    pub fn from_sqlite(store: &SqliteStore) -> Self {
        Self {
            role_repository: Arc::new(store.role_repository()),
            user_repository: Arc::new(store.user_repository()),
            task_repository: Arc::new(store.task_repository()),
        }
    }

    /// Creates every role in `names` that does not exist yet.
    ///
    /// Names failing field validation are skipped with a warning. Returns
    /// the roles actually created.
    ///
    /// # Errors
    ///
    /// Returns the first store failure other than a name conflict.
    pub async fn seed_roles(&self, names: &[String]) -> RepositoryResult<Vec<Role>> {
        let mut created = Vec::new();
        for name in names {
            let role = NewRole::new(name.clone());
            if let Err(error) = validate_new_role(&role) {
                tracing::warn!(role_name = %name, %error, "Skipping invalid seed role");
                continue;
            }
            match self.role_repository.create(role).await {
                Ok(role) => {
                    tracing::info!(role_id = %role.role_id, role_name = %role.role_name, "Seeded role");
                    created.push(role);
                }
                Err(RepositoryError::Conflict(_)) => {
                    tracing::debug!(role_name = %name, "Seed role already present");
                }
                Err(error) => return Err(error),
            }
        }
        Ok(created)
    }
}

// =============================================================================
// Repository Factory
// =============================================================================

/// Factory for creating repository instances based on configuration.
///
/// # Example
///
/// ```ignore
/// let factory = RepositoryFactory::new(RepositoryConfig::from_env()?);
/// let repositories = factory.create().await?;
/// ```
#[derive(Debug, Clone)]
pub struct RepositoryFactory {
    config: RepositoryConfig,
}

impl RepositoryFactory {
    #[must_use]
    pub const fn new(config: RepositoryConfig) -> Self {
        Self { config }
    }

    /// Creates all repositories based on the configuration.
    ///
    /// For `SQLite` this opens the pool and creates the schema.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if the database cannot be opened or initialised.
    pub async fn create(&self) -> Result<Repositories, FactoryError> {
        match self.config.storage_mode {
            StorageMode::InMemory => Ok(Repositories::in_memory()),
            StorageMode::Sqlite => {
                let store = self.create_sqlite_store().await?;
                Ok(Repositories::from_sqlite(&store))
            }
        }
    }

    async fn create_sqlite_store(&self) -> Result<SqliteStore, FactoryError> {
        let database_url = self
            .config
            .database_url
            .as_ref()
            .ok_or(ConfigurationError::MissingDatabaseUrl)?;

        SqliteStore::connect(database_url)
            .await
            .map_err(|error| FactoryError::DatabaseConnection(error.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================
