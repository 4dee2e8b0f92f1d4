//! Infrastructure module for storage and configuration.
//!
//! This module contains the repository traits, the in-memory and `SQLite`
//! backends, backend selection and server configuration.

pub mod config;
pub mod factory;
pub mod in_memory;
pub mod repository;
pub mod sqlite;

pub use config::{CorsOrigins, DEFAULT_CORS_ORIGINS, ServerConfig};
pub use factory::{
    ConfigurationError, FactoryError, Repositories, RepositoryConfig, RepositoryConfigBuilder,
    RepositoryFactory, StorageMode,
};
pub use in_memory::{
    InMemoryRoleRepository, InMemoryStore, InMemoryTaskRepository, InMemoryUserRepository,
};
pub use repository::{
    RepositoryError, RepositoryResult, RoleRepository, TaskRepository, UserRepository,
};
pub use sqlite::{SqliteRoleRepository, SqliteStore, SqliteTaskRepository, SqliteUserRepository};
