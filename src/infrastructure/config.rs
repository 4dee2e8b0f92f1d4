//! Server configuration loaded from environment variables.
//!
//! Covers the listen address, the CORS allow-list and the roles seeded at
//! startup. Backend selection lives in [`RepositoryConfig`](super::RepositoryConfig).
//!
//! # Environment Variables
//!
//! - `HOST`: listen host (default: `127.0.0.1`)
//! - `PORT`: listen port (default: `8000`)
//! - `CORS_ALLOWED_ORIGINS`: comma-separated origins, or `*` (default: local
//!   frontend dev origins)
//! - `SEED_ROLES`: comma-separated role names created at startup (default: none)

use std::env;

use super::ConfigurationError;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;

/// Origins of the local frontend dev servers.
pub const DEFAULT_CORS_ORIGINS: [&str; 6] = [
    "http://localhost:8080",
    "http://localhost:8900",
    "http://localhost:3000",
    "http://127.0.0.1:8080",
    "http://127.0.0.1:8900",
    "http://127.0.0.1:3000",
];

/// Origins allowed to make cross-origin requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

impl Default for CorsOrigins {
    fn default() -> Self {
        Self::List(DEFAULT_CORS_ORIGINS.map(String::from).to_vec())
    }
}

impl CorsOrigins {
    /// A `*` anywhere in the list allows every origin.
    fn parse(value: &str) -> Self {
        let origins = split_list(value);
        if origins.iter().any(|origin| origin == "*") {
            Self::Any
        } else {
            Self::List(origins)
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: CorsOrigins,
    /// Role names to create at startup if absent.
    pub seed_roles: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_allowed_origins: CorsOrigins::default(),
            seed_roles: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidPort` if `PORT` is not a valid port.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to
    /// its value. Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidPort` if `PORT` is not a valid port.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigurationError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let host = get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get("PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigurationError::InvalidPort(value))?,
            None => DEFAULT_PORT,
        };
        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .map(|value| CorsOrigins::parse(&value))
            .unwrap_or_default();
        let seed_roles = get("SEED_ROLES")
            .map(|value| split_list(&value))
            .unwrap_or_default();

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            seed_roles,
        })
    }

    /// Returns `host:port`, bracketing IPv6 hosts.
    #[must_use]
    pub fn socket_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}
