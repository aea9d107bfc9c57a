//! Store connection configuration
//!
//! Connection settings are supplied by the environment at process start and
//! validated before any connection is attempted, so a missing credential fails
//! fast with [`StoreError::Configuration`] instead of surfacing later as a
//! network error.

use crate::db::error::StoreError;
use serde::{Deserialize, Serialize};

pub const ENV_URI: &str = "NEO4J_URI";
pub const ENV_USER: &str = "NEO4J_USER";
pub const ENV_PASSWORD: &str = "NEO4J_PASSWORD";
pub const ENV_MAX_CONNECTIONS: &str = "NEO4J_MAX_CONNECTIONS";
pub const ENV_FETCH_SIZE: &str = "NEO4J_FETCH_SIZE";

const DEFAULT_MAX_CONNECTIONS: usize = 16;
const DEFAULT_FETCH_SIZE: usize = 200;

/// Connection settings for the graph store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Bolt URI, e.g. `neo4j://localhost:7687`
    pub uri: String,

    pub user: String,

    #[serde(skip_serializing)]
    pub password: String,

    /// Upper bound on pooled Bolt connections held by the driver
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Rows pulled per round trip while streaming results
    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,
}

fn default_max_connections() -> usize {
    DEFAULT_MAX_CONNECTIONS
}

fn default_fetch_size() -> usize {
    DEFAULT_FETCH_SIZE
}

impl StoreConfig {
    pub fn new(
        uri: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            user: user.into(),
            password: password.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            fetch_size: DEFAULT_FETCH_SIZE,
        }
    }

    /// Read settings from process environment variables
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup
    ///
    /// Required: `NEO4J_URI`, `NEO4J_USER`, `NEO4J_PASSWORD`.
    /// Optional: `NEO4J_MAX_CONNECTIONS`, `NEO4J_FETCH_SIZE`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, StoreError> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| StoreError::configuration(format!("{} is not set", key)))
        };
        let optional = |key: &str, default: usize| -> Result<usize, StoreError> {
            match lookup(key) {
                None => Ok(default),
                Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
                    StoreError::configuration(format!(
                        "{} must be a positive integer, got {:?}",
                        key, raw
                    ))
                }),
            }
        };

        let config = Self {
            uri: required(ENV_URI)?,
            user: required(ENV_USER)?,
            password: required(ENV_PASSWORD)?,
            max_connections: optional(ENV_MAX_CONNECTIONS, DEFAULT_MAX_CONNECTIONS)?,
            fetch_size: optional(ENV_FETCH_SIZE, DEFAULT_FETCH_SIZE)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.uri.trim().is_empty() {
            return Err(StoreError::configuration("uri cannot be empty"));
        }
        if self.user.trim().is_empty() {
            return Err(StoreError::configuration("user cannot be empty"));
        }
        if self.password.is_empty() {
            return Err(StoreError::configuration("password cannot be empty"));
        }
        if self.max_connections == 0 {
            return Err(StoreError::configuration(
                "max_connections must be greater than 0",
            ));
        }
        if self.fetch_size == 0 {
            return Err(StoreError::configuration(
                "fetch_size must be greater than 0",
            ));
        }
        Ok(())
    }
}
