//! Configuration module.
//!
//! Loads configuration from environment variables.

use std::env;

use thiserror::Error;

/// Default database when `MONGODB_DATABASE` is not set.
const DEFAULT_DATABASE: &str = "test";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // MongoDB
    pub mongodb_uri: String,
    pub mongodb_database: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// Returns [`ConfigError::Missing`] if `MONGODB_URI` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mongodb_uri = lookup("MONGODB_URI")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("MONGODB_URI"))?;

        let mongodb_database = lookup("MONGODB_DATABASE")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        Ok(Self {
            mongodb_uri,
            mongodb_database,
        })
    }
}
