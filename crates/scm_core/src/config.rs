//! Process configuration loaded from the environment.
//!
//! # Responsibility
//! - Read and validate the variables the store and logger need.
//! - Report every missing required variable in one error.
//!
//! # Invariants
//! - `from_env` loads a `.env` file first when one exists; real environment
//!   variables win over `.env` entries.

use crate::logging::LoggingConfig;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_VAR: &str = "SCM_ENV";
pub const DATABASE_PATH_VAR: &str = "SCM_DATABASE_PATH";
pub const LOG_LEVEL_VAR: &str = "SCM_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "SCM_LOG_DIR";

const REQUIRED_VARS: [&str; 3] = [ENV_VAR, DATABASE_PATH_VAR, LOG_LEVEL_VAR];

/// Deployment environment; selects the log sink policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Testing,
    Production,
}

impl Environment {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "testing" | "test" => Some(Self::Testing),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Testing => "testing",
            Self::Production => "production",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),
    #[error("invalid value `{value}` for {name}")]
    Invalid { name: &'static str, value: String },
    #[error("cannot resolve log directory: {0}")]
    LogDir(String),
}

/// Validated process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScmConfig {
    pub environment: Environment,
    pub database_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
}

impl ScmConfig {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut values = BTreeMap::new();
        let mut missing = Vec::new();
        for name in REQUIRED_VARS {
            match lookup(name).filter(|value| !value.trim().is_empty()) {
                Some(value) => {
                    values.insert(name, value.trim().to_string());
                }
                None => missing.push(name.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let raw_env = &values[ENV_VAR];
        let environment = Environment::parse(raw_env).ok_or_else(|| ConfigError::Invalid {
            name: ENV_VAR,
            value: raw_env.clone(),
        })?;

        let log_dir = match lookup(LOG_DIR_VAR).filter(|value| !value.trim().is_empty()) {
            Some(dir) if Path::new(dir.trim()).is_absolute() => PathBuf::from(dir.trim()),
            Some(dir) => current_dir()?.join(dir.trim()),
            None => current_dir()?.join("logs"),
        };

        Ok(Self {
            environment,
            database_path: PathBuf::from(&values[DATABASE_PATH_VAR]),
            log_level: values[LOG_LEVEL_VAR].clone(),
            log_dir,
        })
    }

    /// Logging settings derived from this config.
    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone(),
            log_dir: self.log_dir.clone(),
            environment: self.environment,
        }
    }
}

fn current_dir() -> Result<PathBuf, ConfigError> {
    std::env::current_dir().map_err(|err| ConfigError::LogDir(err.to_string()))
}
