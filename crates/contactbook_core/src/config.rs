//! Process configuration resolved from the environment.
//!
//! # Responsibility
//! - Resolve database location and logging settings once at startup.
//!
//! # Invariants
//! - Blank environment values are treated as unset.
//! - Resolution never fails; invalid log levels surface later in
//!   `init_logging`.

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "CONTACTBOOK_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "CONTACTBOOK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "CONTACTBOOK_LOG_DIR";

/// Default database file, relative to the working directory.
pub const DEFAULT_DB_FILE_NAME: &str = "contacts.db";

/// Startup settings for the contact book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactBookConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Log directory; file logging stays off when `None`.
    pub log_dir: Option<PathBuf>,
}

impl Default for ContactBookConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl ContactBookConfig {
    /// Resolves settings from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        Self {
            db_path: read(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            log_level: read(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir: read(ENV_LOG_DIR).map(PathBuf::from),
        }
    }
}
