//! Runtime configuration resolved from the environment.
//!
//! # Invariants
//! - Blank environment values count as unset.
//! - Resolution never fails; invalid levels surface later from
//!   `init_logging`.

use crate::logging::default_log_level;
use std::path::PathBuf;

/// Environment variable overriding the store file path.
pub const ENV_STORE_PATH: &str = "ADDRBOOK_STORE_PATH";
/// Environment variable overriding the log level.
pub const ENV_LOG_LEVEL: &str = "ADDRBOOK_LOG_LEVEL";
/// Environment variable enabling file logging into a directory.
pub const ENV_LOG_DIR: &str = "ADDRBOOK_LOG_DIR";

/// Default store file name, relative to the working directory.
pub const DEFAULT_STORE_FILE_NAME: &str = "addressbook.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub store_path: PathBuf,
    pub log_level: String,
    /// File logging is disabled when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Resolves configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        Self {
            store_path: read(ENV_STORE_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            log_level: read(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir: read(ENV_LOG_DIR).map(PathBuf::from),
        }
    }
}
