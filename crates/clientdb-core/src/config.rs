//! Storage configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Common per-origin browser limit
const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SQLite file backing the durable area
    pub database_path: PathBuf,
    /// Per-area byte limit on keys plus values, `None` for unbounded
    #[serde(default = "default_quota")]
    pub quota_bytes: Option<usize>,
}

fn default_quota() -> Option<usize> {
    Some(DEFAULT_QUOTA_BYTES)
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("clientdb.db"),
            quota_bytes: default_quota(),
        }
    }

    pub fn with_quota(mut self, quota_bytes: Option<usize>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    /// `ClientDB` under the platform's per-user data directory, falling
    /// back to `.clientdb` in the working directory.
    pub fn data_dir() -> PathBuf {
        platform_data_dir()
            .map(|d| d.join("ClientDB"))
            .unwrap_or_else(|| PathBuf::from(".clientdb"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn platform_data_dir() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        env_path("LOCALAPPDATA")
    } else if cfg!(target_os = "macos") {
        env_path("HOME").map(|home| home.join("Library/Application Support"))
    } else if cfg!(target_os = "linux") {
        env_path("XDG_DATA_HOME")
            .or_else(|| env_path("HOME").map(|home| home.join(".local/share")))
    } else {
        None
    }
}
