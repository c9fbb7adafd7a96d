//! Storage area selector

use serde::{Deserialize, Serialize};

use crate::error::ClientDbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Durable across sessions (`localStorage`)
    #[serde(alias = "durable")]
    Local,
    /// Cleared when the session ends (`sessionStorage`)
    Session,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::Local => "local",
            StorageKind::Session => "session",
        }
    }
}

impl std::fmt::Display for StorageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StorageKind {
    type Err = ClientDbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "durable" => Ok(StorageKind::Local),
            "session" => Ok(StorageKind::Session),
            _ => Err(ClientDbError::Configuration(format!(
                "Unknown storage type: {s:?} (expected \"local\" or \"session\")"
            ))),
        }
    }
}
