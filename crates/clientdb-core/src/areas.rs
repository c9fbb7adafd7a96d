//! The pair of storage areas a selector resolves against

use std::sync::Arc;

use clientdb_storage::{MemoryArea, SharedArea};

use crate::kind::StorageKind;
use crate::namespace::NamespaceStore;
use crate::Result;

/// One area per [`StorageKind`]. Cloning shares the underlying areas.
#[derive(Clone)]
pub struct StorageAreas {
    local: SharedArea,
    session: SharedArea,
}

impl StorageAreas {
    pub fn new(local: SharedArea, session: SharedArea) -> Self {
        Self { local, session }
    }

    /// Both areas held in process memory.
    pub fn in_memory(quota: Option<usize>) -> Self {
        Self::new(
            Arc::new(MemoryArea::with_quota(quota)),
            Arc::new(MemoryArea::with_quota(quota)),
        )
    }

    /// Durable area in the configured SQLite file, session area in memory.
    #[cfg(feature = "sqlite")]
    pub fn open(config: &crate::Config) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = clientdb_storage::Database::open(&config.database_path)?
            .with_quota(config.quota_bytes);

        tracing::info!(
            path = %config.database_path.display(),
            quota_bytes = ?config.quota_bytes,
            "Opened storage areas"
        );

        Ok(Self::new(
            Arc::new(db),
            Arc::new(MemoryArea::with_quota(config.quota_bytes)),
        ))
    }

    /// The window's `localStorage` and `sessionStorage`.
    #[cfg(all(feature = "web", target_arch = "wasm32"))]
    pub fn browser() -> Result<Self> {
        use clientdb_storage::BrowserArea;

        Ok(Self::new(
            Arc::new(BrowserArea::local()?),
            Arc::new(BrowserArea::session()?),
        ))
    }

    pub fn area(&self, kind: StorageKind) -> SharedArea {
        match kind {
            StorageKind::Local => Arc::clone(&self.local),
            StorageKind::Session => Arc::clone(&self.session),
        }
    }

    pub fn namespace(&self, name: impl Into<String>, kind: StorageKind) -> Result<NamespaceStore> {
        NamespaceStore::open(self, name, kind)
    }
}

impl std::fmt::Debug for StorageAreas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageAreas").finish_non_exhaustive()
    }
}
