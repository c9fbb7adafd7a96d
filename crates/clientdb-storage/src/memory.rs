//! In-memory storage area
//!
//! Lives as long as the process, which makes it the session-scoped area on
//! native targets. Clones share the same map.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::area::StorageArea;
use crate::error::StorageError;
use crate::{entry_size, Result};

#[derive(Debug, Clone, Default)]
pub struct MemoryArea {
    items: Arc<RwLock<HashMap<String, String>>>,
    /// Maximum bytes of keys plus values, `None` for unbounded
    quota: Option<usize>,
}

impl MemoryArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: Option<usize>) -> Self {
        Self {
            items: Arc::new(RwLock::new(HashMap::new())),
            quota,
        }
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Bytes currently counted against the quota
    pub fn usage(&self) -> usize {
        self.items
            .read()
            .iter()
            .map(|(k, v)| entry_size(k, v))
            .sum()
    }
}

impl StorageArea for MemoryArea {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.write();

        if let Some(quota) = self.quota {
            let used: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| entry_size(k, v))
                .sum();
            let required = entry_size(key, value);
            let available = quota.saturating_sub(used);
            if required > available {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    required,
                    available,
                });
            }
        }

        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.write().remove(key);
        Ok(())
    }
}
