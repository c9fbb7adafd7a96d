//! The storage area capability

use std::sync::Arc;

use crate::Result;

/// A flat string-to-string store shaped like the web Storage interface.
///
/// Each call is atomic on its own. Nothing spans calls, so a read followed by
/// a write can interleave with another writer on the same area.
pub trait StorageArea {
    /// Returns the text stored under `key`, or `None` if there is no entry.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous entry.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Deletes the entry under `key`. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;

    fn contains_item(&self, key: &str) -> Result<bool> {
        Ok(self.get_item(key)?.is_some())
    }
}

/// Area handle shared between every store addressing it.
#[cfg(not(target_arch = "wasm32"))]
pub type SharedArea = Arc<dyn StorageArea + Send + Sync>;

/// Area handle shared between every store addressing it. Browser storage
/// objects are bound to their thread.
#[cfg(target_arch = "wasm32")]
pub type SharedArea = Arc<dyn StorageArea>;
