//! Browser `localStorage` / `sessionStorage` areas

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{DomException, Storage};

use crate::area::StorageArea;
use crate::error::StorageError;
use crate::{entry_size, Result};

/// A window storage object. The browser enforces its own quota.
pub struct BrowserArea {
    storage: Storage,
}

impl BrowserArea {
    /// The origin-wide durable area
    pub fn local() -> Result<Self> {
        let window = window()?;
        let storage = window.local_storage().map_err(unavailable)?;
        Self::from_storage(storage, "localStorage")
    }

    /// The per-tab session area
    pub fn session() -> Result<Self> {
        let window = window()?;
        let storage = window.session_storage().map_err(unavailable)?;
        Self::from_storage(storage, "sessionStorage")
    }

    fn from_storage(storage: Option<Storage>, which: &str) -> Result<Self> {
        storage
            .map(|storage| Self { storage })
            .ok_or_else(|| StorageError::Unavailable(format!("{which} is disabled")))
    }
}

fn window() -> Result<web_sys::Window> {
    web_sys::window().ok_or_else(|| StorageError::Unavailable("no window object".to_string()))
}

fn unavailable(err: JsValue) -> StorageError {
    match err.dyn_ref::<DomException>() {
        Some(exception) => StorageError::Unavailable(exception.message()),
        None => StorageError::Unavailable(format!("{err:?}")),
    }
}

impl StorageArea for BrowserArea {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.storage.get_item(key).map_err(unavailable)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.storage.set_item(key, value).map_err(|err| {
            let quota_exceeded = err
                .dyn_ref::<DomException>()
                .is_some_and(|exception| exception.name() == "QuotaExceededError");
            if quota_exceeded {
                StorageError::QuotaExceeded {
                    key: key.to_string(),
                    required: entry_size(key, value),
                    available: 0,
                }
            } else {
                unavailable(err)
            }
        })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.storage.remove_item(key).map_err(unavailable)
    }
}
