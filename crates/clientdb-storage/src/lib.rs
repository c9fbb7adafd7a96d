//! ClientDB Storage Layer
//!
//! Key-value storage areas that namespaces are persisted into.
//! An area only knows about raw text; encoding is the caller's business.

mod area;
#[cfg(feature = "sqlite")]
mod database;
mod error;
mod memory;
#[cfg(feature = "sqlite")]
mod migrations;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
mod web;

pub use area::{SharedArea, StorageArea};
#[cfg(feature = "sqlite")]
pub use database::Database;
pub use error::StorageError;
pub use memory::MemoryArea;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub use web::BrowserArea;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Bytes an entry occupies against a quota.
pub(crate) fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}
