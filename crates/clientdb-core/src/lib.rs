//! ClientDB Core
//!
//! Named JSON namespaces kept in a durable (`local`) or session-scoped
//! storage area. Each namespace is a single serialized object that callers
//! read, query by key, shallow-merge into and remove.

mod areas;
mod config;
mod error;
mod kind;
mod namespace;

pub use areas::StorageAreas;
pub use config::Config;
pub use error::ClientDbError;
pub use kind::StorageKind;
pub use namespace::{NamespaceStore, Record};

pub use clientdb_storage::{MemoryArea, SharedArea, StorageArea, StorageError};
#[cfg(feature = "sqlite")]
pub use clientdb_storage::Database;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub use clientdb_storage::BrowserArea;

pub type Result<T> = std::result::Result<T, ClientDbError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
