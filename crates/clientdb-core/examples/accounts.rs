//! Walks an "accounts" namespace through its lifecycle in the default data dir.

use clientdb_core::{init_logging, Config, NamespaceStore, Record, StorageAreas, StorageKind};
use serde_json::json;

fn main() -> clientdb_core::Result<()> {
    init_logging();

    let areas = StorageAreas::open(&Config::default())?;
    let accounts = NamespaceStore::open(&areas, "accounts", StorageKind::Local)?;

    let mut patch = Record::new();
    patch.insert("id".to_string(), json!("u1"));
    patch.insert("email".to_string(), json!("a@x.com"));
    accounts.insert(patch)?;

    accounts.insert_from(&json!({"email": "b@x.com"}))?;
    println!("{}", serde_json::to_string_pretty(&accounts.namespace()?)?);

    accounts.remove()?;
    println!("after remove: {:?}", accounts.query("id")?);
    Ok(())
}
