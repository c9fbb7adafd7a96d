//! Namespace store
//!
//! A namespace is one JSON object kept as text under a single key of a
//! storage area. Every read goes back to the area; nothing is cached, so all
//! stores addressing the same slot see each other's writes.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use clientdb_storage::{SharedArea, StorageArea};

use crate::areas::StorageAreas;
use crate::error::ClientDbError;
use crate::kind::StorageKind;
use crate::Result;

/// Contents of a namespace
pub type Record = serde_json::Map<String, Value>;

/// Deepest container nesting `serde_json` will read back, counting the
/// namespace object itself.
const MAX_DEPTH: usize = 127;

#[derive(Clone)]
pub struct NamespaceStore {
    name: String,
    kind: StorageKind,
    area: SharedArea,
}

impl NamespaceStore {
    /// Open `name` in the area selected by `kind`, creating it as `{}` if
    /// the slot is empty.
    pub fn open(areas: &StorageAreas, name: impl Into<String>, kind: StorageKind) -> Result<Self> {
        Self::with_area(areas.area(kind), name, kind)
    }

    /// Like [`open`](Self::open) with the storage type given as a string
    /// (`"local"`, `"durable"` or `"session"`).
    pub fn with_type(areas: &StorageAreas, name: impl Into<String>, kind: &str) -> Result<Self> {
        let kind: StorageKind = kind.parse()?;
        Self::open(areas, name, kind)
    }

    /// Open `name` directly on `area`. `kind` is recorded for reporting only.
    pub fn with_area(area: SharedArea, name: impl Into<String>, kind: StorageKind) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ClientDbError::Configuration(
                "Namespace name cannot be empty".to_string(),
            ));
        }

        let store = Self { name, kind, area };

        // An existing slot is left alone, even if it no longer decodes
        if !store.exists()? {
            store.write_record(&Record::new())?;
            tracing::info!(namespace = %store.name, kind = %store.kind, "Created namespace");
        }

        Ok(store)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> StorageKind {
        self.kind
    }

    /// Whether the slot currently holds an entry.
    pub fn exists(&self) -> Result<bool> {
        Ok(self.read_raw()?.is_some())
    }

    /// The whole namespace, or `None` if it has been removed.
    pub fn namespace(&self) -> Result<Option<Record>> {
        self.read_record()
    }

    /// The value under `key`, or `None` if the key or the namespace is absent.
    pub fn query(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_record()?.and_then(|mut record| record.remove(key)))
    }

    /// Typed variant of [`query`](Self::query).
    pub fn query_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.query(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Shallow-merge `patch` into the namespace: every key in `patch`
    /// replaces the stored value wholesale, other keys are kept. A removed
    /// namespace is recreated.
    ///
    /// Patches nested deeper than can be read back are rejected before
    /// anything is written.
    ///
    /// This is a read followed by a write. Another writer on the same slot
    /// between the two is overwritten (lost update).
    pub fn insert(&self, patch: Record) -> Result<()> {
        if exceeds_depth(&patch, MAX_DEPTH - 1) {
            return Err(ClientDbError::InvalidPatch(format!(
                "values nest deeper than {MAX_DEPTH} levels"
            )));
        }

        let mut record = self.read_record()?.unwrap_or_default();
        let keys = patch.len();
        record.extend(patch);
        self.write_record(&record)?;

        tracing::debug!(namespace = %self.name, keys, total = record.len(), "Merged patch");
        Ok(())
    }

    /// Serialize `patch` and [`insert`](Self::insert) its fields. Values that
    /// do not serialize to a JSON object are rejected.
    pub fn insert_from<T: Serialize + ?Sized>(&self, patch: &T) -> Result<()> {
        match serde_json::to_value(patch)? {
            Value::Object(record) => self.insert(record),
            other => Err(ClientDbError::InvalidPatch(format!(
                "expected an object, got {}",
                json_type(&other)
            ))),
        }
    }

    /// Delete the namespace from its area. Removing twice is a no-op.
    pub fn remove(&self) -> Result<()> {
        self.area.remove_item(&self.name)?;
        tracing::info!(namespace = %self.name, kind = %self.kind, "Removed namespace");
        Ok(())
    }

    /// Raw slot text. Empty text counts as no entry.
    fn read_raw(&self) -> Result<Option<String>> {
        Ok(self
            .area
            .get_item(&self.name)?
            .filter(|raw| !raw.is_empty()))
    }

    fn read_record(&self) -> Result<Option<Record>> {
        match self.read_raw()? {
            Some(raw) => decode(&self.name, &raw).map(Some),
            None => Ok(None),
        }
    }

    fn write_record(&self, record: &Record) -> Result<()> {
        let raw = serde_json::to_string(record)?;
        self.area.set_item(&self.name, &raw)?;
        Ok(())
    }
}

impl std::fmt::Debug for NamespaceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceStore")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

fn decode(namespace: &str, raw: &str) -> Result<Record> {
    let corrupt = |reason: String| ClientDbError::CorruptData {
        namespace: namespace.to_string(),
        reason,
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(other) => Err(corrupt(format!(
            "expected an object, found {}",
            json_type(&other)
        ))),
        Err(e) => Err(corrupt(e.to_string())),
    }
}

/// True if any value in `record` has more than `limit` levels of arrays or
/// objects.
fn exceeds_depth(record: &Record, limit: usize) -> bool {
    let mut pending: Vec<(&Value, usize)> = record.values().map(|v| (v, 1)).collect();

    while let Some((value, depth)) = pending.pop() {
        match value {
            Value::Array(_) | Value::Object(_) if depth > limit => return true,
            Value::Array(items) => pending.extend(items.iter().map(|v| (v, depth + 1))),
            Value::Object(map) => pending.extend(map.values().map(|v| (v, depth + 1))),
            _ => {}
        }
    }

    false
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clientdb_storage::{MemoryArea, StorageError};
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Arc;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_accounts_scenario() {
        let areas = StorageAreas::in_memory(None);
        let db = NamespaceStore::open(&areas, "accounts", StorageKind::Local).unwrap();
        assert_eq!(db.namespace().unwrap(), Some(Record::new()));

        db.insert(record(json!({"id": "u1", "email": "a@x.com"})))
            .unwrap();
        assert_eq!(db.query("email").unwrap(), Some(json!("a@x.com")));

        db.insert(record(json!({"email": "b@x.com"}))).unwrap();
        assert_eq!(
            db.namespace().unwrap(),
            Some(record(json!({"id": "u1", "email": "b@x.com"})))
        );

        db.remove().unwrap();
        assert_eq!(db.query("id").unwrap(), None);
        assert_eq!(db.namespace().unwrap(), None);
    }

    #[test]
    fn test_reopen_does_not_reset() {
        let areas = StorageAreas::in_memory(None);
        let first = areas.namespace("accounts", StorageKind::Local).unwrap();
        first.insert(record(json!({"id": "u1"}))).unwrap();

        let second = areas.namespace("accounts", StorageKind::Local).unwrap();
        assert_eq!(second.query("id").unwrap(), Some(json!("u1")));
        assert_eq!(first.namespace().unwrap(), second.namespace().unwrap());
    }

    #[test]
    fn test_instances_share_slot() {
        let areas = StorageAreas::in_memory(None);
        let a = areas.namespace("cart", StorageKind::Session).unwrap();
        let b = areas.namespace("cart", StorageKind::Session).unwrap();

        a.insert(record(json!({"items": 3}))).unwrap();
        assert_eq!(b.query("items").unwrap(), Some(json!(3)));

        b.remove().unwrap();
        assert!(!a.exists().unwrap());
    }

    #[test]
    fn test_shallow_merge_replaces_nested_objects() {
        let areas = StorageAreas::in_memory(None);
        let db = areas.namespace("profile", StorageKind::Local).unwrap();

        db.insert(record(json!({
            "name": "Ada",
            "address": {"city": "London", "zip": "N1"}
        })))
        .unwrap();
        db.insert(record(json!({"address": {"city": "Paris"}})))
            .unwrap();

        assert_eq!(
            db.namespace().unwrap(),
            Some(record(json!({"name": "Ada", "address": {"city": "Paris"}})))
        );
    }

    #[test]
    fn test_repeated_patch_is_idempotent() {
        let areas = StorageAreas::in_memory(None);
        let db = areas.namespace("flags", StorageKind::Local).unwrap();
        let patch = record(json!({"beta": true, "limit": 10}));

        db.insert(patch.clone()).unwrap();
        let once = db.namespace().unwrap();
        db.insert(patch).unwrap();
        assert_eq!(db.namespace().unwrap(), once);
    }

    #[test]
    fn test_insert_after_remove_recreates() {
        let areas = StorageAreas::in_memory(None);
        let db = areas.namespace("accounts", StorageKind::Local).unwrap();
        db.insert(record(json!({"id": "u1"}))).unwrap();

        db.remove().unwrap();
        db.remove().unwrap();
        assert_eq!(db.namespace().unwrap(), None);

        db.insert(record(json!({"email": "c@x.com"}))).unwrap();
        assert_eq!(
            db.namespace().unwrap(),
            Some(record(json!({"email": "c@x.com"})))
        );
    }

    #[test]
    fn test_invalid_configuration() {
        let areas = StorageAreas::in_memory(None);

        let err = NamespaceStore::with_type(&areas, "accounts", "cookie").unwrap_err();
        assert!(matches!(err, ClientDbError::Configuration(_)));

        let err = NamespaceStore::open(&areas, "", StorageKind::Local).unwrap_err();
        assert!(matches!(err, ClientDbError::Configuration(_)));

        // Nothing was written for the rejected stores
        assert!(!areas
            .area(StorageKind::Local)
            .contains_item("accounts")
            .unwrap());
        assert!(!areas.area(StorageKind::Local).contains_item("").unwrap());

        // Any non-empty key is usable, whitespace included
        let blank = NamespaceStore::open(&areas, " ", StorageKind::Local).unwrap();
        assert_eq!(blank.namespace().unwrap(), Some(Record::new()));

        let db = NamespaceStore::with_type(&areas, "accounts", "session").unwrap();
        assert_eq!(db.kind(), StorageKind::Session);
        assert_eq!(db.name(), "accounts");
    }

    #[test]
    fn test_corrupt_slot() {
        let area = MemoryArea::new();
        let db = NamespaceStore::with_area(Arc::new(area.clone()), "accounts", StorageKind::Local)
            .unwrap();

        area.set_item("accounts", "{not json").unwrap();
        let err = db.namespace().unwrap_err();
        assert!(err.is_corrupt());
        assert!(db.query("id").unwrap_err().is_corrupt());
        // Insert refuses to overwrite what it cannot read
        assert!(db.insert(record(json!({"id": "u1"}))).unwrap_err().is_corrupt());
        assert_eq!(area.get_item("accounts").unwrap().as_deref(), Some("{not json"));

        for raw in ["[1,2]", "42", "\"text\"", "null"] {
            area.set_item("accounts", raw).unwrap();
            match db.namespace().unwrap_err() {
                ClientDbError::CorruptData { namespace, .. } => assert_eq!(namespace, "accounts"),
                other => panic!("unexpected error for {raw}: {other}"),
            }
        }

        // Reopening keeps the corrupt entry rather than resetting it
        let reopened =
            NamespaceStore::with_area(Arc::new(area.clone()), "accounts", StorageKind::Local)
                .unwrap();
        assert!(reopened.namespace().unwrap_err().is_corrupt());

        // Removing clears the corruption
        reopened.remove().unwrap();
        assert_eq!(db.namespace().unwrap(), None);
    }

    #[test]
    fn test_empty_text_is_absent() {
        let area = MemoryArea::new();
        area.set_item("accounts", "").unwrap();

        let db = NamespaceStore::with_area(Arc::new(area.clone()), "accounts", StorageKind::Local)
            .unwrap();
        assert_eq!(area.get_item("accounts").unwrap().as_deref(), Some("{}"));
        assert_eq!(db.namespace().unwrap(), Some(Record::new()));
    }

    #[test]
    fn test_quota_exceeded_propagates() {
        let areas = StorageAreas::in_memory(Some(64));
        let db = areas.namespace("logs", StorageKind::Session).unwrap();
        db.insert(record(json!({"a": 1}))).unwrap();

        let err = db
            .insert(record(json!({"blob": "x".repeat(128)})))
            .unwrap_err();
        assert!(err.is_storage_full());
        assert!(matches!(
            err,
            ClientDbError::Storage(StorageError::QuotaExceeded { .. })
        ));

        // Previous contents survive the rejected write
        assert_eq!(db.namespace().unwrap(), Some(record(json!({"a": 1}))));
    }

    #[test]
    fn test_construction_fails_when_full() {
        let areas = StorageAreas::in_memory(Some(4));
        let err = areas.namespace("accounts", StorageKind::Local).unwrap_err();
        assert!(err.is_storage_full());
    }

    #[test]
    fn test_typed_access() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Account {
            id: String,
            verified: bool,
        }

        let areas = StorageAreas::in_memory(None);
        let db = areas.namespace("accounts", StorageKind::Local).unwrap();

        db.insert_from(&json!({"owner": {"id": "u1", "verified": true}}))
            .unwrap();
        let owner: Option<Account> = db.query_as("owner").unwrap();
        assert_eq!(
            owner,
            Some(Account {
                id: "u1".to_string(),
                verified: true
            })
        );
        assert_eq!(db.query_as::<Account>("missing").unwrap(), None);

        let account = Account {
            id: "u2".to_string(),
            verified: false,
        };
        db.insert_from(&account).unwrap();
        assert_eq!(db.query("id").unwrap(), Some(json!("u2")));

        let err = db.insert_from(&vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, ClientDbError::InvalidPatch(_)));

        let err = db.query_as::<Account>("id").unwrap_err();
        assert!(matches!(err, ClientDbError::Serialization(_)));
    }

    fn nested(levels: usize) -> Value {
        let mut value = json!(1);
        for _ in 0..levels {
            value = json!([value]);
        }
        value
    }

    #[test]
    fn test_too_deep_patch_is_rejected() {
        let areas = StorageAreas::in_memory(None);
        let db = areas.namespace("deep", StorageKind::Local).unwrap();
        db.insert(record(json!({"id": "u1"}))).unwrap();

        let err = db
            .insert(record(json!({"k": nested(200)})))
            .unwrap_err();
        assert!(matches!(err, ClientDbError::InvalidPatch(_)));
        let err = db.insert_from(&json!({"k": nested(200)})).unwrap_err();
        assert!(matches!(err, ClientDbError::InvalidPatch(_)));

        // The namespace is still readable and writable
        assert_eq!(db.namespace().unwrap(), Some(record(json!({"id": "u1"}))));
        db.insert(record(json!({"email": "a@x.com"}))).unwrap();
        assert_eq!(db.query("email").unwrap(), Some(json!("a@x.com")));
    }

    #[test]
    fn test_deepest_readable_patch_roundtrips() {
        let areas = StorageAreas::in_memory(None);
        let db = areas.namespace("deep", StorageKind::Local).unwrap();

        // The namespace object plus 126 arrays is the most serde_json reads
        db.insert(record(json!({"k": nested(126)}))).unwrap();
        assert_eq!(db.query("k").unwrap(), Some(nested(126)));

        let err = db
            .insert(record(json!({"k": nested(127)})))
            .unwrap_err();
        assert!(matches!(err, ClientDbError::InvalidPatch(_)));
        assert_eq!(db.query("k").unwrap(), Some(nested(126)));
    }

    #[test]
    fn test_stores_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NamespaceStore>();
        assert_send_sync::<StorageAreas>();
    }

    #[test]
    fn test_shared_across_threads() {
        let areas = StorageAreas::in_memory(None);
        let db = areas.namespace("workers", StorageKind::Session).unwrap();

        std::thread::scope(|scope| {
            for worker in 0..4 {
                let areas = areas.clone();
                scope.spawn(move || {
                    let name = format!("worker-{worker}");
                    let own = areas.namespace(name, StorageKind::Session).unwrap();
                    own.insert(record(json!({"done": true}))).unwrap();
                });
            }
        });
        db.insert(record(json!({"count": 4}))).unwrap();

        for worker in 0..4 {
            let own = areas
                .namespace(format!("worker-{worker}"), StorageKind::Session)
                .unwrap();
            assert_eq!(own.query("done").unwrap(), Some(json!(true)));
        }
        assert_eq!(db.query("count").unwrap(), Some(json!(4)));
    }

    #[test]
    fn test_stored_text_is_canonical() {
        let area = MemoryArea::new();
        let db = NamespaceStore::with_area(Arc::new(area.clone()), "prefs", StorageKind::Local)
            .unwrap();
        db.insert(record(json!({"zoom": 2, "accent": "blue"}))).unwrap();

        assert_eq!(
            area.get_item("prefs").unwrap().as_deref(),
            Some(r#"{"accent":"blue","zoom":2}"#)
        );
    }
}
