//! SQLite-backed durable storage area

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::area::StorageArea;
use crate::error::StorageError;
use crate::migrations::run_migrations;
use crate::{entry_size, Result};

pub struct Database {
    conn: Arc<Mutex<Connection>>,
    /// Maximum bytes of keys plus values, `None` for unbounded
    quota: Option<usize>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode so readers in other processes are not blocked by a writer
        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            quota: None,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            quota: None,
        })
    }

    pub fn with_quota(mut self, quota: Option<usize>) -> Self {
        self.quota = quota;
        self
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    /// Bytes currently counted against the quota
    pub fn usage(&self) -> Result<usize> {
        self.with_connection(|conn| used_bytes(conn, None))
    }
}

/// Sum of key and value byte lengths, optionally skipping one key.
fn used_bytes(conn: &Connection, except: Option<&str>) -> Result<usize> {
    let used: i64 = conn.query_row(
        "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
         FROM storage_items WHERE ?1 IS NULL OR key != ?1",
        [except],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(used).unwrap_or(0))
}

impl StorageArea for Database {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM storage_items WHERE key = ?1",
                    [key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value)
        })
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339();
        self.transaction(|conn| {
            if let Some(quota) = self.quota {
                let required = entry_size(key, value);
                let available = quota.saturating_sub(used_bytes(conn, Some(key))?);
                if required > available {
                    return Err(StorageError::QuotaExceeded {
                        key: key.to_string(),
                        required,
                        available,
                    });
                }
            }

            conn.execute(
                "INSERT OR REPLACE INTO storage_items (key, value, updated_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![key, value, updated_at],
            )?;
            Ok(())
        })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM storage_items WHERE key = ?1", [key])?;
            Ok(())
        })
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            quota: self.quota,
        }
    }
}
