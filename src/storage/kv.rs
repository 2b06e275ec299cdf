use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::StorageError;
use super::database::Database;
use super::models::KvEntry;

/// Key-value table standing in for browser local storage.
///
/// Shared between the API client (token) and the stores, hence the mutex
/// around the single connection.
pub struct KvStore {
    db: Mutex<Database>,
}

impl KvStore {
    /// Open or create the store at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        Self::from_database(Database::new(path)?)
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Self::from_database(Database::in_memory()?)
    }

    fn from_database(db: Database) -> Result<Self, StorageError> {
        db.connection().execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
            )",
            [],
        )?;
        Ok(Self { db: Mutex::new(db) })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Database>, StorageError> {
        self.db.lock().map_err(|_| StorageError::Poisoned)
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let db = self.lock()?;
        let value = db
            .connection()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let db = self.lock()?;
        db.connection().execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now'))",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        let db = self.lock()?;
        db.connection()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw)
    }

    /// All entries, ordered by key
    pub fn entries(&self) -> Result<Vec<KvEntry>, StorageError> {
        let db = self.lock()?;
        let mut stmt = db
            .connection()
            .prepare("SELECT key, value, updated_at FROM kv ORDER BY key ASC")?;

        let entries = stmt
            .query_map([], |row| {
                Ok(KvEntry {
                    key: row.get(0)?,
                    value: row.get(1)?,
                    updated_at: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_and_remove() {
        let kv = KvStore::in_memory().unwrap();
        assert_eq!(kv.get("token").unwrap(), None);

        kv.set("token", "abc").unwrap();
        kv.set("token", "def").unwrap();
        assert_eq!(kv.get("token").unwrap().as_deref(), Some("def"));

        kv.remove("token").unwrap();
        assert_eq!(kv.get("token").unwrap(), None);
    }

    #[test]
    fn json_values_and_listing() {
        let kv = KvStore::in_memory().unwrap();
        kv.set_json("b", &vec![1, 2, 3]).unwrap();
        kv.set("a", "plain").unwrap();

        let numbers: Option<Vec<i32>> = kv.get_json("b").unwrap();
        assert_eq!(numbers, Some(vec![1, 2, 3]));

        let keys: Vec<_> = kv.entries().unwrap().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);

        assert!(matches!(
            kv.get_json::<Vec<i32>>("a"),
            Err(StorageError::Json(_))
        ));
    }

    #[test]
    fn values_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.db");

        KvStore::open(&path).unwrap().set("userInfo", "{}").unwrap();
        let reopened = KvStore::open(&path).unwrap();
        assert_eq!(reopened.get("userInfo").unwrap().as_deref(), Some("{}"));
    }
}
