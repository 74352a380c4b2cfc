//! In-process implementation of the `KeyValueStore` trait.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use adventure_core::error::DomainError;
use adventure_core::store::{KeyValueStore, VersionedRecord};

#[derive(Debug, Default)]
struct Tables {
    records: HashMap<String, VersionedRecord>,
    counters: HashMap<String, BTreeMap<String, i64>>,
    lists: HashMap<String, VecDeque<serde_json::Value>>,
}

/// Memory-backed store. Every operation holds a single lock for its whole
/// duration, so each call is atomic with respect to every other call.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, DomainError> {
        self.tables
            .lock()
            .map_err(|_| DomainError::Infrastructure("memory store lock poisoned".to_owned()))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<VersionedRecord>, DomainError> {
        Ok(self.lock()?.records.get(key).cloned())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected_version: Option<i64>,
        value: serde_json::Value,
    ) -> Result<i64, DomainError> {
        let mut tables = self.lock()?;
        let actual = tables.records.get(key).map(|r| r.version);
        if actual != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                key: key.to_owned(),
                expected: expected_version.unwrap_or(0),
                actual: actual.unwrap_or(0),
            });
        }
        let version = actual.unwrap_or(0) + 1;
        tables
            .records
            .insert(key.to_owned(), VersionedRecord { value, version });
        Ok(version)
    }

    async fn increment(&self, key: &str, field: &str, delta: i64) -> Result<i64, DomainError> {
        let mut tables = self.lock()?;
        let counter = tables
            .counters
            .entry(key.to_owned())
            .or_default()
            .entry(field.to_owned())
            .or_insert(0);
        *counter += delta;
        Ok(*counter)
    }

    async fn counters(&self, key: &str) -> Result<BTreeMap<String, i64>, DomainError> {
        Ok(self.lock()?.counters.get(key).cloned().unwrap_or_default())
    }

    async fn push_capped(
        &self,
        key: &str,
        entry: serde_json::Value,
        cap: usize,
    ) -> Result<(), DomainError> {
        let mut tables = self.lock()?;
        let list = tables.lists.entry(key.to_owned()).or_default();
        list.push_front(entry);
        list.truncate(cap);
        Ok(())
    }

    async fn list(&self, key: &str) -> Result<Vec<serde_json::Value>, DomainError> {
        Ok(self
            .lock()?
            .lists
            .get(key)
            .map(|l| l.iter().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use adventure_core::store::put_if_absent;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_get_returns_none_for_missing_key() {
        let store = MemoryStore::new();

        assert_eq!(store.get("player:nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_compare_and_swap_creates_then_updates() {
        // Arrange
        let store = MemoryStore::new();

        // Act
        let created = store
            .compare_and_swap("player:global", None, json!({"health": 100}))
            .await
            .unwrap();
        let updated = store
            .compare_and_swap("player:global", Some(1), json!({"health": 90}))
            .await
            .unwrap();

        // Assert
        assert_eq!(created, 1);
        assert_eq!(updated, 2);
        let record = store.get("player:global").await.unwrap().unwrap();
        assert_eq!(record.version, 2);
        assert_eq!(record.value["health"], 90);
    }

    #[tokio::test]
    async fn test_stale_version_is_rejected_without_writing() {
        // Arrange
        let store = MemoryStore::new();
        store
            .compare_and_swap("player:global", None, json!({"health": 100}))
            .await
            .unwrap();
        store
            .compare_and_swap("player:global", Some(1), json!({"health": 80}))
            .await
            .unwrap();

        // Act
        let result = store
            .compare_and_swap("player:global", Some(1), json!({"health": 10}))
            .await;

        // Assert
        match result.unwrap_err() {
            DomainError::ConcurrencyConflict {
                key,
                expected,
                actual,
            } => {
                assert_eq!(key, "player:global");
                assert_eq!(expected, 1);
                assert_eq!(actual, 2);
            }
            other => panic!("expected ConcurrencyConflict, got {other:?}"),
        }
        let record = store.get("player:global").await.unwrap().unwrap();
        assert_eq!(record.value["health"], 80);
    }

    #[tokio::test]
    async fn test_put_if_absent_keeps_first_write() {
        let store = MemoryStore::new();

        let first = put_if_absent(&store, "edge:start:a", json!("first")).await.unwrap();
        let second = put_if_absent(&store, "edge:start:a", json!("second")).await.unwrap();

        assert!(first);
        assert!(!second);
        let record = store.get("edge:start:a").await.unwrap().unwrap();
        assert_eq!(record.value, json!("first"));
    }

    #[tokio::test]
    async fn test_push_capped_keeps_most_recent_first() {
        // Arrange
        let store = MemoryStore::new();

        // Act
        for i in 0..5 {
            store.push_capped("stats:history", json!(i), 3).await.unwrap();
        }

        // Assert
        let entries = store.list("stats:history").await.unwrap();
        assert_eq!(entries, vec![json!(4), json!(3), json!(2)]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_are_not_lost() {
        // Arrange
        let store = Arc::new(MemoryStore::new());

        // Act
        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.increment("stats", "total_choices", 1).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Assert
        let counters = store.counters("stats").await.unwrap();
        assert_eq!(counters.get("total_choices"), Some(&32));
    }
}
