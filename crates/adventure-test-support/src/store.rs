//! Misbehaving `KeyValueStore` implementations.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use adventure_core::error::DomainError;
use adventure_core::store::{KeyValueStore, VersionedRecord};
use async_trait::async_trait;

fn unavailable() -> DomainError {
    DomainError::Infrastructure("connection refused".into())
}

/// A store whose every operation fails with an infrastructure error.
#[derive(Debug)]
pub struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<VersionedRecord>, DomainError> {
        Err(unavailable())
    }

    async fn compare_and_swap(
        &self,
        _key: &str,
        _expected_version: Option<i64>,
        _value: serde_json::Value,
    ) -> Result<i64, DomainError> {
        Err(unavailable())
    }

    async fn increment(&self, _key: &str, _field: &str, _delta: i64) -> Result<i64, DomainError> {
        Err(unavailable())
    }

    async fn counters(&self, _key: &str) -> Result<BTreeMap<String, i64>, DomainError> {
        Err(unavailable())
    }

    async fn push_capped(
        &self,
        _key: &str,
        _entry: serde_json::Value,
        _cap: usize,
    ) -> Result<(), DomainError> {
        Err(unavailable())
    }

    async fn list(&self, _key: &str) -> Result<Vec<serde_json::Value>, DomainError> {
        Err(unavailable())
    }
}

/// Wraps a real store and reports a version conflict for the first
/// `conflicts` compare-and-swap writes to keys starting with `prefix`, as if
/// another writer always got there first.
///
/// Every other call, and every matching write after the budget is spent, is
/// passed through to the inner store.
pub struct ContendedStore {
    inner: Arc<dyn KeyValueStore>,
    prefix: String,
    conflicts: usize,
    attempts: AtomicUsize,
}

impl ContendedStore {
    #[must_use]
    pub fn new(inner: Arc<dyn KeyValueStore>, prefix: impl Into<String>, conflicts: usize) -> Self {
        Self {
            inner,
            prefix: prefix.into(),
            conflicts,
            attempts: AtomicUsize::new(0),
        }
    }

    /// A wrapper that never lets a matching write through.
    #[must_use]
    pub fn always(inner: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self::new(inner, prefix, usize::MAX)
    }

    /// Number of compare-and-swap writes seen for matching keys.
    pub fn contended_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for ContendedStore {
    async fn get(&self, key: &str) -> Result<Option<VersionedRecord>, DomainError> {
        self.inner.get(key).await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected_version: Option<i64>,
        value: serde_json::Value,
    ) -> Result<i64, DomainError> {
        if key.starts_with(&self.prefix) {
            let seen = self.attempts.fetch_add(1, Ordering::SeqCst);
            if seen < self.conflicts {
                let expected = expected_version.unwrap_or(0);
                return Err(DomainError::ConcurrencyConflict {
                    key: key.to_owned(),
                    expected,
                    actual: expected + 1,
                });
            }
        }
        self.inner.compare_and_swap(key, expected_version, value).await
    }

    async fn increment(&self, key: &str, field: &str, delta: i64) -> Result<i64, DomainError> {
        self.inner.increment(key, field, delta).await
    }

    async fn counters(&self, key: &str) -> Result<BTreeMap<String, i64>, DomainError> {
        self.inner.counters(key).await
    }

    async fn push_capped(
        &self,
        key: &str,
        entry: serde_json::Value,
        cap: usize,
    ) -> Result<(), DomainError> {
        self.inner.push_capped(key, entry, cap).await
    }

    async fn list(&self, key: &str) -> Result<Vec<serde_json::Value>, DomainError> {
        self.inner.list(key).await
    }
}

/// Wraps a real store and fails the next armed operations on keys starting
/// with `prefix` with an infrastructure error, as a dropped connection would.
///
/// Starts disarmed, so seeding through the wrapper is unaffected.
pub struct FlakyStore {
    inner: Arc<dyn KeyValueStore>,
    prefix: String,
    remaining: AtomicUsize,
    injected: AtomicUsize,
}

impl FlakyStore {
    #[must_use]
    pub fn new(inner: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            inner,
            prefix: prefix.into(),
            remaining: AtomicUsize::new(0),
            injected: AtomicUsize::new(0),
        }
    }

    /// Fails the next `failures` matching operations.
    pub fn fail_next(&self, failures: usize) {
        self.remaining.store(failures, Ordering::SeqCst);
    }

    /// Fails every matching operation until re-armed.
    pub fn fail_always(&self) {
        self.fail_next(usize::MAX);
    }

    /// Number of failures handed out so far.
    pub fn injected_failures(&self) -> usize {
        self.injected.load(Ordering::SeqCst)
    }

    fn check(&self, key: &str) -> Result<(), DomainError> {
        if !key.starts_with(&self.prefix) {
            return Ok(());
        }
        let armed = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if armed {
            self.injected.fetch_add(1, Ordering::SeqCst);
            return Err(unavailable());
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<VersionedRecord>, DomainError> {
        self.check(key)?;
        self.inner.get(key).await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected_version: Option<i64>,
        value: serde_json::Value,
    ) -> Result<i64, DomainError> {
        self.check(key)?;
        self.inner.compare_and_swap(key, expected_version, value).await
    }

    async fn increment(&self, key: &str, field: &str, delta: i64) -> Result<i64, DomainError> {
        self.check(key)?;
        self.inner.increment(key, field, delta).await
    }

    async fn counters(&self, key: &str) -> Result<BTreeMap<String, i64>, DomainError> {
        self.check(key)?;
        self.inner.counters(key).await
    }

    async fn push_capped(
        &self,
        key: &str,
        entry: serde_json::Value,
        cap: usize,
    ) -> Result<(), DomainError> {
        self.check(key)?;
        self.inner.push_capped(key, entry, cap).await
    }

    async fn list(&self, key: &str) -> Result<Vec<serde_json::Value>, DomainError> {
        self.check(key)?;
        self.inner.list(key).await
    }
}
