//! Persistent store abstraction.
//!
//! Every shared entity of the engine lives behind this contract: a versioned
//! key-value record space with compare-and-swap writes, an atomic counter
//! space, and capped append-only lists. Each call is atomic on its own; no
//! operation spans more than one key.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::DomainError;

/// A stored value together with its write version.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedRecord {
    /// Serialized record payload.
    pub value: serde_json::Value,
    /// Number of successful writes to this key (first write = 1).
    pub version: i64,
}

/// Repository trait for the persistent key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Load the record stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<VersionedRecord>, DomainError>;

    /// Write `value` under `key` only if the current version matches.
    ///
    /// `expected_version` of `None` means the key must be absent. Returns the
    /// new version on success and `DomainError::ConcurrencyConflict` when the
    /// condition does not hold.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected_version: Option<i64>,
        value: serde_json::Value,
    ) -> Result<i64, DomainError>;

    /// Atomically add `delta` to the counter `field` of `key`, creating it at
    /// zero first. Returns the value after the addition.
    async fn increment(&self, key: &str, field: &str, delta: i64) -> Result<i64, DomainError>;

    /// Read every counter field stored under `key`.
    async fn counters(&self, key: &str) -> Result<BTreeMap<String, i64>, DomainError>;

    /// Prepend `entry` to the list under `key`, dropping the oldest entries
    /// beyond `cap`.
    async fn push_capped(
        &self,
        key: &str,
        entry: serde_json::Value,
        cap: usize,
    ) -> Result<(), DomainError>;

    /// Read the list under `key`, most recent first.
    async fn list(&self, key: &str) -> Result<Vec<serde_json::Value>, DomainError>;
}

/// Write `value` under `key` if the key is absent.
///
/// Returns `true` if this call created the record and `false` if a record
/// already existed.
///
/// # Errors
///
/// Propagates any store error other than the expected conflict.
pub async fn put_if_absent(
    store: &dyn KeyValueStore,
    key: &str,
    value: serde_json::Value,
) -> Result<bool, DomainError> {
    match store.compare_and_swap(key, None, value).await {
        Ok(_) => Ok(true),
        Err(DomainError::ConcurrencyConflict { .. }) => Ok(false),
        Err(other) => Err(other),
    }
}

/// Decodes a stored payload into `T`.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the payload does not match `T`.
pub fn decode<T: serde::de::DeserializeOwned>(
    key: &str,
    value: serde_json::Value,
) -> Result<T, DomainError> {
    serde_json::from_value(value).map_err(|e| {
        DomainError::Infrastructure(format!("record {key} deserialization failed: {e}"))
    })
}

/// Encodes `value` for storage.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if serialization fails.
pub fn encode<T: serde::Serialize>(key: &str, value: &T) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(value)
        .map_err(|e| DomainError::Infrastructure(format!("record {key} serialization failed: {e}")))
}
