//! Integration tests for `PgStore`.
//!
//! These need a reachable `DATABASE_URL`; run them with
//! `cargo test -p adventure-store -- --ignored`.

use adventure_core::error::DomainError;
use adventure_core::store::{KeyValueStore, put_if_absent};
use adventure_store::PgStore;
use serde_json::json;
use sqlx::PgPool;

// --- get / compare_and_swap ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_get_returns_none_for_missing_key(pool: PgPool) {
    let store = PgStore::new(pool);

    let record = store.get("player:nobody").await.unwrap();

    assert!(record.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_compare_and_swap_round_trip(pool: PgPool) {
    let store = PgStore::new(pool);

    let created = store
        .compare_and_swap("player:global", None, json!({"health": 100}))
        .await
        .unwrap();
    let updated = store
        .compare_and_swap("player:global", Some(created), json!({"health": 90}))
        .await
        .unwrap();

    assert_eq!(created, 1);
    assert_eq!(updated, 2);
    let record = store.get("player:global").await.unwrap().unwrap();
    assert_eq!(record.version, 2);
    assert_eq!(record.value, json!({"health": 90}));
}

// --- concurrency ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_stale_version_reports_conflict(pool: PgPool) {
    let store = PgStore::new(pool);
    store
        .compare_and_swap("player:global", None, json!({"health": 100}))
        .await
        .unwrap();
    store
        .compare_and_swap("player:global", Some(1), json!({"health": 80}))
        .await
        .unwrap();

    let result = store
        .compare_and_swap("player:global", Some(1), json!({"health": 5}))
        .await;

    match result.unwrap_err() {
        DomainError::ConcurrencyConflict {
            expected, actual, ..
        } => {
            assert_eq!(expected, 1);
            assert_eq!(actual, 2);
        }
        other => panic!("expected ConcurrencyConflict, got {other:?}"),
    }
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_put_if_absent_first_write_wins(pool: PgPool) {
    let store = PgStore::new(pool);

    assert!(put_if_absent(&store, "edge:start:a", json!("gen-1")).await.unwrap());
    assert!(!put_if_absent(&store, "edge:start:a", json!("gen-2")).await.unwrap());

    let record = store.get("edge:start:a").await.unwrap().unwrap();
    assert_eq!(record.value, json!("gen-1"));
}

// --- counters and lists ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_increment_accumulates(pool: PgPool) {
    let store = PgStore::new(pool);

    store.increment("stats", "total_choices", 1).await.unwrap();
    let value = store.increment("stats", "total_choices", 2).await.unwrap();

    assert_eq!(value, 3);
    let counters = store.counters("stats").await.unwrap();
    assert_eq!(counters.get("total_choices"), Some(&3));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_push_capped_trims_oldest(pool: PgPool) {
    let store = PgStore::new(pool);

    for i in 0..4 {
        store.push_capped("stats:history", json!(i), 2).await.unwrap();
    }

    let entries = store.list("stats:history").await.unwrap();
    assert_eq!(entries, vec![json!(3), json!(2)]);
}
