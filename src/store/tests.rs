use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;

use super::{MemoryStore, SledStore, StateStore, StoreError};
use crate::utils::ManualClock;

fn memory_store() -> (MemoryStore, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_000_000));
    (MemoryStore::new(clock.clone()), clock)
}

async fn check_ttl_expiry(store: &dyn StateStore, clock: &ManualClock) {
    store
        .set_ex("broker:a", b"alive", Duration::from_secs(31))
        .await
        .unwrap();
    store.hset("ep:info", &[("client_id", "dev1".to_string())]).await.unwrap();
    assert!(store.expire("ep:info", Duration::from_secs(31)).await.unwrap());

    clock.advance(Duration::from_secs(30));
    assert_eq!(store.get("broker:a").await.unwrap(), Some(b"alive".to_vec()));
    assert_eq!(store.hgetall("ep:info").await.unwrap().len(), 1);
    assert_eq!(
        store.hget("ep:info", "client_id").await.unwrap().as_deref(),
        Some("dev1")
    );
    assert_eq!(store.hget("ep:info", "owner").await.unwrap(), None);

    clock.advance(Duration::from_secs(2));
    assert_eq!(store.get("broker:a").await.unwrap(), None);
    assert!(store.hgetall("ep:info").await.unwrap().is_empty());
    assert!(!store.expire("ep:info", Duration::from_secs(5)).await.unwrap());
}

async fn check_sorted_sets(store: &dyn StateStore) {
    assert!(store.zadd_nx("topics", "room/temp", 1.0).await.unwrap());
    assert!(store.zadd_nx("topics", "room/hum", 2.0).await.unwrap());
    assert!(!store.zadd_nx("topics", "room/temp", 9.0).await.unwrap());
    assert_eq!(store.zscore("topics", "room/temp").await.unwrap(), Some(1.0));
    assert_eq!(store.zscore("topics", "nope").await.unwrap(), None);

    assert_eq!(
        store.zrange_by_score("topics", 2.0, 2.0).await.unwrap(),
        vec!["room/hum".to_string()]
    );

    store.zadd("clients", "10.0.0.1:4000", 300.0).await.unwrap();
    store.zadd("clients", "10.0.0.2:4000", 100.0).await.unwrap();
    store.zadd("clients", "10.0.0.3:4000", 200.0).await.unwrap();
    assert_eq!(
        store.zrange("clients").await.unwrap(),
        vec!["10.0.0.2:4000", "10.0.0.3:4000", "10.0.0.1:4000"]
    );

    assert_eq!(store.zrem_range_by_score("clients", 0.0, 200.0).await.unwrap(), 2);
    assert_eq!(store.zrange("clients").await.unwrap(), vec!["10.0.0.1:4000"]);
    assert!(store.zrem("clients", "10.0.0.1:4000").await.unwrap());
    assert!(!store.zrem("clients", "10.0.0.1:4000").await.unwrap());
    assert!(store.zrange("clients").await.unwrap().is_empty());
}

async fn check_sets_and_lists(store: &dyn StateStore) {
    assert!(store.sadd("dev1:subscriptions", "room/#").await.unwrap());
    assert!(!store.sadd("dev1:subscriptions", "room/#").await.unwrap());
    assert!(store.sadd("dev1:subscriptions", "hall/temp").await.unwrap());
    assert_eq!(store.scard("dev1:subscriptions").await.unwrap(), 2);
    assert!(store.srem("dev1:subscriptions", "room/#").await.unwrap());
    assert_eq!(
        store.smembers("dev1:subscriptions").await.unwrap(),
        vec!["hall/temp".to_string()]
    );
    assert!(store.srem("dev1:subscriptions", "hall/temp").await.unwrap());
    // an emptied collection disappears entirely
    assert!(!store.expire("dev1:subscriptions", Duration::from_secs(1)).await.unwrap());

    assert_eq!(store.rpush("ep:queue", b"A").await.unwrap(), 1);
    assert_eq!(store.rpush("ep:queue", b"B").await.unwrap(), 2);
    assert_eq!(store.llen("ep:queue").await.unwrap(), 2);
    assert_eq!(store.lpop("ep:queue").await.unwrap(), Some(b"A".to_vec()));
    assert_eq!(store.lpop("ep:queue").await.unwrap(), Some(b"B".to_vec()));
    assert_eq!(store.lpop("ep:queue").await.unwrap(), None);
    assert_eq!(store.llen("ep:queue").await.unwrap(), 0);
}

#[tokio::test]
async fn test_memory_store_ttl_expiry() {
    let (store, clock) = memory_store();
    check_ttl_expiry(&store, &clock).await;
}

#[tokio::test]
async fn test_memory_store_sorted_sets() {
    let (store, _) = memory_store();
    check_sorted_sets(&store).await;
}

#[tokio::test]
async fn test_memory_store_sets_and_lists() {
    let (store, _) = memory_store();
    check_sets_and_lists(&store).await;
}

#[tokio::test]
async fn test_incr_counts_from_one() {
    let (store, _) = memory_store();
    assert_eq!(store.incr("topics:next_id").await.unwrap(), 1);
    assert_eq!(store.incr("topics:next_id").await.unwrap(), 2);
    assert_eq!(store.get("topics:next_id").await.unwrap(), Some(b"2".to_vec()));

    store
        .set_ex("not-a-number", b"abc", Duration::from_secs(10))
        .await
        .unwrap();
    assert!(matches!(
        store.incr("not-a-number").await,
        Err(StoreError::InvalidInteger(_))
    ));
}

#[tokio::test]
async fn test_wrong_type_is_reported() {
    let (store, _) = memory_store();
    store.sadd("subscribers", "dev1").await.unwrap();
    assert!(matches!(
        store.lpop("subscribers").await,
        Err(StoreError::WrongType(key)) if key == "subscribers"
    ));
    // the failed command left the set untouched
    assert_eq!(store.scard("subscribers").await.unwrap(), 1);
}

#[tokio::test]
async fn test_set_ex_replaces_previous_value_and_type() {
    let (store, _) = memory_store();
    store.rpush("k", b"x").await.unwrap();
    store.set_ex("k", b"v", Duration::from_secs(1)).await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
    assert!(store.del("k").await.unwrap());
    assert!(!store.del("k").await.unwrap());
}

#[tokio::test]
async fn test_sled_store_matches_memory_semantics() {
    let dir = tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(1_000_000));
    let store = SledStore::open(dir.path().to_str().unwrap(), clock.clone()).unwrap();

    store.ping().await.unwrap();
    check_ttl_expiry(&store, &clock).await;
    check_sorted_sets(&store).await;
    check_sets_and_lists(&store).await;
}

#[tokio::test]
async fn test_sled_store_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().to_str().unwrap().to_string();
    let clock = Arc::new(ManualClock::new(0));

    {
        let store = SledStore::open(&path, clock.clone()).unwrap();
        store.rpush("ep:queue", b"frame").await.unwrap();
        assert!(store.zadd_nx("topics", "room/temp", 1.0).await.unwrap());
        store.flush().await.unwrap();
    }

    let store = SledStore::open(&path, clock).unwrap();
    assert_eq!(store.lpop("ep:queue").await.unwrap(), Some(b"frame".to_vec()));
    assert_eq!(store.zscore("topics", "room/temp").await.unwrap(), Some(1.0));
}

#[tokio::test]
async fn test_expired_key_is_deleted_when_read() {
    let (store, clock) = memory_store();
    store
        .set_ex("dev1:socket", b"10.0.0.1:5000", Duration::from_secs(1))
        .await
        .unwrap();
    clock.advance(Duration::from_secs(2));

    assert_eq!(store.get("dev1:socket").await.unwrap(), None);
    assert!(store.backend.lock().await.is_empty());
}

#[tokio::test]
async fn test_purge_removes_untouched_expired_keys() {
    let (store, clock) = memory_store();
    for port in 0..1000u32 {
        let key = format!("10.0.0.1:{port}:queue");
        store.rpush(&key, b"frame").await.unwrap();
        store.expire(&key, Duration::from_secs(1)).await.unwrap();
    }
    clock.advance(Duration::from_secs(10));
    store.sadd("subscribers", "dev1").await.unwrap();
    assert_eq!(store.backend.lock().await.len(), 1001);

    assert_eq!(store.purge_expired().await.unwrap(), 1000);
    assert_eq!(store.backend.lock().await.len(), 1);
    assert_eq!(store.purge_expired().await.unwrap(), 0);
}

#[tokio::test]
async fn test_sled_store_purges_expired_keys() {
    let dir = tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(1_000_000));
    let store = SledStore::open(dir.path().to_str().unwrap(), clock.clone()).unwrap();
    store.set_ex("a", b"1", Duration::from_secs(1)).await.unwrap();
    store.set_ex("b", b"2", Duration::from_secs(1)).await.unwrap();
    store.set_ex("c", b"3", Duration::from_secs(60)).await.unwrap();

    clock.advance(Duration::from_secs(5));
    assert_eq!(store.purge_expired().await.unwrap(), 2);
    assert_eq!(store.get("c").await.unwrap(), Some(b"3".to_vec()));
}
