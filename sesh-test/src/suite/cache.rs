use std::time::Duration;

use sesh_core::{store::Cache, time::now_unix};

use crate::support::unique_sid;

pub async fn test_cache_get_returns_none_for_missing_key(cache: impl Cache) {
    let sid = unique_sid(now_unix() + 60, false);
    assert_eq!(cache.get(&sid).await.unwrap(), None);
}

pub async fn test_cache_set_then_get_round_trips(cache: impl Cache) {
    let sid = unique_sid(now_unix() + 60, false);
    cache.set(&sid, b"payload", now_unix() + 60).await.unwrap();
    assert_eq!(cache.get(&sid).await.unwrap(), Some(b"payload".to_vec()));
}

pub async fn test_cache_set_overwrites_existing_value(cache: impl Cache) {
    let sid = unique_sid(now_unix() + 60, false);
    cache.set(&sid, b"first", now_unix() + 60).await.unwrap();
    cache.set(&sid, b"second", now_unix() + 60).await.unwrap();
    assert_eq!(cache.get(&sid).await.unwrap(), Some(b"second".to_vec()));
}

pub async fn test_cache_delete_removes_entry(cache: impl Cache) {
    let sid = unique_sid(now_unix() + 60, false);
    cache.set(&sid, b"payload", now_unix() + 60).await.unwrap();
    cache.delete(&sid).await.unwrap();
    assert_eq!(cache.get(&sid).await.unwrap(), None);
}

pub async fn test_cache_delete_does_not_error_for_missing_entry(cache: impl Cache) {
    let sid = unique_sid(now_unix() + 60, false);
    cache.delete(&sid).await.unwrap();
}

pub async fn test_cache_get_returns_none_after_expiry(cache: impl Cache) {
    let sid = unique_sid(now_unix() + 1, false);
    let expires_at = now_unix() + 1;
    cache.set(&sid, b"payload", expires_at).await.unwrap();

    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert_eq!(cache.get(&sid).await.unwrap(), None);
}

pub async fn test_cache_flush_clears_all_entries(cache: impl Cache) {
    let sid_a = unique_sid(now_unix() + 60, false);
    let sid_b = unique_sid(now_unix() + 60, false);
    cache.set(&sid_a, b"a", now_unix() + 60).await.unwrap();
    cache.set(&sid_b, b"b", now_unix() + 60).await.unwrap();

    cache.flush().await.unwrap();

    assert_eq!(cache.get(&sid_a).await.unwrap(), None);
    assert_eq!(cache.get(&sid_b).await.unwrap(), None);
}
