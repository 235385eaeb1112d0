use sesh_core::{store::Datastore, time::now_unix};

use crate::support::unique_sid;

const SENTINEL: char = '\u{fffd}';

fn upper_bound(expire_ts: i64) -> String {
    format!("{:010}{SENTINEL}", expire_ts)
}

pub async fn test_datastore_get_returns_none_for_missing_key(store: impl Datastore) {
    let sid = unique_sid(now_unix() + 60, false);
    assert_eq!(store.get(&sid).await.unwrap(), None);
}

pub async fn test_datastore_put_then_get_round_trips(store: impl Datastore) {
    let sid = unique_sid(now_unix() + 60, false);
    store.put(&sid, b"payload").await.unwrap();
    assert_eq!(store.get(&sid).await.unwrap(), Some(b"payload".to_vec()));
}

pub async fn test_datastore_put_overwrites_existing_value(store: impl Datastore) {
    let sid = unique_sid(now_unix() + 60, false);
    store.put(&sid, b"first").await.unwrap();
    store.put(&sid, b"second").await.unwrap();
    assert_eq!(store.get(&sid).await.unwrap(), Some(b"second".to_vec()));
}

pub async fn test_datastore_delete_removes_entry(store: impl Datastore) {
    let sid = unique_sid(now_unix() + 60, false);
    store.put(&sid, b"payload").await.unwrap();
    store.delete(&sid).await.unwrap();
    assert_eq!(store.get(&sid).await.unwrap(), None);
}

pub async fn test_datastore_delete_does_not_error_for_missing_entry(store: impl Datastore) {
    let sid = unique_sid(now_unix() + 60, false);
    store.delete(&sid).await.unwrap();
}

/// Mirrors spec §8 end-to-end scenario 6: a batch of expired records is
/// swept in bounded-size chunks, `range_delete` reporting fewer than
/// `batch` deleted once everything currently expired is gone.
pub async fn test_datastore_range_delete_respects_batch_size(store: impl Datastore) {
    let now = now_unix();
    let mut sids = Vec::new();
    for i in 0..12 {
        let sid = unique_sid(now - 1000 + i, false);
        store.put(&sid, b"x").await.unwrap();
        sids.push(sid);
    }

    let bound = upper_bound(now);
    let deleted = store.range_delete(&bound, 5).await.unwrap();
    assert_eq!(deleted, 5);

    let mut total = deleted;
    loop {
        let deleted = store.range_delete(&bound, 5).await.unwrap();
        total += deleted;
        if deleted < 5 {
            break;
        }
    }
    assert_eq!(total, sids.len());

    for sid in &sids {
        assert_eq!(store.get(sid).await.unwrap(), None);
    }
}

pub async fn test_datastore_range_delete_only_below_upper_bound(store: impl Datastore) {
    let now = now_unix();
    let expired = unique_sid(now - 100, false);
    let future = unique_sid(now + 100_000, false);
    store.put(&expired, b"x").await.unwrap();
    store.put(&future, b"x").await.unwrap();

    let deleted = store.range_delete(&upper_bound(now), 500).await.unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(store.get(&expired).await.unwrap(), None);
    assert!(store.get(&future).await.unwrap().is_some());
}

pub async fn test_datastore_range_delete_reports_zero_when_nothing_expired(store: impl Datastore) {
    let future = unique_sid(now_unix() + 100_000, false);
    store.put(&future, b"x").await.unwrap();

    let deleted = store.range_delete(&upper_bound(now_unix()), 500).await.unwrap();
    assert_eq!(deleted, 0);
}

/// Spec §4.6's literal range, `sid < now||U+FFFD`, includes a sid whose
/// embedded expiration equals `now` exactly: its separator byte (`_`/`S`)
/// still sorts below the sentinel. Every `Datastore` must agree on this
/// boundary, not just on records that are clearly expired or clearly not.
pub async fn test_datastore_range_delete_includes_exact_boundary(store: impl Datastore) {
    let now = now_unix();
    let sid = unique_sid(now, false);
    store.put(&sid, b"x").await.unwrap();

    let deleted = store.range_delete(&upper_bound(now), 500).await.unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(store.get(&sid).await.unwrap(), None);
}
