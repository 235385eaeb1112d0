//! Reference [`Cache`] and [`Datastore`] implementations backed by
//! in-process maps.
//!
//! These are what `sesh`'s own tests run against, and are suitable for
//! single-process deployments. Production multi-worker deployments want a
//! shared backend — see `sesh-store-redis` for the durable tier.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use sesh_core::{
    store::{Cache, CacheImpl, Datastore, DatastoreImpl, Error, Ttl},
    time::now_unix,
};

struct Entry {
    payload: Vec<u8>,
    expires_at: Ttl,
}

/// An in-memory [`Cache`], TTL-swept on read.
///
/// Grounded on the teacher's `dashmap`-backed `MemoryStore`, but uses a
/// plain `parking_lot`-guarded [`std::collections::HashMap`] since the
/// `memory-store` feature here doesn't need `dashmap`'s sharded concurrency
/// (sessions are looked up by sid, one at a time, not scanned).
#[derive(Default)]
pub struct MemoryCache {
    map: Mutex<std::collections::HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for MemoryCache {}

#[async_trait]
impl CacheImpl for MemoryCache {
    async fn get(&self, sid: &str) -> Result<Option<Vec<u8>>, Error> {
        let mut map = self.map.lock();
        if let Some(entry) = map.get(sid) {
            if entry.expires_at <= now_unix() {
                map.remove(sid);
                return Ok(None);
            }
            return Ok(Some(entry.payload.clone()));
        }
        Ok(None)
    }

    async fn set(&self, sid: &str, payload: &[u8], ttl: Ttl) -> Result<(), Error> {
        self.map.lock().insert(
            sid.to_owned(),
            Entry {
                payload: payload.to_vec(),
                expires_at: ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, sid: &str) -> Result<(), Error> {
        self.map.lock().remove(sid);
        Ok(())
    }

    async fn flush(&self) -> Result<(), Error> {
        self.map.lock().clear();
        Ok(())
    }
}

/// An in-memory [`Datastore`] backed by a [`BTreeMap`].
///
/// The `BTreeMap` is deliberate, not incidental: because a [`SessionId`]
/// begins with its zero-padded expiration timestamp, keys sort by
/// expiration, which lets [`DatastoreImpl::range_delete`] implement the
/// reaper's bulk sweep as a plain ordered-range scan — the same trick
/// `original_source/gaesessions` uses against its ordered datastore (see
/// DESIGN.md).
///
/// [`SessionId`]: sesh_core::SessionId
#[derive(Default)]
pub struct MemoryDatastore {
    map: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records currently stored. Exposed for tests.
    pub fn len(&self) -> usize {
        self.map.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Datastore for MemoryDatastore {}

#[async_trait]
impl DatastoreImpl for MemoryDatastore {
    async fn get(&self, sid: &str) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.map.lock().get(sid).cloned())
    }

    async fn put(&self, sid: &str, payload: &[u8]) -> Result<(), Error> {
        self.map.lock().insert(sid.to_owned(), payload.to_vec());
        Ok(())
    }

    async fn delete(&self, sid: &str) -> Result<(), Error> {
        self.map.lock().remove(sid);
        Ok(())
    }

    async fn range_delete(&self, upper_bound: &str, batch: usize) -> Result<usize, Error> {
        let mut map = self.map.lock();
        let keys: Vec<String> = map
            .range(..upper_bound.to_owned())
            .take(batch)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &keys {
            map.remove(key);
        }
        Ok(keys.len())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn cache_expires_entries_on_read() {
        let cache = MemoryCache::new();
        cache.set("sid", b"payload", now_unix() - 1).await.unwrap();
        assert_eq!(cache.get("sid").await.unwrap(), None);
    }

    #[tokio::test]
    async fn cache_round_trips_unexpired_entries() {
        let cache = MemoryCache::new();
        cache.set("sid", b"payload", now_unix() + 60).await.unwrap();
        assert_eq!(
            cache.get("sid").await.unwrap(),
            Some(b"payload".to_vec())
        );
    }

    #[tokio::test]
    async fn datastore_range_delete_respects_batch_size() {
        let store = MemoryDatastore::new();
        for i in 0..20 {
            let sid = format!("{i:010}_deadbeef");
            store.put(&sid, b"x").await.unwrap();
        }

        let deleted = store.range_delete("0000000015", 5).await.unwrap();
        assert_eq!(deleted, 5);
        assert_eq!(store.len(), 15);
    }

    #[tokio::test]
    async fn datastore_range_delete_only_below_upper_bound() {
        let store = MemoryDatastore::new();
        store.put("0000000010_aaaa", b"x").await.unwrap();
        store.put("0000000020_bbbb", b"x").await.unwrap();

        let deleted = store.range_delete("0000000015", 500).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(store.get("0000000010_aaaa").await.unwrap().is_none());
        assert!(store.get("0000000020_bbbb").await.unwrap().is_some());
    }
}
