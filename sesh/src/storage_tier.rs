//! Unified read/write across the cache and datastore tiers (spec §4.4).
//!
//! [`crate::session::Session`] is the only caller; this module has no
//! knowledge of cookies, sids-as-strings-vs-[`SessionId`], or dirty
//! tracking — it just executes the tiered policy over whatever payload and
//! TTL it's handed.

use std::sync::Arc;

use sesh_core::store::{Cache, Datastore};

/// The outcome of [`load`].
pub enum Loaded {
    /// The payload was found in the cache or datastore.
    Found(Vec<u8>),
    /// Neither tier had a record for this sid (spec §4.4 "lost").
    Lost,
}

/// Loads a session's payload: cache first, then datastore unless
/// `no_datastore`. A cache miss that the datastore resolves is written back
/// to the cache so the next request doesn't repeat the datastore trip.
pub async fn load(
    cache: &Arc<dyn Cache>,
    datastore: Option<&Arc<dyn Datastore>>,
    sid: &str,
    ttl: i64,
) -> Loaded {
    match cache.get(sid).await {
        Ok(Some(payload)) => return Loaded::Found(payload),
        Ok(None) => {}
        Err(_err) => {
            warn!(err = %_err, sid, "cache read failed, falling back to datastore");
        }
    }

    let Some(datastore) = datastore else {
        return Loaded::Lost;
    };

    match datastore.get(sid).await {
        Ok(Some(payload)) => {
            if let Err(_err) = cache.set(sid, &payload, ttl).await {
                warn!(err = %_err, sid, "cache write-back failed after datastore hit");
            }
            Loaded::Found(payload)
        }
        Ok(None) => Loaded::Lost,
        Err(_err) => {
            warn!(err = %_err, sid, "datastore read failed");
            Loaded::Lost
        }
    }
}

/// Whether a payload of `encoded_len` bytes fits within `threshold` once
/// base64 expansion (×4/3, spec §3) is accounted for.
///
/// A negative threshold means "always tiered" (never cookie-only).
pub fn fits_in_cookie(encoded_len: usize, threshold: i64) -> bool {
    if threshold < 0 {
        return false;
    }
    let expanded = (encoded_len as i64) * 4 / 3;
    expanded <= threshold
}

/// Whether this flush should write to the datastore, given the session's
/// dirty state and configuration (spec §3 "Datastore is never written when
/// `no_datastore` is set or when `dirty == dirty-memonly`").
pub fn should_write_datastore(no_datastore: bool, memory_only: bool) -> bool {
    !no_datastore && !memory_only
}

/// Writes `payload` to the cache (always) and the datastore (per
/// [`should_write_datastore`]). Per spec §4.4, the cache write happens
/// first; if the datastore write fails, the cache write is retried once.
pub async fn store(
    cache: &Arc<dyn Cache>,
    datastore: Option<&Arc<dyn Datastore>>,
    sid: &str,
    payload: &[u8],
    expire_ts: i64,
    write_datastore: bool,
) {
    if let Err(_err) = cache.set(sid, payload, expire_ts).await {
        warn!(err = %_err, sid, "cache write failed");
    }

    if !write_datastore {
        return;
    }

    let Some(datastore) = datastore else {
        return;
    };

    if let Err(_err) = datastore.put(sid, payload).await {
        warn!(err = %_err, sid, "datastore write failed, retrying cache write");
        if let Err(_err) = cache.set(sid, payload, expire_ts).await {
            warn!(err = %_err, sid, "cache write retry also failed");
        }
    }
}

/// Deletes a sid's record from both tiers. Datastore failures are swallowed
/// (spec §4.4): the reaper will eventually catch any record this leaves
/// behind.
pub async fn delete(cache: &Arc<dyn Cache>, datastore: Option<&Arc<dyn Datastore>>, sid: &str) {
    if let Err(_err) = cache.delete(sid).await {
        warn!(err = %_err, sid, "cache delete failed");
    }
    if let Some(datastore) = datastore {
        if let Err(_err) = datastore.delete(sid).await {
            warn!(err = %_err, sid, "datastore delete failed, leaving it for the reaper");
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fits_in_cookie_applies_base64_expansion() {
        assert!(fits_in_cookie(7500, 10_000));
        assert!(!fits_in_cookie(7501, 10_000));
    }

    #[test]
    fn negative_threshold_never_fits() {
        assert!(!fits_in_cookie(0, -1));
    }

    #[test]
    fn datastore_write_gated_by_no_datastore_and_memory_only() {
        assert!(should_write_datastore(false, false));
        assert!(!should_write_datastore(true, false));
        assert!(!should_write_datastore(false, true));
        assert!(!should_write_datastore(true, true));
    }

    #[tokio::test]
    async fn store_and_load_round_trip_through_cache() {
        let cache: Arc<dyn Cache> = Arc::new(crate::store::MemoryCache::new());
        store(&cache, None, "sid", b"payload", 9_999_999_999, true).await;

        match load(&cache, None, "sid", 9_999_999_999).await {
            Loaded::Found(payload) => assert_eq!(payload, b"payload"),
            Loaded::Lost => panic!("expected a hit"),
        }
    }

    #[tokio::test]
    async fn load_reports_lost_when_absent_from_both_tiers() {
        let cache: Arc<dyn Cache> = Arc::new(crate::store::MemoryCache::new());
        let datastore: Arc<dyn Datastore> = Arc::new(crate::store::MemoryDatastore::new());

        match load(&cache, Some(&datastore), "missing", 0).await {
            Loaded::Lost => {}
            Loaded::Found(_) => panic!("expected a miss"),
        }
    }
}
