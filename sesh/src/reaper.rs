//! The expiration reaper (spec §4.6, §9 resolved open question).
//!
//! A [`SessionId`] begins with its zero-padded expiration timestamp, so an
//! ordered datastore can delete every session that expired before `now` in
//! bounded-size batches with a plain key-range scan: the trick
//! `original_source/gaesessions` uses (`__key__ < str(now) + u'�'`).
//! For a datastore that isn't naturally ordered (e.g. Redis), the backend's
//! own `range_delete` is expected to consult a secondary index instead —
//! this module only drives the loop, it doesn't care which.
//!
//! [`SessionId`]: sesh_core::SessionId

use std::sync::Arc;

use sesh_core::{store::Datastore, time::now_unix};

/// A sentinel character that sorts after every ASCII digit (and after both
/// separator bytes, `_`/`S`), appended to the current timestamp so the
/// range scan's upper bound *includes* every sid that expires at or before
/// `now` — a sid expiring exactly `now` still sorts below `now||sentinel`,
/// since its separator byte comes before the sentinel (matching
/// `original_source/gaesessions`'s use of `u'�'`, the last valid Unicode
/// codepoint in its comparison scheme).
const UPPER_BOUND_SENTINEL: char = '\u{fffd}';

/// Deletes up to `batch_size` expired records from `datastore` and returns
/// whether everything currently expired has been swept (`true`) or whether
/// there may be more left for the next call (`false`).
///
/// Callers are expected to loop until this returns `true`, e.g. on a timer:
///
/// ```ignore
/// loop {
///     if reaper::delete_expired(&datastore, 500).await {
///         break;
///     }
/// }
/// ```
pub async fn delete_expired(datastore: &Arc<dyn Datastore>, batch_size: usize) -> bool {
    let upper_bound = format!("{:010}{UPPER_BOUND_SENTINEL}", now_unix());

    match datastore.range_delete(&upper_bound, batch_size).await {
        Ok(deleted) => deleted < batch_size,
        Err(_err) => {
            warn!(err = %_err, "reaper sweep failed, will retry next tick");
            true
        }
    }
}

#[cfg(test)]
mod test {
    use crate::store::MemoryDatastore;

    use super::*;

    #[tokio::test]
    async fn sweeps_expired_records_in_batches() {
        let datastore: Arc<dyn Datastore> = Arc::new(MemoryDatastore::new());
        for i in 0..25 {
            let sid = format!("{:010}_{i:032x}", now_unix() - 1000 + i);
            datastore.put(&sid, b"x").await.unwrap();
        }

        let mut rounds = 0;
        loop {
            rounds += 1;
            if delete_expired(&datastore, 10).await {
                break;
            }
            assert!(rounds < 10, "reaper looped too many times");
        }

        assert_eq!(rounds, 3);
    }

    #[tokio::test]
    async fn leaves_unexpired_records_alone() {
        let datastore: Arc<dyn Datastore> = Arc::new(MemoryDatastore::new());
        let future_sid = format!("{:010}_{:032x}", now_unix() + 1_000_000, 0);
        datastore.put(&future_sid, b"x").await.unwrap();

        assert!(delete_expired(&datastore, 500).await);
        assert!(datastore.get(&future_sid).await.unwrap().is_some());
    }
}
