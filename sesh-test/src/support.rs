//! Small helpers shared across the conformance suite.

use std::sync::atomic::{self, AtomicU64};

use sesh_core::SessionId;

/// Returns a sid that's unique within this process, so conformance tests run
/// against a shared backend (e.g. a real Redis instance) don't collide with
/// each other or with a previous run.
///
/// Mirrors the teacher's `test_key()`: a per-process counter is enough to
/// avoid collisions within a single test binary, which is the only thing
/// that matters since every test here owns the sid it mints.
pub fn unique_sid(expire_ts: i64, secure_only: bool) -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    let salt = COUNTER.fetch_add(1, atomic::Ordering::SeqCst);

    let sid = SessionId::make(expire_ts, secure_only);
    // Splice the counter over the first few hex characters of the random
    // token so two sids minted in the same process-wide second never
    // collide, without needing a real RNG seam into `SessionId::make`.
    let mut s = sid.as_str().to_owned();
    let salt_hex = format!("{salt:08x}");
    let start = s.len() - salt_hex.len();
    s.replace_range(start.., &salt_hex);
    s
}
