use std::{
    sync::atomic::{self, AtomicU64},
    time::Duration,
};

use redis::aio::ConnectionManagerConfig;
use sesh_store_redis::{RedisCache, RedisDatastore};
use sesh_test::{cache_test_suite, datastore_test_suite};

fn redis_url() -> String {
    std::env::var("REDIS_URL").expect("REDIS_URL environment variable must be set to run tests")
}

fn connection_manager_config() -> ConnectionManagerConfig {
    ConnectionManagerConfig::new()
        .set_connection_timeout(Duration::from_secs(5))
        .set_number_of_retries(1)
}

/// `flush` (cache) and `range_delete` (datastore) act on every key sharing a
/// prefix/index, not just the one a single test minted — unlike
/// `sesh_test::support::unique_sid`, which only keeps individual keys from
/// colliding. Giving every generated test its own prefix and index key keeps
/// those whole-namespace operations from seeing (or clearing) a sibling
/// test's data when `cargo test` runs this suite's tests concurrently
/// against one shared Redis instance.
fn unique_namespace() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    let n = COUNTER.fetch_add(1, atomic::Ordering::SeqCst);
    format!("sesh:suite:{}:{n}:", std::process::id())
}

mod redis_cache {
    use super::*;

    cache_test_suite! {
        store: RedisCache::with_config(redis_url(), connection_manager_config())
            .await
            .expect("failed to connect to redis")
            .key_prefix(unique_namespace()),
    }
}

mod redis_datastore {
    use super::*;

    datastore_test_suite! {
        store: {
            let ns = unique_namespace();
            RedisDatastore::with_config(redis_url(), connection_manager_config())
                .await
                .expect("failed to connect to redis")
                .key_prefix(format!("{ns}store:"))
                .index_key(format!("{ns}expirations"))
        },
    }
}
