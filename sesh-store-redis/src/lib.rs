#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Redis-backed [`Cache`] and [`Datastore`] tiers for [`sesh`].
//!
//! [`sesh`]: https://docs.rs/sesh/latest/sesh/
//!
//! [`RedisCache`] is a thin wrapper over `SET ... EXAT` / `GET` / `DEL`,
//! suitable for the fast TTL-bearing tier spec §4.4 calls for. [`RedisDatastore`]
//! additionally maintains a Redis sorted set keyed by each session's
//! embedded expiration timestamp, since (unlike the in-memory
//! `BTreeMap`-backed reference datastore `sesh::store::MemoryDatastore`
//! uses) Redis does not order plain string keys — this is the "indexed
//! expiration attribute" spec §9's reaper open question calls for on an
//! unordered store. See `DESIGN.md` for the full resolution.

use std::borrow::Cow;

use async_trait::async_trait;
use futures::StreamExt;
use redis::{
    aio::ConnectionManagerConfig, AsyncCommands, Client, IntoConnectionInfo, RedisResult,
    SetExpiry, SetOptions,
};
use sesh_core::{
    store::{Cache, CacheImpl, Datastore, DatastoreImpl, Error, Ttl},
    SessionId,
};

pub mod connection;

use connection::ConnectionManagerWithRetry;

type Result<T, E = Error> = std::result::Result<T, E>;

const DEFAULT_CACHE_PREFIX: &str = "sesh:cache:";
const DEFAULT_DATASTORE_PREFIX: &str = "sesh:store:";
const DEFAULT_INDEX_KEY: &str = "sesh:expirations";

/// A [`Cache`] backed by a Redis `SET`/`GET`/`DEL` with TTL via `EXAT`.
pub struct RedisCache {
    conn: ConnectionManagerWithRetry,
    key_prefix: Cow<'static, str>,
}

impl RedisCache {
    /// Connects to a Redis server and returns a cache with default
    /// configuration.
    ///
    /// `info` follows the usual `redis://[<user>][:<pass>@]<host>[:port][/<db>]`
    /// form.
    pub async fn open<I: IntoConnectionInfo>(info: I) -> RedisResult<RedisCache> {
        RedisCache::with_config(info, ConnectionManagerConfig::default()).await
    }

    pub async fn with_config<I: IntoConnectionInfo>(
        info: I,
        config: ConnectionManagerConfig,
    ) -> RedisResult<RedisCache> {
        let client = Client::open(info)?;
        let conn = ConnectionManagerWithRetry::with_config(client, config).await?;
        Ok(RedisCache {
            conn,
            key_prefix: Cow::Borrowed(DEFAULT_CACHE_PREFIX),
        })
    }

    /// Sets the Redis key prefix used for cache entries. Default is
    /// `"sesh:cache:"`.
    pub fn key_prefix(mut self, prefix: impl Into<Cow<'static, str>>) -> RedisCache {
        self.key_prefix = prefix.into();
        self
    }

    fn redis_key(&self, sid: &str) -> String {
        let mut key = String::with_capacity(self.key_prefix.len() + sid.len());
        key.push_str(&self.key_prefix);
        key.push_str(sid);
        key
    }
}

impl Cache for RedisCache {}

#[async_trait]
impl CacheImpl for RedisCache {
    async fn get(&self, sid: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let key = self.redis_key(sid);
        conn.get(&key).await.map_err(Error::unavailable)
    }

    async fn set(&self, sid: &str, payload: &[u8], ttl: Ttl) -> Result<()> {
        let mut conn = self.conn.clone();
        let key = self.redis_key(sid);
        let expiry = expiry_from_ttl(ttl)?;
        let options = SetOptions::default().with_expiration(expiry);
        let _: () = conn
            .set_options(&key, payload, options)
            .await
            .map_err(Error::unavailable)?;
        Ok(())
    }

    async fn delete(&self, sid: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let key = self.redis_key(sid);
        let _: () = conn.del(&key).await.map_err(Error::unavailable)?;
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", self.key_prefix);

        let mut keys: Vec<String> = Vec::new();
        {
            let mut iter: redis::AsyncIter<'_, String> = conn
                .scan_match(&pattern)
                .await
                .map_err(Error::unavailable)?;
            while let Some(key) = iter.next().await {
                keys.push(key);
            }
        }

        if keys.is_empty() {
            return Ok(());
        }

        let _: () = conn.del(keys).await.map_err(Error::unavailable)?;
        Ok(())
    }
}

/// A [`Datastore`] backed by Redis, with a secondary sorted set indexing
/// records by their embedded expiration so [`DatastoreImpl::range_delete`]
/// can sweep expired records without relying on Redis key ordering (which
/// doesn't exist).
pub struct RedisDatastore {
    conn: ConnectionManagerWithRetry,
    key_prefix: Cow<'static, str>,
    index_key: Cow<'static, str>,
}

impl RedisDatastore {
    pub async fn open<I: IntoConnectionInfo>(info: I) -> RedisResult<RedisDatastore> {
        RedisDatastore::with_config(info, ConnectionManagerConfig::default()).await
    }

    pub async fn with_config<I: IntoConnectionInfo>(
        info: I,
        config: ConnectionManagerConfig,
    ) -> RedisResult<RedisDatastore> {
        let client = Client::open(info)?;
        let conn = ConnectionManagerWithRetry::with_config(client, config).await?;
        Ok(RedisDatastore {
            conn,
            key_prefix: Cow::Borrowed(DEFAULT_DATASTORE_PREFIX),
            index_key: Cow::Borrowed(DEFAULT_INDEX_KEY),
        })
    }

    /// Sets the Redis key prefix used for session records. Default is
    /// `"sesh:store:"`.
    pub fn key_prefix(mut self, prefix: impl Into<Cow<'static, str>>) -> RedisDatastore {
        self.key_prefix = prefix.into();
        self
    }

    /// Sets the name of the sorted set used to index records by
    /// expiration. Default is `"sesh:expirations"`.
    pub fn index_key(mut self, key: impl Into<Cow<'static, str>>) -> RedisDatastore {
        self.index_key = key.into();
        self
    }

    fn redis_key(&self, sid: &str) -> String {
        let mut key = String::with_capacity(self.key_prefix.len() + sid.len());
        key.push_str(&self.key_prefix);
        key.push_str(sid);
        key
    }
}

impl Datastore for RedisDatastore {}

#[async_trait]
impl DatastoreImpl for RedisDatastore {
    async fn get(&self, sid: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let key = self.redis_key(sid);
        conn.get(&key).await.map_err(Error::unavailable)
    }

    async fn put(&self, sid: &str, payload: &[u8]) -> Result<()> {
        let mut conn = self.conn.clone();
        let key = self.redis_key(sid);

        // The sid's leading digits are its own expiration (see
        // `sesh_core::identifier`); indexing on that, rather than taking an
        // explicit TTL parameter, keeps `Datastore::put`'s signature
        // agnostic of how a given sid was minted.
        let score = SessionId::parse(sid).map(SessionId::expiration).unwrap_or(0);

        let mut pipe = redis::pipe();
        pipe.atomic()
            .set(&key, payload)
            .ignore()
            .zadd(self.index_key.as_ref(), sid, score)
            .ignore();
        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(Error::unavailable)?;

        Ok(())
    }

    async fn delete(&self, sid: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let key = self.redis_key(sid);

        let mut pipe = redis::pipe();
        pipe.atomic()
            .del(&key)
            .ignore()
            .zrem(self.index_key.as_ref(), sid)
            .ignore();
        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(Error::unavailable)?;

        Ok(())
    }

    async fn range_delete(&self, upper_bound: &str, batch: usize) -> Result<usize> {
        let mut conn = self.conn.clone();
        let score = parse_score_upper_bound(upper_bound);

        // Inclusive of `score` itself: a sid expiring at exactly `now` still
        // sorts below `upper_bound` lexicographically (its separator byte
        // is less than the sentinel), so `sesh::store::MemoryDatastore`'s
        // `range(..upper_bound)` deletes it too. `ZRANGEBYSCORE`'s max is
        // inclusive by default, so passing `score` (not `score - 1`) keeps
        // both `Datastore` implementations agreeing at the boundary.
        let sids: Vec<String> = conn
            .zrangebyscore_limit(self.index_key.as_ref(), i64::MIN, score, 0, batch as isize)
            .await
            .map_err(Error::unavailable)?;

        if sids.is_empty() {
            return Ok(0);
        }

        let keys: Vec<String> = sids.iter().map(|sid| self.redis_key(sid)).collect();

        let mut pipe = redis::pipe();
        pipe.atomic()
            .del(keys)
            .ignore()
            .zrem(self.index_key.as_ref(), &sids)
            .ignore();
        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(Error::unavailable)?;

        Ok(sids.len())
    }
}

/// Parses the leading ASCII digits off a `range_delete` upper bound
/// (`reaper::delete_expired` formats it as `{:010}{sentinel}`), returning
/// the numeric boundary. Any non-digit prefix (malformed input) parses as
/// `0`, which sweeps nothing rather than sweeping everything.
fn parse_score_upper_bound(upper_bound: &str) -> i64 {
    let digits: String = upper_bound.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

fn expiry_from_ttl(ttl: Ttl) -> Result<SetExpiry> {
    match u64::try_from(ttl) {
        Ok(timestamp) => Ok(SetExpiry::EXAT(timestamp)),
        Err(_) => Err(Error::unavailable(InvalidTtl(ttl))),
    }
}

#[derive(Debug)]
struct InvalidTtl(i64);

impl std::fmt::Display for InvalidTtl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ttl must be a non-negative unix timestamp, got {}", self.0)
    }
}

impl std::error::Error for InvalidTtl {}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn dyn_compatible() {
        const _: fn() = || {
            let _dyn_cache: Arc<dyn Cache> = todo!();
            let _dyn_store: Arc<dyn Datastore> = todo!();
            fn _require<T: Cache>() {}
            fn _require_ds<T: Datastore>() {}
            _require::<RedisCache>();
            _require_ds::<RedisDatastore>();
        };
    }

    #[test]
    fn upper_bound_parses_leading_digits() {
        assert_eq!(parse_score_upper_bound("1700000000\u{fffd}"), 1_700_000_000);
        assert_eq!(parse_score_upper_bound("not-a-number"), 0);
    }
}
