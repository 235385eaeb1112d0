//! The [`Cache`] and [`Datastore`] traits (and related items).
//!
//! # Implementing a backend
//!
//! Both traits are sealed with a private `Impl` trait, the same pattern
//! `tower-sesh-core`'s `SessionStore` uses: implement the `*Impl` trait, and
//! the public marker trait is picked up automatically.
//!
//! ```
//! use async_trait::async_trait;
//! use sesh_core::store::{CacheImpl, Error, Ttl};
//! # use sesh_core::store::Cache;
//!
//! struct MyCache { /* ... */ }
//!
//! impl Cache for MyCache {}
//!
//! #[async_trait]
//! impl CacheImpl for MyCache {
//! # async fn get(&self, _sid: &str) -> Result<Option<Vec<u8>>, Error> { todo!() }
//! # async fn set(&self, _sid: &str, _payload: &[u8], _ttl: Ttl) -> Result<(), Error> { todo!() }
//! # async fn delete(&self, _sid: &str) -> Result<(), Error> { todo!() }
//! # async fn flush(&self) -> Result<(), Error> { todo!() }
//!     /* ... */
//! }
//! ```

use std::{error::Error as StdError, fmt};

use async_trait::async_trait;

type Result<T, E = Error> = std::result::Result<T, E>;

/// A point in time at which a cached or stored session record should be
/// considered expired, expressed as Unix-seconds since the epoch.
pub type Ttl = i64;

/// The fast, TTL-bearing tier of [`StorageTier`](crate) storage.
///
/// This trait is sealed and intended to be opaque; implement [`CacheImpl`]
/// instead.
pub trait Cache: 'static + Send + Sync + CacheImpl {}

/// The contents of this trait are kept out of `Cache`'s public API so its
/// shape can evolve without a breaking change to `Cache` itself.
#[doc(hidden)]
#[async_trait]
pub trait CacheImpl: 'static + Send + Sync {
    async fn get(&self, sid: &str) -> Result<Option<Vec<u8>>>;
    async fn set(&self, sid: &str, payload: &[u8], ttl: Ttl) -> Result<()>;
    async fn delete(&self, sid: &str) -> Result<()>;
    async fn flush(&self) -> Result<()>;
}

/// The durable tier of [`StorageTier`](crate) storage.
///
/// This trait is sealed and intended to be opaque; implement [`DatastoreImpl`]
/// instead.
pub trait Datastore: 'static + Send + Sync + DatastoreImpl {}

#[doc(hidden)]
#[async_trait]
pub trait DatastoreImpl: 'static + Send + Sync {
    async fn get(&self, sid: &str) -> Result<Option<Vec<u8>>>;
    async fn put(&self, sid: &str, payload: &[u8]) -> Result<()>;
    async fn delete(&self, sid: &str) -> Result<()>;

    /// Deletes up to `batch` records whose key sorts below `upper_bound`,
    /// returning the number actually deleted.
    ///
    /// Implementations backed by a datastore that orders keys
    /// lexicographically (e.g. an ordered key-value store) can implement
    /// this directly as a range scan against `upper_bound`, which for the
    /// reaper (see [`crate::identifier`]) is the current timestamp followed
    /// by a sentinel character that sorts after every digit. Implementations
    /// backed by an unordered store (e.g. Redis) should instead maintain a
    /// secondary index ordered by expiration.
    async fn range_delete(&self, upper_bound: &str, batch: usize) -> Result<usize>;
}

/// The error type used by [`Cache`] and [`Datastore`] implementations.
///
/// This mirrors `tower-sesh-core::store::Error`'s intent (an opaque, boxed
/// source) but is not itself uninhabited, because unlike the teacher's
/// Redis-only store, `sesh-core` backends legitimately fail at the
/// transport layer and must report that failure up to `StorageTier`, which
/// logs it and treats it as `BackendUnavailable` (spec-defined; never
/// propagated to the HTTP handler).
#[derive(Debug, thiserror::Error)]
#[error("session backend unavailable: {source}")]
pub struct Error {
    #[source]
    source: Box<dyn StdError + Send + Sync>,
}

impl Error {
    pub fn unavailable<E>(source: E) -> Error
    where
        E: StdError + Send + Sync + 'static,
    {
        Error {
            source: Box::new(source),
        }
    }
}

/// Marker struct satisfying `StdError` for backends with no distinguishable
/// failure mode of their own (e.g. the in-memory reference stores, whose
/// operations are infallible).
#[derive(Debug)]
pub struct Infallible(pub &'static str);

impl fmt::Display for Infallible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl StdError for Infallible {}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn dyn_compatible() {
        const _: fn() = || {
            let _dyn_cache: Arc<dyn Cache> = todo!();
            let _dyn_store: Arc<dyn Datastore> = todo!();
        };
    }
}
