//! The per-request session façade (spec §4.5).
//!
//! [`Session`]'s interior state is `Arc<parking_lot::Mutex<SessionInner>>`,
//! matching the teacher's `Session<T>` representation exactly: cloning a
//! handle is cheap and every clone observes the same mutations, which is
//! what makes an axum extractor and the middleware's post-handler hook see
//! the same session instance.

use std::{collections::HashSet, error::Error, fmt, sync::Arc};

#[cfg(feature = "axum")]
use async_trait::async_trait;
use base64::Engine as _;
use http::{Extensions, HeaderMap};
use parking_lot::Mutex;
use sesh_core::{
    signer,
    store::{Cache, Datastore},
    time::now_unix,
    SessionId,
};
use time::OffsetDateTime;

use crate::{
    codec,
    config::Config,
    storage_tier,
    value::{Map, Value},
};
use crate::cookie as fragments;

const BASE64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// The session's dirty state (spec §9 "sentinel 'dirty' values": a
/// 3-valued enumeration rather than the original's `False`/`1`/`True`
/// overload of a single field).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Dirty {
    Clean,
    /// Changed via a `*_quick` mutator: persist to cache this flush, but
    /// not to the datastore, unless a non-quick mutator escalates this to
    /// `Dirty` first.
    MemoryOnly,
    Dirty,
}

impl Dirty {
    fn escalate(self) -> Dirty {
        Dirty::Dirty
    }

    fn escalate_quick(self) -> Dirty {
        match self {
            Dirty::Clean => Dirty::MemoryOnly,
            other => other,
        }
    }
}

/// What [`Session::emit_cookie_headers`] should do at the end of the
/// request. Corresponds to spec §3's `pending_cookie_payload`: null (here
/// `None`) means no cookie change, empty means expire, non-null carries the
/// bytes to embed in the reissued cookie.
enum CookiePending {
    None,
    Expire,
    Set(Vec<u8>),
}

struct SessionInner {
    sid: Option<SessionId>,
    /// `None` until loaded; distinguishes "not yet loaded" from "loaded and
    /// empty" per spec §3's `data == null` invariant.
    data: Option<Map<String, Value>>,
    /// Set when `data` is `None` and a payload source is already known (a
    /// cookie-only payload needs no backend I/O; a tiered payload does).
    pending_source: Option<PayloadSource>,
    dirty: Dirty,
    /// Names of cookie fragments present on the incoming request, used to
    /// expire stale fragments and to decide whether a signature failure is
    /// worth expiring at all.
    cookie_keys: Vec<String>,
    cookie_pending: CookiePending,
}

#[derive(Clone)]
enum PayloadSource {
    Cookie(Vec<u8>),
    Backend,
}

/// A per-request session handle.
///
/// Every read (`get`, `contains_key`, …) triggers a lazy load if the
/// session is active but its data hasn't been materialized yet. Every
/// mutator marks the session dirty so the next [`Session::flush`] persists
/// it.
pub struct Session {
    inner: Arc<Mutex<SessionInner>>,
    cache: Arc<dyn Cache>,
    datastore: Option<Arc<dyn Datastore>>,
    config: Arc<Config>,
}

impl Clone for Session {
    fn clone(&self) -> Self {
        Session {
            inner: Arc::clone(&self.inner),
            cache: Arc::clone(&self.cache),
            datastore: self.datastore.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

/// The error returned by [`Session::get_item`] when the key is absent.
///
/// Surfaced to the handler exactly as any mapping lookup would be (spec
/// §7's `KeyMissing`).
#[derive(Debug, thiserror::Error)]
#[error("session key missing: {0:?}")]
pub struct KeyMissing(pub String);

impl Session {
    /// Builds a `Session` from the incoming request's `Cookie` header,
    /// verifying the MAC over any fragments matching `config.cookie_name`.
    ///
    /// Cookie parse errors, MAC mismatches, and malformed base64 all result
    /// in an inactive session (spec §4.5 "Failure semantics"); a
    /// `SignatureMismatch` additionally arranges for the stale fragments to
    /// be expired in the response (spec §9's resolved open question).
    pub fn from_headers(
        headers: &HeaderMap,
        cache: Arc<dyn Cache>,
        datastore: Option<Arc<dyn Datastore>>,
        config: Arc<Config>,
    ) -> Session {
        let fragments = fragments_from_headers(headers, &config.cookie_name);
        let cookie_keys: Vec<String> = fragments.iter().map(|(name, _)| name.clone()).collect();

        let (sid, pending_source, signature_failed) = match parse_signed_cookie(&fragments, &config)
        {
            Some((sid, source)) => (Some(sid), Some(source), false),
            None if fragments.is_empty() => (None, None, false),
            None => (None, None, true),
        };

        let cookie_pending = if signature_failed && !cookie_keys.is_empty() {
            warn!(cookie_keys = ?cookie_keys, "session cookie failed MAC verification");
            CookiePending::Expire
        } else {
            CookiePending::None
        };

        let inner = SessionInner {
            sid,
            data: None,
            pending_source,
            dirty: Dirty::Clean,
            cookie_keys,
            cookie_pending,
        };

        Session {
            inner: Arc::new(Mutex::new(inner)),
            cache,
            datastore,
            config,
        }
    }

    pub(crate) fn insert_into(self, extensions: &mut Extensions) {
        extensions.insert(self);
    }

    pub(crate) fn extract(extensions: &Extensions) -> Option<Session> {
        extensions.get::<Session>().cloned()
    }

    /// Returns `true` if this session has an active sid.
    pub fn is_active(&self) -> bool {
        self.inner.lock().sid.is_some()
    }

    /// Returns `true` if the active sid carries the secure-only marker.
    pub fn is_secure_only(&self) -> bool {
        self.inner
            .lock()
            .sid
            .as_ref()
            .map(SessionId::is_secure)
            .unwrap_or(false)
    }

    /// The active sid's embedded expiration (Unix seconds), or `0` if
    /// there is no active session.
    pub fn expiration(&self) -> i64 {
        self.inner
            .lock()
            .sid
            .as_ref()
            .map(SessionId::expiration)
            .unwrap_or(0)
    }

    async fn ensure_loaded(&self) {
        let (sid, source) = {
            let inner = self.inner.lock();
            if inner.data.is_some() {
                return;
            }
            let Some(sid) = inner.sid.clone() else {
                return;
            };
            (sid, inner.pending_source.clone())
        };

        let payload = match source {
            Some(PayloadSource::Cookie(bytes)) => Some(bytes),
            Some(PayloadSource::Backend) | None => {
                match storage_tier::load(&self.cache, self.datastore.as_ref(), sid.as_str(), sid.expiration())
                    .await
                {
                    storage_tier::Loaded::Found(bytes) => Some(bytes),
                    storage_tier::Loaded::Lost => None,
                }
            }
        };

        let Some(payload) = payload else {
            // spec §7 SessionLost: terminate without a backend delete (there's
            // nothing there to delete), but still expire a stale cookie.
            self.terminate(false).await;
            return;
        };

        let data = codec::decode(&payload).unwrap_or_else(|_err| {
            warn!(err = %_err, sid = sid.as_str(), "corrupt session payload, starting fresh");
            Map::new()
        });

        {
            let mut inner = self.inner.lock();
            inner.data = Some(data);
            inner.pending_source = None;
        }

        if now_unix() > sid.expiration() {
            self.terminate(true).await;
        }
    }

    /// Retrieves a value, or `None` if absent or the session is inactive.
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.ensure_loaded().await;
        self.inner.lock().data.as_ref()?.get(key).cloned()
    }

    /// Retrieves a value, returning [`KeyMissing`] if absent.
    pub async fn get_item(&self, key: &str) -> Result<Value, KeyMissing> {
        self.get(key).await.ok_or_else(|| KeyMissing(key.to_owned()))
    }

    /// Returns `true` if `key` is present.
    pub async fn contains_key(&self, key: &str) -> bool {
        self.ensure_loaded().await;
        self.inner
            .lock()
            .data
            .as_ref()
            .map(|data| data.contains_key(key))
            .unwrap_or(false)
    }

    /// Alias for [`Session::contains_key`], matching the original's
    /// `has_key`.
    pub async fn has_key(&self, key: &str) -> bool {
        self.contains_key(key).await
    }

    /// Sets a value, starting the session first if it isn't active yet.
    pub async fn set_item(&self, key: impl Into<String>, value: impl Into<Value>) {
        if !self.is_active() {
            self.start(None, false);
        }
        self.ensure_loaded().await;

        let mut inner = self.inner.lock();
        inner
            .data
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        inner.dirty = inner.dirty.escalate();
    }

    /// Sets a value, marking the session dirty-in-cache-only: the datastore
    /// write is deferred until a non-quick mutator runs in the same
    /// request (spec §4.5's `set_quick`).
    ///
    /// The dirty state is captured *before* the implicit `start()` below,
    /// not after: `start()` always marks a freshly allocated session fully
    /// `Dirty` (it has no way to know the mutator that triggered it was a
    /// quick one), so escalating from the post-`start` state would turn a
    /// `set_quick` on a sessionless instance into a full `Dirty` — exactly
    /// the case `original_source/gaesessions`' `set_quick` avoids by
    /// reading `dirty` before it calls the equivalent of `start()`.
    pub async fn set_quick(&self, key: impl Into<String>, value: impl Into<Value>) {
        let prior_dirty = self.inner.lock().dirty;
        if !self.is_active() {
            self.start(None, false);
        }
        self.ensure_loaded().await;

        let mut inner = self.inner.lock();
        inner
            .data
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        inner.dirty = prior_dirty.escalate_quick();
    }

    /// Deletes `key` if present.
    pub async fn del_item(&self, key: &str) {
        self.ensure_loaded().await;
        let mut inner = self.inner.lock();
        if let Some(data) = inner.data.as_mut() {
            data.remove(key);
        }
        inner.dirty = inner.dirty.escalate();
    }

    /// Removes `key` and returns its prior value, if any.
    pub async fn pop(&self, key: &str) -> Option<Value> {
        self.ensure_loaded().await;
        let mut inner = self.inner.lock();
        let popped = inner.data.as_mut().and_then(|data| data.remove(key));
        inner.dirty = inner.dirty.escalate();
        popped
    }

    /// Like [`Session::pop`], but marks dirty-in-cache-only (spec §4.5's
    /// `pop_quick`).
    pub async fn pop_quick(&self, key: &str) -> Option<Value> {
        self.ensure_loaded().await;
        let mut inner = self.inner.lock();
        let popped = inner.data.as_mut().and_then(|data| data.remove(key));
        inner.dirty = inner.dirty.escalate_quick();
        popped
    }

    /// Removes all data without terminating the session.
    pub async fn clear(&self) {
        if !self.is_active() {
            return;
        }
        let mut inner = self.inner.lock();
        inner.data = Some(Map::new());
        inner.dirty = inner.dirty.escalate();
    }

    /// Starts a fresh session: allocates a sid, empties data, marks dirty.
    /// Not normally called directly — implicit on first write.
    pub fn start(&self, expire_ts: Option<i64>, secure_only: bool) {
        let expire_ts = expire_ts.unwrap_or_else(|| now_unix() + self.config.lifetime_seconds);
        let mut inner = self.inner.lock();
        inner.sid = Some(SessionId::make(expire_ts, secure_only));
        inner.data = Some(Map::new());
        inner.pending_source = None;
        inner.dirty = Dirty::Dirty;
    }

    /// Ends the session: if `clear_data`, deletes its backend record;
    /// always nulls the sid and data, and arranges to expire the browser
    /// cookie if the request carried one.
    pub async fn terminate(&self, clear_data: bool) {
        let sid = {
            let inner = self.inner.lock();
            inner.sid.clone()
        };

        if clear_data {
            if let Some(sid) = &sid {
                storage_tier::delete(&self.cache, self.datastore.as_ref(), sid.as_str()).await;
            }
        }

        let mut inner = self.inner.lock();
        inner.sid = None;
        inner.data = None;
        inner.pending_source = None;
        inner.dirty = Dirty::Clean;
        inner.cookie_pending = if inner.cookie_keys.is_empty() {
            CookiePending::None
        } else {
            CookiePending::Expire
        };
    }

    /// Mints a new sid (data carried over), deletes the old backend record,
    /// and marks dirty. Used defensively on privilege changes to prevent
    /// session fixation.
    pub async fn regenerate_id(&self, expire_ts: Option<i64>) {
        self.ensure_loaded().await;

        let old_sid = {
            let inner = self.inner.lock();
            inner.sid.clone()
        };
        let Some(old_sid) = old_sid else { return };

        let expire_ts = expire_ts.unwrap_or(old_sid.expiration());
        let secure_only = old_sid.is_secure();

        {
            let mut inner = self.inner.lock();
            inner.sid = Some(SessionId::make(expire_ts, secure_only));
            inner.dirty = Dirty::Dirty;
        }

        storage_tier::delete(&self.cache, self.datastore.as_ref(), old_sid.as_str()).await;
    }

    /// Persists the session if dirty. No-op if the session is inactive or
    /// clean (spec §4.5, and the idempotence property of spec §8: two
    /// consecutive flushes with no intervening mutation produce no
    /// additional backend writes since the second is a no-op here).
    pub async fn flush(&self, persist_anyway: bool) {
        let (sid, data, dirty) = {
            let inner = self.inner.lock();
            if inner.dirty == Dirty::Clean {
                return;
            }
            let Some(sid) = inner.sid.clone() else { return };
            let Some(data) = inner.data.clone() else { return };
            (sid, data, inner.dirty)
        };

        let payload = codec::encode(&data);
        let use_cookie = storage_tier::fits_in_cookie(payload.len(), self.config.cookie_only_threshold)
            && !(persist_anyway || self.config.persist_even_if_using_cookie);

        if use_cookie {
            let mut inner = self.inner.lock();
            inner.cookie_pending = CookiePending::Set(payload);
            inner.dirty = Dirty::Clean;
            return;
        }

        let write_datastore =
            storage_tier::should_write_datastore(self.config.no_datastore, dirty == Dirty::MemoryOnly);
        storage_tier::store(
            &self.cache,
            self.datastore.as_ref(),
            sid.as_str(),
            &payload,
            sid.expiration(),
            write_datastore,
        )
        .await;

        let mut inner = self.inner.lock();
        inner.cookie_pending = CookiePending::Set(Vec::new());
        inner.dirty = Dirty::Clean;
    }

    /// Produces this response's `Set-Cookie` lines.
    pub fn emit_cookie_headers(&self) -> Vec<String> {
        let inner = self.inner.lock();

        match &inner.cookie_pending {
            CookiePending::None => Vec::new(),
            CookiePending::Expire => inner
                .cookie_keys
                .iter()
                .map(|name| expiring_line(name, &self.config))
                .collect(),
            CookiePending::Set(payload) => {
                let Some(sid) = &inner.sid else { return Vec::new() };
                let sig = signer::sign(self.config.base_key().as_bytes(), sid.as_str(), payload);
                let payload_b64 = BASE64.encode(payload);
                let signed_value = format!("{sig}{sid}{payload_b64}");

                let max_len = fragments::max_data_per_cookie(
                    self.config.cookie_name.len() + 2,
                    self.config.secure,
                );
                let frags = fragments::fragment(&self.config.cookie_name, &signed_value, max_len);

                let used: HashSet<&str> = frags.iter().map(|(name, _)| name.as_str()).collect();
                let mut lines: Vec<String> = frags
                    .iter()
                    .map(|(name, value)| active_line(name, value, sid.expiration(), &self.config))
                    .collect();

                for name in &inner.cookie_keys {
                    if !used.contains(name.as_str()) {
                        lines.push(expiring_line(name, &self.config));
                    }
                }

                lines
            }
        }
    }
}

impl fmt::Debug for Session {
    /// Recovers `original_source/gaesessions`'s `Session.__str__`: `"SID=<sid>
    /// <data>"` when active, `"uninitialized session"` otherwise. A
    /// debugging aid only; it changes no invariant (spec §4.5 note via
    /// SPEC_FULL §4.5).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        match &inner.sid {
            Some(sid) => write!(f, "SID={} {:?}", sid.as_str(), inner.data),
            None => f.write_str("uninitialized session"),
        }
    }
}

fn active_line(name: &str, value: &str, expiration: i64, config: &Config) -> String {
    let expires = OffsetDateTime::from_unix_timestamp(expiration)
        .map(cookie::Expiration::DateTime)
        .unwrap_or(cookie::Expiration::Session);

    let mut built = cookie::Cookie::build((name.to_owned(), value.to_owned()))
        .http_only(config.http_only)
        .same_site(config.same_site)
        .secure(config.secure)
        .expires(expires);

    if let Some(domain) = &config.domain {
        built = built.domain(domain.to_string());
    }
    if let Some(path) = &config.path {
        built = built.path(path.to_string());
    }

    built.build().encoded().to_string()
}

fn expiring_line(name: &str, config: &Config) -> String {
    let mut removal = cookie::Cookie::new(name.to_owned(), "");
    if let Some(path) = &config.path {
        removal.set_path(path.to_string());
    } else {
        removal.set_path("/");
    }
    removal.make_removal();
    removal.encoded().to_string()
}

fn fragments_from_headers(headers: &HeaderMap, prefix: &str) -> Vec<(String, String)> {
    let mut found: Vec<(String, String)> = headers
        .get_all(http::header::COOKIE)
        .into_iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|raw| cookie::Cookie::parse_encoded(raw.trim().to_owned()).ok())
        .filter(|c| fragments::is_fragment_name(prefix, c.name()))
        .map(|c| (c.name().to_owned(), c.value().to_owned()))
        .collect();

    found.sort_by(|a, b| a.0.cmp(&b.0));
    found
}

fn parse_signed_cookie(
    frags: &[(String, String)],
    config: &Config,
) -> Option<(SessionId, PayloadSource)> {
    if frags.is_empty() {
        return None;
    }

    let (sig, sid_str, payload_b64) = fragments::reassemble(frags)?;
    let sid = SessionId::parse(&sid_str)?;

    let payload = if payload_b64.is_empty() {
        Vec::new()
    } else {
        BASE64.decode(payload_b64).ok()?
    };

    if !signer::verify(config.base_key().as_bytes(), sid.as_str(), &payload, &sig) {
        return None;
    }

    let source = if payload.is_empty() {
        PayloadSource::Backend
    } else {
        PayloadSource::Cookie(payload)
    };

    Some((sid, source))
}

impl Error for KeyMissing {}

#[cfg(feature = "axum")]
#[async_trait]
impl<S> axum::extract::FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = MissingSessionLayer;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Session::extract(&parts.extensions).ok_or(MissingSessionLayer)
    }
}

define_rejection! {
    #[status = INTERNAL_SERVER_ERROR]
    #[body = "missing session extension: is `SessionLayer` applied?"]
    /// Rejection used when extracting a [`Session`] without having applied
    /// [`crate::middleware::SessionLayer`] to the service.
    pub struct MissingSessionLayer;
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use http::{HeaderMap, HeaderValue};

    use crate::store::{MemoryCache, MemoryDatastore};

    use super::*;

    fn config() -> Arc<Config> {
        Arc::new(Config::new(crate::config::Key::try_from(vec![7u8; 32]).unwrap()))
    }

    fn fresh_session(config: Arc<Config>) -> Session {
        Session::from_headers(
            &HeaderMap::new(),
            Arc::new(MemoryCache::new()),
            Some(Arc::new(MemoryDatastore::new())),
            config,
        )
    }

    #[tokio::test]
    async fn fresh_session_is_inactive_until_first_write() {
        let session = fresh_session(config());
        assert!(!session.is_active());

        session.set_item("x", 7).await;
        assert!(session.is_active());
        assert_eq!(session.get("x").await, Some(Value::from(7)));
    }

    #[tokio::test]
    async fn flush_under_threshold_stays_cookie_only() {
        let cache = Arc::new(MemoryCache::new());
        let datastore = Arc::new(MemoryDatastore::new());
        let session = Session::from_headers(
            &HeaderMap::new(),
            cache.clone(),
            Some(datastore.clone()),
            config(),
        );

        session.set_item("x", 7).await;
        session.flush(false).await;

        assert!(datastore.is_empty());
        let headers = session.emit_cookie_headers();
        assert_eq!(headers.len(), 1);
    }

    #[tokio::test]
    async fn flush_above_threshold_forces_backend() {
        let cache = Arc::new(MemoryCache::new());
        let datastore = Arc::new(MemoryDatastore::new());
        let cfg = Config::new(crate::config::Key::try_from(vec![7u8; 32]).unwrap())
            .cookie_only_threshold(16);
        let session = Session::from_headers(
            &HeaderMap::new(),
            cache.clone(),
            Some(datastore.clone()),
            Arc::new(cfg),
        );

        session.set_item("blob", "x".repeat(2000)).await;
        session.flush(false).await;

        assert!(!datastore.is_empty());
    }

    #[tokio::test]
    async fn set_quick_on_a_fresh_session_stays_cache_only() {
        let cache = Arc::new(MemoryCache::new());
        let datastore = Arc::new(MemoryDatastore::new());
        let cfg = Config::new(crate::config::Key::try_from(vec![7u8; 32]).unwrap())
            .cookie_only_threshold(16);
        let session = Session::from_headers(
            &HeaderMap::new(),
            cache.clone(),
            Some(datastore.clone()),
            Arc::new(cfg),
        );

        // `set_quick` implicitly starts the session (it has no sid yet),
        // but must still land as `MemoryOnly`, not full `Dirty`: a
        // datastore write here would violate spec §8's "datastore write
        // occurs iff ... dirty != dirty-memonly".
        session.set_quick("blob", "x".repeat(2000)).await;
        session.flush(false).await;

        assert!(datastore.is_empty());
        assert_eq!(session.get("blob").await, Some(Value::from("x".repeat(2000))));
    }

    #[tokio::test]
    async fn round_trip_through_reissued_cookie() {
        let cfg = config();
        let cache = Arc::new(MemoryCache::new());
        let datastore = Arc::new(MemoryDatastore::new());

        let session = Session::from_headers(
            &HeaderMap::new(),
            cache.clone(),
            Some(datastore.clone()),
            cfg.clone(),
        );
        session.set_item("x", 7).await;
        session.flush(false).await;
        let lines = session.emit_cookie_headers();
        assert_eq!(lines.len(), 1);

        let mut headers = HeaderMap::new();
        let cookie_pair = lines[0].split(';').next().unwrap();
        headers.insert(
            http::header::COOKIE,
            HeaderValue::from_str(cookie_pair).unwrap(),
        );

        let session2 = Session::from_headers(&headers, cache, Some(datastore), cfg);
        assert_eq!(session2.get("x").await, Some(Value::from(7)));
    }

    #[tokio::test]
    async fn tampered_cookie_is_rejected() {
        let cfg = config();
        let session = fresh_session(cfg.clone());
        session.set_item("x", 7).await;
        session.flush(false).await;
        let line = session.emit_cookie_headers().remove(0);
        let cookie_pair = line.split(';').next().unwrap();

        let mut tampered: Vec<u8> = cookie_pair.as_bytes().to_vec();
        let flip_at = tampered.len() - 1;
        tampered[flip_at] ^= 0x01;

        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::COOKIE,
            HeaderValue::from_bytes(&tampered).unwrap(),
        );

        let session2 = Session::from_headers(
            &headers,
            Arc::new(MemoryCache::new()),
            Some(Arc::new(MemoryDatastore::new())),
            cfg,
        );
        assert!(!session2.is_active());
        assert!(session2.get_item("x").await.is_err());
    }

    #[tokio::test]
    async fn regenerate_id_preserves_data_changes_sid() {
        let cfg = config();
        let cache = Arc::new(MemoryCache::new());
        let datastore = Arc::new(MemoryDatastore::new());
        let session = Session::from_headers(&HeaderMap::new(), cache, Some(datastore), cfg);

        session.set_item("x", 7).await;
        session.flush(false).await;
        let sid0 = session.inner.lock().sid.clone().unwrap();

        session.regenerate_id(None).await;
        session.flush(false).await;

        let sid1 = session.inner.lock().sid.clone().unwrap();
        assert_ne!(sid0.as_str(), sid1.as_str());
        assert_eq!(sid0.expiration(), sid1.expiration());
        assert_eq!(session.get("x").await, Some(Value::from(7)));
    }
}
