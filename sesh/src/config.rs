//! Middleware configuration.
//!
//! Mirrors the teacher's `SessionLayer` builder: a small set of `self ->
//! Self` setters over a `Config` held in an `Arc` so cloning a layer stays
//! cheap (see [`crate::middleware::SessionLayer`]).

use std::{borrow::Cow, error::Error, fmt, sync::Arc};

use sesh_core::{signer::MIN_KEY_LEN, time::SESSION_LIFETIME_SECONDS_DEFAULT};

/// A secret key used to sign session cookies.
///
/// Must be at least [`MIN_KEY_LEN`] (32) bytes. Construct with
/// [`Key::try_from`].
#[derive(Clone)]
pub struct Key(Vec<u8>);

impl Key {
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key(..)")
    }
}

impl TryFrom<&[u8]> for Key {
    type Error = ConfigError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        if value.len() < MIN_KEY_LEN {
            return Err(ConfigError::KeyTooShort { len: value.len() });
        }
        Ok(Key(value.to_vec()))
    }
}

impl TryFrom<Vec<u8>> for Key {
    type Error = ConfigError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Key::try_from(value.as_slice())
    }
}

/// The error returned when constructing a [`Key`] or [`Config`] fails.
///
/// Per spec §7, this is the only error kind that escapes the core —
/// everything else is recovered locally and logged.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("base_key must be at least {} bytes, got {len}", MIN_KEY_LEN)]
    KeyTooShort { len: usize },
}

impl Error for ConfigError {}

/// The [`SameSite`] cookie attribute.
///
/// [`SameSite`]: https://developer.mozilla.org/en-US/docs/Web/HTTP/Headers/Set-Cookie#samesitesamesite-value
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub(crate) fn into_cookie_same_site(self) -> cookie::SameSite {
        match self {
            SameSite::Strict => cookie::SameSite::Strict,
            SameSite::Lax => cookie::SameSite::Lax,
            SameSite::None => cookie::SameSite::None,
        }
    }
}

/// Snapshot of middleware configuration, cloned into each request's
/// [`crate::session::Session`].
#[derive(Clone)]
pub struct Config {
    pub(crate) base_key: Key,
    pub(crate) cookie_name: Cow<'static, str>,
    pub(crate) domain: Option<Cow<'static, str>>,
    pub(crate) http_only: bool,
    pub(crate) path: Option<Cow<'static, str>>,
    pub(crate) same_site: cookie::SameSite,
    pub(crate) secure: bool,
    pub(crate) lifetime_seconds: i64,
    pub(crate) no_datastore: bool,
    pub(crate) cookie_only_threshold: i64,
    pub(crate) persist_even_if_using_cookie: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("cookie_name", &self.cookie_name)
            .field("domain", &self.domain)
            .field("http_only", &self.http_only)
            .field("path", &self.path)
            .field("same_site", &self.same_site)
            .field("secure", &self.secure)
            .field("lifetime_seconds", &self.lifetime_seconds)
            .field("no_datastore", &self.no_datastore)
            .field("cookie_only_threshold", &self.cookie_only_threshold)
            .field(
                "persist_even_if_using_cookie",
                &self.persist_even_if_using_cookie,
            )
            .finish_non_exhaustive()
    }
}

/// Default cookie-only threshold in bytes (spec §6).
pub const COOKIE_ONLY_THRESHOLD_DEFAULT: i64 = 10_240;

impl Config {
    /// Creates a configuration with default values and the given signing
    /// key. See spec §6 for defaults.
    pub fn new(base_key: Key) -> Config {
        Config {
            base_key,
            cookie_name: Cow::Borrowed(crate::cookie::DEFAULT_COOKIE_NAME),
            domain: None,
            http_only: true,
            path: Some(Cow::Borrowed("/")),
            same_site: cookie::SameSite::Strict,
            secure: true,
            lifetime_seconds: SESSION_LIFETIME_SECONDS_DEFAULT,
            no_datastore: false,
            cookie_only_threshold: COOKIE_ONLY_THRESHOLD_DEFAULT,
            persist_even_if_using_cookie: false,
        }
    }

    /// Sets the name prefix for session cookie fragments. Default is
    /// [`crate::cookie::DEFAULT_COOKIE_NAME`].
    pub fn cookie_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Sets the `Domain` attribute in the `Set-Cookie` response header.
    pub fn domain(mut self, domain: impl Into<Cow<'static, str>>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets whether to add the `HttpOnly` attribute. Default is `true`.
    pub fn http_only(mut self, enable: bool) -> Self {
        self.http_only = enable;
        self
    }

    /// Sets the `Path` attribute. Default is `/`.
    pub fn path(mut self, path: impl Into<Cow<'static, str>>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the `SameSite` attribute. Default is [`SameSite::Strict`].
    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site.into_cookie_same_site();
        self
    }

    /// Sets whether to add the `Secure` attribute. Default is `true`.
    pub fn secure(mut self, enable: bool) -> Self {
        self.secure = enable;
        self
    }

    /// Sets the session lifetime, in seconds, used when no explicit
    /// expiration is given to `start`/`regenerate_id`. Default is 7 days.
    pub fn lifetime_seconds(mut self, seconds: i64) -> Self {
        self.lifetime_seconds = seconds;
        self
    }

    /// Disables the datastore tier entirely: sessions above the cookie-only
    /// threshold are written only to the cache. Default is `false`.
    pub fn no_datastore(mut self, enable: bool) -> Self {
        self.no_datastore = enable;
        self
    }

    /// Sets the cookie-only threshold in bytes. Sessions whose encoded
    /// payload times 4/3 (the base64 expansion factor) is at or below this
    /// value are carried entirely in the cookie. Default is 10,240.
    ///
    /// A negative value means "always tiered" (never cookie-only).
    pub fn cookie_only_threshold(mut self, bytes: i64) -> Self {
        self.cookie_only_threshold = bytes;
        self
    }

    /// When `true`, sessions that fit within the cookie-only threshold are
    /// still written to cache/datastore. Default is `false`.
    pub fn persist_even_if_using_cookie(mut self, enable: bool) -> Self {
        self.persist_even_if_using_cookie = enable;
        self
    }

    pub(crate) fn base_key(&self) -> &Key {
        &self.base_key
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn key_rejects_short_input() {
        let err = Key::try_from(vec![0u8; 31]).unwrap_err();
        assert!(matches!(err, ConfigError::KeyTooShort { len: 31 }));
    }

    #[test]
    fn key_accepts_minimum_length() {
        assert!(Key::try_from(vec![0u8; MIN_KEY_LEN]).is_ok());
    }

    #[test]
    fn key_debug_redacts_content() {
        let key = Key::try_from(vec![1u8; 32]).unwrap();
        assert_eq!(format!("{key:?}"), "Key(..)");
    }

    #[test]
    fn negative_threshold_means_always_tiered() {
        let key = Key::try_from(vec![0u8; 32]).unwrap();
        let config = Config::new(key).cookie_only_threshold(-1);
        assert!(config.cookie_only_threshold < 0);
    }
}
