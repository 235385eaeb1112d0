//! `SessionId` and related items.
//!
//! A session id ("sid") is a fixed 43-byte string: 10 zero-padded decimal
//! digits of Unix-seconds expiration, a one-byte separator (`S` if the
//! session is secure-only, `_` otherwise), and 32 lowercase hex characters
//! of random data (128 bits of entropy). Encoding expiration into the id
//! itself is what lets an ordered datastore delete expired sessions with a
//! plain key range scan (see [`crate::store`]).

use std::{error::Error as StdError, fmt};

use rand::RngCore;

const EXPIRATION_LEN: usize = 10;
const SEPARATOR_LEN: usize = 1;
const TOKEN_LEN: usize = 32;

/// Total encoded length of a [`SessionId`].
pub const SESSION_ID_LEN: usize = EXPIRATION_LEN + SEPARATOR_LEN + TOKEN_LEN;

const SECURE_SEPARATOR: u8 = b'S';
const PLAIN_SEPARATOR: u8 = b'_';

/// A 43-character session identifier encoding an expiration timestamp and a
/// secure-only marker alongside 128 bits of random entropy.
///
/// Debug implementation does not leak the random token.
#[derive(Clone, Hash, PartialEq, Eq)]
pub struct SessionId(String);

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({}...)", &self.0[..EXPIRATION_LEN + SEPARATOR_LEN])
    }
}

impl SessionId {
    /// Builds a new session id with the given expiration timestamp (Unix
    /// seconds) and secure-only flag, filling the random token with
    /// cryptographically secure randomness.
    pub fn make(expire_ts: i64, secure_only: bool) -> SessionId {
        let mut rng = rand::thread_rng();
        let mut token_bytes = [0u8; 16];
        rng.fill_bytes(&mut token_bytes);
        SessionId::from_parts(expire_ts, secure_only, &token_bytes)
    }

    fn from_parts(expire_ts: i64, secure_only: bool, token_bytes: &[u8; 16]) -> SessionId {
        let expire_ts = expire_ts.max(0) as u64;
        let mut s = String::with_capacity(SESSION_ID_LEN);
        s.push_str(&format!("{expire_ts:0width$}", width = EXPIRATION_LEN));
        s.push(if secure_only {
            SECURE_SEPARATOR as char
        } else {
            PLAIN_SEPARATOR as char
        });
        for byte in token_bytes {
            s.push_str(&format!("{byte:02x}"));
        }
        debug_assert_eq!(s.len(), SESSION_ID_LEN);
        SessionId(s)
    }

    /// Parses a session id from its 43-character string form. Returns `None`
    /// if `s` is not a validly shaped session id (wrong length, non-digit
    /// expiration, unrecognized separator, or non-hex token). Parsing never
    /// panics: malformed cookie-carried sids must fail softly.
    pub fn parse(s: &str) -> Option<SessionId> {
        if s.len() != SESSION_ID_LEN || !s.is_ascii() {
            return None;
        }
        let bytes = s.as_bytes();
        if !bytes[..EXPIRATION_LEN].iter().all(u8::is_ascii_digit) {
            return None;
        }
        let sep = bytes[EXPIRATION_LEN];
        if sep != SECURE_SEPARATOR && sep != PLAIN_SEPARATOR {
            return None;
        }
        let token = &s[EXPIRATION_LEN + SEPARATOR_LEN..];
        if !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Some(SessionId(s.to_owned()))
    }

    /// The encoded expiration timestamp (Unix seconds). `0` means "no
    /// expiration known", which can only happen if this id was constructed
    /// by [`SessionId::parse`] from a malformed string bypassing the normal
    /// digit check (it cannot happen in practice, since `parse` rejects
    /// non-digit expirations), or defensively, for forward compatibility.
    pub fn expiration(&self) -> i64 {
        self.0[..EXPIRATION_LEN].parse().unwrap_or(0)
    }

    /// Whether this id was minted for a secure-only (HTTPS-only) session.
    pub fn is_secure(&self) -> bool {
        self.0.as_bytes()[EXPIRATION_LEN] == SECURE_SEPARATOR
    }

    /// The full 43-character string form of this id, as stored in the
    /// signed cookie value and used as the cache/datastore key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The error type returned when parsing a session id string fails.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct ParseSessionIdError;

impl StdError for ParseSessionIdError {}

impl fmt::Display for ParseSessionIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("malformed session id")
    }
}

impl std::str::FromStr for SessionId {
    type Err = ParseSessionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SessionId::parse(s).ok_or(ParseSessionIdError)
    }
}

#[cfg(test)]
mod test {
    use quickcheck::quickcheck;

    use super::*;

    #[test]
    fn debug_redacts_token() {
        let sid = SessionId::make(1_700_000_000, true);
        let debug = format!("{sid:?}");
        assert!(debug.starts_with("SessionId(1700000000S"));
        assert!(!debug.contains(&sid.as_str()[11..]));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(SessionId::parse("too_short").is_none());
    }

    #[test]
    fn rejects_bad_separator() {
        let mut s = SessionId::make(1_700_000_000, false).as_str().to_owned();
        s.replace_range(10..11, "x");
        assert!(SessionId::parse(&s).is_none());
    }

    #[test]
    fn rejects_non_hex_token() {
        let mut s = SessionId::make(1_700_000_000, false).as_str().to_owned();
        s.replace_range(11..12, "z");
        assert!(SessionId::parse(&s).is_none());
    }

    quickcheck! {
        fn expiration_and_secure_round_trip(expire_ts: u32, secure: bool) -> bool {
            let sid = SessionId::make(expire_ts as i64, secure);
            sid.expiration() == expire_ts as i64 && sid.is_secure() == secure
        }

        fn parse_is_inverse_of_display(expire_ts: u32, secure: bool) -> bool {
            let sid = SessionId::make(expire_ts as i64, secure);
            let parsed = SessionId::parse(sid.as_str()).expect("round-trip parse");
            parsed == sid
        }

        fn parse_never_panics(s: String) -> bool {
            let _ = SessionId::parse(&s);
            true
        }
    }
}
