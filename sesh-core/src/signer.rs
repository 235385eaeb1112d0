//! HMAC-SHA256 signing and verification of `(sid, payload)` pairs.

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

const BASE64_ENGINE: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// Length of a signature returned by [`sign`], in bytes, once Base64-encoded.
pub const SIGNATURE_LEN: usize = 44;

/// Minimum accepted length, in bytes, of a signing key.
pub const MIN_KEY_LEN: usize = 32;

/// Computes the HMAC-SHA256 of `payload`, keyed with `base_key || sid`, and
/// returns it as a standard (not URL-safe) Base64 string.
///
/// Keying with `base_key || sid` means any change of `sid` rotates the
/// effective key, so a leaked MAC for one session id is useless for
/// verifying a different one.
///
/// # Panics
///
/// Panics if `base_key` is shorter than [`MIN_KEY_LEN`]. Callers are
/// expected to validate the key length once, at configuration time (see
/// `sesh::config::Config`), not on every signing call.
pub fn sign(base_key: &[u8], sid: &str, payload: &[u8]) -> String {
    assert!(
        base_key.len() >= MIN_KEY_LEN,
        "signing key must be at least {MIN_KEY_LEN} bytes"
    );

    let mut mac = new_mac(base_key, sid);
    mac.update(payload);
    BASE64_ENGINE.encode(mac.finalize().into_bytes())
}

/// Verifies that `sig` is the correct Base64-encoded HMAC-SHA256 of `payload`
/// keyed with `base_key || sid`.
///
/// Comparison is constant-time: [`Mac::verify_slice`] never short-circuits on
/// the first differing byte, so this is not vulnerable to a timing attack
/// that could otherwise leak the expected signature one byte at a time.
pub fn verify(base_key: &[u8], sid: &str, payload: &[u8], sig: &str) -> bool {
    if base_key.len() < MIN_KEY_LEN {
        return false;
    }

    let Ok(sig_bytes) = BASE64_ENGINE.decode(sig) else {
        return false;
    };

    let mut mac = new_mac(base_key, sid);
    mac.update(payload);
    mac.verify_slice(&sig_bytes).is_ok()
}

fn new_mac(base_key: &[u8], sid: &str) -> Hmac<Sha256> {
    let mut key = Vec::with_capacity(base_key.len() + sid.len());
    key.extend_from_slice(base_key);
    key.extend_from_slice(sid.as_bytes());
    Hmac::<Sha256>::new_from_slice(&key).expect("HMAC accepts a key of any length")
}

#[cfg(test)]
mod test {
    use quickcheck::quickcheck;

    use super::*;

    #[test]
    fn signature_has_expected_length() {
        let sig = sign(&[0u8; 32], "sid", b"payload");
        assert_eq!(sig.len(), SIGNATURE_LEN);
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let key = [1u8; 32];
        let sig = sign(&key, "sid", b"payload");
        assert!(!verify(&key, "sid", b"payloaD", &sig));
    }

    #[test]
    fn short_key_never_verifies() {
        assert!(!verify(&[0u8; 16], "sid", b"payload", "not-even-checked"));
    }

    quickcheck! {
        fn verify_accepts_its_own_signature(key: Vec<u8>, sid: String, payload: Vec<u8>) -> bool {
            let mut key = key;
            key.resize(MIN_KEY_LEN.max(key.len()), 0);
            let sig = sign(&key, &sid, &payload);
            verify(&key, &sid, &payload, &sig)
        }

        fn signature_does_not_verify_under_different_sid(
            key: Vec<u8>,
            sid: String,
            other_sid: String,
            payload: Vec<u8>
        ) -> bool {
            if sid == other_sid {
                return true;
            }
            let mut key = key;
            key.resize(MIN_KEY_LEN.max(key.len()), 0);
            let sig = sign(&key, &sid, &payload);
            !verify(&key, &other_sid, &payload, &sig)
        }
    }
}
