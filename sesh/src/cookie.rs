//! Cookie fragment packing/unpacking.
//!
//! The signed value carried by a session's cookies is `SIG || SID ||
//! B64(PAYLOAD)` (spec §3). When that value is longer than
//! [`MAX_DATA_PER_COOKIE`] it is split across multiple cookies named
//! `<PREFIX>00`, `<PREFIX>01`, … in lexicographic order; reassembly sorts
//! fragment names and concatenates their values.

use std::fmt::Write as _;

use sesh_core::{identifier::SESSION_ID_LEN, signer::SIGNATURE_LEN};

/// Default name prefix for session cookie fragments.
pub const DEFAULT_COOKIE_NAME: &str = "__sesh";

/// Header/attribute overhead budgeted out of the 4096-byte `Set-Cookie`
/// ceiling: cookie name, `Path=/`, `Expires=<RFC1123>`, `HttpOnly`, and
/// separators. Conservative, not exact — see spec §3.
const COOKIE_OVERHEAD: usize = 150;

/// 8 extra bytes of headroom reserved when the `Secure` attribute is set
/// (spec §3).
const SECURE_HEADROOM: usize = 8;

const SET_COOKIE_BUDGET: usize = 4096;

/// Computes the maximum number of signed-value bytes that fit in a single
/// cookie fragment, for a fragment name of `name_len` bytes.
pub fn max_data_per_cookie(name_len: usize, secure: bool) -> usize {
    let overhead = COOKIE_OVERHEAD + name_len + if secure { SECURE_HEADROOM } else { 0 };
    SET_COOKIE_BUDGET.saturating_sub(overhead)
}

/// Formats a fragment's cookie name: `<prefix><NN>` with `NN` a
/// two-digit, zero-padded, lexicographically ordered index.
pub fn fragment_name(prefix: &str, index: usize) -> String {
    let mut name = String::with_capacity(prefix.len() + 2);
    name.push_str(prefix);
    let _ = write!(name, "{index:02}");
    name
}

/// Returns true if `name` looks like one of `prefix`'s fragments (i.e.
/// `<prefix><digit><digit>`).
pub fn is_fragment_name(prefix: &str, name: &str) -> bool {
    match name.strip_prefix(prefix) {
        Some(rest) => rest.len() == 2 && rest.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Splits `signed_value` into fragments of at most `max_len` bytes each,
/// paired with their cookie names under `prefix`.
pub fn fragment(prefix: &str, signed_value: &str, max_len: usize) -> Vec<(String, String)> {
    if signed_value.is_empty() {
        return vec![(fragment_name(prefix, 0), String::new())];
    }

    let bytes = signed_value.as_bytes();
    let mut fragments = Vec::new();
    let mut index = 0;
    let mut offset = 0;
    while offset < bytes.len() {
        let end = (offset + max_len.max(1)).min(bytes.len());
        let chunk = std::str::from_utf8(&bytes[offset..end])
            .expect("signed_value is ASCII base64/hex content");
        fragments.push((fragment_name(prefix, index), chunk.to_owned()));
        offset = end;
        index += 1;
    }
    fragments
}

/// Reassembles fragment values (already sorted by name) back into the
/// signed value, and splits it into `(sig, sid, payload_b64)`.
pub fn reassemble(fragments: &[(String, String)]) -> Option<(String, String, String)> {
    let mut sorted = fragments.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut signed_value = String::new();
    for (_, value) in sorted {
        signed_value.push_str(&value);
    }

    split_signed_value(&signed_value)
}

/// Splits a reassembled signed value into `(sig, sid, payload_b64)`.
/// Returns `None` if it's shorter than the fixed `SIG || SID` prefix.
pub fn split_signed_value(signed_value: &str) -> Option<(String, String, String)> {
    const PREFIX_LEN: usize = SIGNATURE_LEN + SESSION_ID_LEN;
    if signed_value.len() < PREFIX_LEN {
        return None;
    }

    let (sig, rest) = signed_value.split_at(SIGNATURE_LEN);
    let (sid, payload_b64) = rest.split_at(SESSION_ID_LEN);
    Some((sig.to_owned(), sid.to_owned(), payload_b64.to_owned()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fragment_and_reassemble_round_trip() {
        let signed_value = "A".repeat(SIGNATURE_LEN)
            + &"1".repeat(SESSION_ID_LEN)
            + &"z".repeat(6000);

        let fragments = fragment("__sesh", &signed_value, 1000);
        assert!(fragments.len() > 1);

        let mut shuffled = fragments.clone();
        shuffled.reverse();

        let (sig, sid, payload) = reassemble(&shuffled).unwrap();
        let reassembled = sig.clone() + &sid + &payload;
        assert_eq!(reassembled, signed_value);
    }

    #[test]
    fn single_fragment_when_small() {
        let signed_value = "A".repeat(SIGNATURE_LEN) + &"1".repeat(SESSION_ID_LEN);
        let fragments = fragment("__sesh", &signed_value, 4096);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].0, "__sesh00");
    }

    #[test]
    fn is_fragment_name_matches_prefix_and_digits() {
        assert!(is_fragment_name("__sesh", "__sesh00"));
        assert!(is_fragment_name("__sesh", "__sesh42"));
        assert!(!is_fragment_name("__sesh", "__seshxx"));
        assert!(!is_fragment_name("__sesh", "other00"));
    }

    #[test]
    fn secure_reserves_extra_headroom() {
        assert_eq!(
            max_data_per_cookie(8, true),
            max_data_per_cookie(8, false) - SECURE_HEADROOM
        );
    }
}
