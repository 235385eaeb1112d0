//! Deterministic encode/decode of a session's key→value mapping into an
//! opaque byte payload.
//!
//! The payload is framed as:
//!
//! ```text
//! [version: u8][light_len: u32 LE][light_bytes][heavy_count: u32 LE]
//! ([key_len: u32 LE][key_bytes][value_len: u32 LE][value_bytes])*
//! ```
//!
//! `light_bytes` is every non-[`Value::Heavy`] entry, serialized as a single
//! [`Map`] through `rmp-serde`. Each heavy entry is framed independently as a
//! raw byte string, so no deserializer runs over opaque heavy bytes until a
//! caller asks for them by type through [`Value::as_heavy`].
//!
//! Splitting heavy from light keeps the common case (no heavy values) a
//! single MessagePack buffer, and keeps heavy entries exempt from the
//! BTreeMap/rmp-serde round trip entirely, since their encoding is opaque to
//! this module.

use crate::value::{Map, Value};

const FORMAT_VERSION: u8 = 1;

/// Encodes a session's data into an opaque payload.
///
/// This is deterministic: encoding the same [`Map`] twice, regardless of the
/// order its entries were inserted in, produces identical bytes (the light
/// group is backed by a `BTreeMap`, so key order is canonical).
pub fn encode(data: &Map<String, Value>) -> Vec<u8> {
    let mut light = Map::new();
    let mut heavy: Vec<(&str, &[u8])> = Vec::new();

    for (key, value) in data {
        if let Value::Heavy(bytes) = value {
            heavy.push((key, bytes));
        } else {
            light.insert(key.clone(), value.clone());
        }
    }

    let light_bytes = rmp_serde::to_vec(&light).expect("Map<String, Value> is always encodable");

    let mut out = Vec::with_capacity(1 + 4 + light_bytes.len() + 4);
    out.push(FORMAT_VERSION);
    out.extend_from_slice(&(light_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(&light_bytes);
    out.extend_from_slice(&(heavy.len() as u32).to_le_bytes());
    for (key, bytes) in heavy {
        out.extend_from_slice(&(key.len() as u32).to_le_bytes());
        out.extend_from_slice(key.as_bytes());
        out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(bytes);
    }

    out
}

/// Decodes a payload produced by [`encode`].
///
/// Per spec §4.1(c), malformed input never panics — it returns
/// [`DecodeError`] and the caller (normally [`crate::session::Session`])
/// treats that as "start fresh" rather than propagating the error.
pub fn decode(bytes: &[u8]) -> Result<Map<String, Value>, DecodeError> {
    let mut cursor = Cursor(bytes);

    let version = cursor.u8()?;
    if version != FORMAT_VERSION {
        return Err(DecodeError::new("unsupported payload version"));
    }

    let light_len = cursor.u32()? as usize;
    let light_bytes = cursor.take(light_len)?;
    let mut data: Map<String, Value> =
        rmp_serde::from_slice(light_bytes).map_err(|_| DecodeError::new("malformed light group"))?;

    let heavy_count = cursor.u32()?;
    for _ in 0..heavy_count {
        let key_len = cursor.u32()? as usize;
        let key_bytes = cursor.take(key_len)?;
        let key =
            std::str::from_utf8(key_bytes).map_err(|_| DecodeError::new("heavy key not utf-8"))?;

        let value_len = cursor.u32()? as usize;
        let value_bytes = cursor.take(value_len)?;

        data.insert(key.to_owned(), Value::Heavy(value_bytes.to_vec()));
    }

    Ok(data)
}

struct Cursor<'a>(&'a [u8]);

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if len > self.0.len() {
            return Err(DecodeError::new("payload truncated"));
        }
        let (head, tail) = self.0.split_at(len);
        self.0 = tail;
        Ok(head)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
    }
}

/// The error returned by [`decode`] on malformed input.
///
/// Per spec §4.1(c), decoding never panics; this type exists only to record
/// *that* decoding failed, not a discriminable reason — callers treat any
/// variant the same way (empty mapping, logged at `warn!`).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("corrupt session payload: {0}")]
    Malformed(&'static str),
}

impl DecodeError {
    fn new(reason: &'static str) -> DecodeError {
        DecodeError::Malformed(reason)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_empty_map() {
        let data = Map::new();
        let bytes = encode(&data);
        assert_eq!(decode(&bytes).unwrap(), data);
    }

    #[test]
    fn round_trips_light_values() {
        let mut data = Map::new();
        data.insert("x".into(), Value::from(7));
        data.insert("name".into(), Value::from("alice"));

        let bytes = encode(&data);
        assert_eq!(decode(&bytes).unwrap(), data);
    }

    #[test]
    fn round_trips_heavy_values() {
        let mut data = Map::new();
        data.insert("light".into(), Value::from(1));
        data.insert("heavy".into(), Value::Heavy(vec![9, 9, 9]));

        let bytes = encode(&data);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.get("heavy"), Some(&Value::Heavy(vec![9, 9, 9])));
        assert_eq!(decoded.get("light"), Some(&Value::from(1)));
    }

    #[test]
    fn insertion_order_does_not_affect_encoding() {
        let mut a = Map::new();
        a.insert("x".into(), Value::from(1));
        a.insert("y".into(), Value::from(2));

        let mut b = Map::new();
        b.insert("y".into(), Value::from(2));
        b.insert("x".into(), Value::from(1));

        assert_eq!(encode(&a), encode(&b));
    }

    #[test]
    fn decode_never_panics_on_garbage() {
        for len in 0..64 {
            let garbage = vec![0xFFu8; len];
            let _ = decode(&garbage);
        }
        assert!(decode(b"").is_err());
        assert!(decode(&[FORMAT_VERSION]).is_err());
        assert!(decode(&[FORMAT_VERSION + 1, 0, 0, 0, 0]).is_err());
    }

    #[test]
    fn decode_rejects_truncated_light_group() {
        let mut bytes = vec![FORMAT_VERSION];
        bytes.extend_from_slice(&100u32.to_le_bytes());
        bytes.extend_from_slice(b"short");
        assert!(matches!(decode(&bytes), Err(DecodeError::Malformed(_))));
    }
}
