//! Canonical CBOR encoding and decoding.
//!
//! The wire form that feeds the refhash must be byte-identical no matter
//! which party produces it, so the encoder enforces deterministic rules:
//! - Map keys sorted by encoded length, then lexicographically by encoded bytes
//! - Definite-length items only
//! - No floating point, no CBOR tags
//! - UTF-8 text strings only

use ciborium::Value;

use crate::error::{Error, Result};

/// Encode a CBOR Value to canonical bytes.
///
/// Map keys (at every nesting level) are sorted into canonical order first;
/// floats and tags are rejected.
pub fn to_canonical_bytes(value: &Value) -> Result<Vec<u8>> {
    let canonical = canonicalize(value)?;
    let mut buf = Vec::new();
    ciborium::into_writer(&canonical, &mut buf).map_err(|e| Error::CborEncode(e.to_string()))?;
    Ok(buf)
}

/// Decode canonical CBOR bytes back into a Value.
pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Value> {
    ciborium::from_reader(bytes).map_err(|e| Error::CborDecode(e.to_string()))
}

fn canonicalize(value: &Value) -> Result<Value> {
    match value {
        Value::Integer(_) | Value::Bool(_) | Value::Null | Value::Bytes(_) | Value::Text(_) => {
            Ok(value.clone())
        }

        Value::Array(items) => {
            let items: Result<Vec<Value>> = items.iter().map(canonicalize).collect();
            Ok(Value::Array(items?))
        }

        Value::Map(entries) => {
            let mut sorted: Vec<(Vec<u8>, Value, Value)> = Vec::with_capacity(entries.len());
            for (k, v) in entries {
                let key = canonicalize(k)?;
                let val = canonicalize(v)?;
                sorted.push((sort_key(&key), key, val));
            }
            // Shorter encoded key first, then lexicographic by encoded bytes.
            sorted.sort_by(|(a, _, _), (b, _, _)| a.len().cmp(&b.len()).then(a.cmp(b)));
            Ok(Value::Map(sorted.into_iter().map(|(_, k, v)| (k, v)).collect()))
        }

        Value::Float(_) => Err(Error::CanonicalViolation(
            "floating point numbers are prohibited in wire encoding".into(),
        )),

        Value::Tag(_, _) => Err(Error::CanonicalViolation(
            "CBOR tags are prohibited in wire encoding".into(),
        )),

        _ => Err(Error::CanonicalViolation(format!(
            "unsupported CBOR type: {value:?}"
        ))),
    }
}

/// Encoded bytes of a key, used only for canonical ordering.
fn sort_key(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    // Cannot fail for values that already passed canonicalize.
    let _ = ciborium::into_writer(value, &mut buf);
    buf
}

/// Helper: build a CBOR map from text keys and values.
pub fn cbor_map(entries: Vec<(&str, Value)>) -> Value {
    Value::Map(
        entries
            .into_iter()
            .map(|(k, v)| (Value::Text(k.to_string()), v))
            .collect(),
    )
}

/// Helper: a u64 as a CBOR integer.
pub fn cbor_int(n: u64) -> Value {
    Value::Integer(n.into())
}

/// Helper: a byte slice as a CBOR bytes value.
pub fn cbor_bytes(b: &[u8]) -> Value {
    Value::Bytes(b.to_vec())
}

/// Helper: a string as a CBOR text value.
pub fn cbor_text(s: &str) -> Value {
    Value::Text(s.to_string())
}

/// Helper: an array of text values.
pub fn cbor_text_array(items: &[String]) -> Value {
    Value::Array(items.iter().map(|s| cbor_text(s)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_keys_sorted_canonically() {
        let map = cbor_map(vec![
            ("zz", cbor_int(1)),
            ("b", cbor_int(2)),
            ("a", cbor_int(3)),
        ]);
        let bytes = to_canonical_bytes(&map).unwrap();
        let decoded = from_canonical_bytes(&bytes).unwrap();

        let Value::Map(entries) = decoded else {
            panic!("expected map");
        };
        let keys: Vec<String> = entries
            .iter()
            .map(|(k, _)| match k {
                Value::Text(s) => s.clone(),
                other => panic!("expected text key, got {other:?}"),
            })
            .collect();
        // One-byte keys before two-byte keys, lexicographic within.
        assert_eq!(keys, vec!["a", "b", "zz"]);
    }

    #[test]
    fn encoding_is_stable() {
        let map = cbor_map(vec![
            ("body", cbor_text("hello")),
            ("tags", cbor_text_array(&["a".into(), "b".into()])),
        ]);
        let bytes1 = to_canonical_bytes(&map).unwrap();
        let bytes2 = to_canonical_bytes(&map).unwrap();
        assert_eq!(bytes1, bytes2);
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let forward = cbor_map(vec![("a", cbor_int(1)), ("b", cbor_int(2))]);
        let reversed = cbor_map(vec![("b", cbor_int(2)), ("a", cbor_int(1))]);
        assert_eq!(
            to_canonical_bytes(&forward).unwrap(),
            to_canonical_bytes(&reversed).unwrap()
        );
    }

    #[test]
    fn rejects_floats_and_tags() {
        assert!(to_canonical_bytes(&Value::Float(1.5)).is_err());
        let tagged = Value::Tag(0, Box::new(cbor_int(7)));
        assert!(to_canonical_bytes(&tagged).is_err());
    }
}
