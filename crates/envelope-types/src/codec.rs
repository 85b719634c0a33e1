//! Canonical binary codec.
//!
//! Values are encoded with `bincode` using fixed-width little-endian
//! integers, `u64` length prefixes for sequences, and `u32` variant indices
//! for enums. For the closed set of types in this crate the encoding is a
//! pure function of the logical value, so two equal values always produce
//! identical bytes.
//!
//! Decoding is strict: input must be consumed exactly, so every accepted byte
//! string re-encodes to itself.

use bincode::Options;
use serde::de::{DeserializeOwned, DeserializeSeed};
use serde::Serialize;

use crate::error::{TypeError, TypeResult};

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Encode a value into its canonical byte form.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> TypeResult<Vec<u8>> {
    options()
        .serialize(value)
        .map_err(|e| TypeError::Encoding(e.to_string()))
}

/// Decode a value from its canonical byte form. Trailing bytes are an error.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> TypeResult<T> {
    options()
        .deserialize(bytes)
        .map_err(|e| TypeError::Decoding(e.to_string()))
}

/// Decode through a stateful seed, such as one that bounds nesting depth.
pub fn decode_seed<'de, S: DeserializeSeed<'de>>(seed: S, bytes: &'de [u8]) -> TypeResult<S::Value> {
    options()
        .deserialize_seed(seed, bytes)
        .map_err(|e| TypeError::Decoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn equal_values_encode_identically() {
        let a = encode(&Value::from("Alice")).unwrap();
        let b = encode(&Value::Text("Alice".to_string())).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn decode_recovers_value() {
        let value = Value::Array(vec![Value::from(1), Value::from("two"), Value::Null]);
        let bytes = encode(&value).unwrap();
        let decoded: Value = decode(&bytes).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn decode_rejects_truncated_input() {
        let bytes = encode(&Value::from("a fairly long string")).unwrap();
        let err = decode::<Value>(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, TypeError::Decoding(_)));
    }

    #[test]
    fn decode_rejects_unknown_variant() {
        let err = decode::<Value>(&[0xff, 0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err, TypeError::Decoding(_)));
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let mut bytes = encode(&Value::from("Alice")).unwrap();
        bytes.extend_from_slice(b"GARBAGE");
        let err = decode::<Value>(&bytes).unwrap_err();
        assert!(matches!(err, TypeError::Decoding(_)));
    }

    #[test]
    fn encoding_matches_plain_bincode() {
        let value = Value::Array(vec![Value::from(-3), Value::from("x"), Value::from(true)]);
        assert_eq!(encode(&value).unwrap(), bincode::serialize(&value).unwrap());
    }
}
