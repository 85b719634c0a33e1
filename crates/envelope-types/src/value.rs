use std::fmt;

use serde::de::{self, DeserializeSeed, EnumAccess, SeqAccess, VariantAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{TypeError, TypeResult};

/// A leaf payload.
///
/// The set of variants is closed and every variant has exactly one canonical
/// encoding (see [`crate::codec`]). Floating point numbers are deliberately
/// absent: they have several encodings for the same logical value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
}

impl Value {
    /// Canonical encoding of this value, as consumed by the digest function.
    /// Byte-for-byte the same as [`crate::codec::encode`].
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_canonical(&mut out);
        out
    }

    /// `u32` variant index, then the payload with `u64` length prefixes.
    fn write_canonical(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.variant_index().to_le_bytes());
        match self {
            Self::Null => {}
            Self::Bool(b) => out.push(u8::from(*b)),
            Self::Int(n) => out.extend_from_slice(&n.to_le_bytes()),
            Self::Text(s) => write_prefixed(out, s.as_bytes()),
            Self::Bytes(b) => write_prefixed(out, b),
            Self::Array(items) => {
                out.extend_from_slice(&(items.len() as u64).to_le_bytes());
                for item in items {
                    item.write_canonical(out);
                }
            }
        }
    }

    fn variant_index(&self) -> u32 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) => 2,
            Self::Text(_) => 3,
            Self::Bytes(_) => 4,
            Self::Array(_) => 5,
        }
    }

    /// Short name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Array(_) => "array",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_text(&self) -> TypeResult<&str> {
        match self {
            Self::Text(s) => Ok(s),
            other => Err(other.wrong_type("text")),
        }
    }

    pub fn as_int(&self) -> TypeResult<i64> {
        match self {
            Self::Int(n) => Ok(*n),
            other => Err(other.wrong_type("int")),
        }
    }

    pub fn as_bool(&self) -> TypeResult<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            other => Err(other.wrong_type("bool")),
        }
    }

    pub fn as_byte_slice(&self) -> TypeResult<&[u8]> {
        match self {
            Self::Bytes(b) => Ok(b),
            other => Err(other.wrong_type("bytes")),
        }
    }

    pub fn as_array(&self) -> TypeResult<&[Value]> {
        match self {
            Self::Array(items) => Ok(items),
            other => Err(other.wrong_type("array")),
        }
    }

    fn wrong_type(&self, expected: &'static str) -> TypeError {
        TypeError::WrongValueType {
            expected,
            found: self.type_name(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => write!(f, "Bytes({})", b.len()),
            Self::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

fn write_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    out.extend_from_slice(bytes);
}

/// Deepest `Array` nesting accepted when decoding a value.
pub const MAX_VALUE_DEPTH: usize = 32;

const VARIANTS: &[&str] = &["Null", "Bool", "Int", "Text", "Bytes", "Array"];

#[derive(Deserialize)]
#[serde(variant_identifier)]
enum ValueTag {
    Null,
    Bool,
    Int,
    Text,
    Bytes,
    Array,
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ValueSeed {
            depth: MAX_VALUE_DEPTH,
        }
        .deserialize(deserializer)
    }
}

/// Decodes one value, allowing `depth` further levels of array nesting.
#[derive(Clone, Copy)]
struct ValueSeed {
    depth: usize,
}

impl<'de> DeserializeSeed<'de> for ValueSeed {
    type Value = Value;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_enum("Value", VARIANTS, self)
    }
}

impl<'de> Visitor<'de> for ValueSeed {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a leaf value")
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<Value, A::Error> {
        let (tag, variant) = data.variant::<ValueTag>()?;
        Ok(match tag {
            ValueTag::Null => {
                variant.unit_variant()?;
                Value::Null
            }
            ValueTag::Bool => Value::Bool(variant.newtype_variant()?),
            ValueTag::Int => Value::Int(variant.newtype_variant()?),
            ValueTag::Text => Value::Text(variant.newtype_variant()?),
            ValueTag::Bytes => Value::Bytes(variant.newtype_variant()?),
            ValueTag::Array => {
                let depth = self
                    .depth
                    .checked_sub(1)
                    .ok_or_else(|| <A::Error as de::Error>::custom("value nesting too deep"))?;
                Value::Array(variant.newtype_variant_seed(ArraySeed(ValueSeed { depth }))?)
            }
        })
    }
}

struct ArraySeed(ValueSeed);

impl<'de> DeserializeSeed<'de> for ArraySeed {
    type Value = Vec<Value>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Vec<Value>, D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for ArraySeed {
    type Value = Vec<Value>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an array of values")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<Value>, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(1024));
        while let Some(item) = seq.next_element_seed(self.0)? {
            items.push(item);
        }
        Ok(items)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<u8> for Value {
    fn from(n: u8) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accessors_match_variant() {
        assert_eq!(Value::from("Bob").as_text().unwrap(), "Bob");
        assert_eq!(Value::from(30).as_int().unwrap(), 30);
        assert!(Value::from(true).as_bool().unwrap());
        assert_eq!(Value::from(vec![1u8, 2]).as_byte_slice().unwrap(), &[1, 2]);
        assert!(Value::Null.is_null());
    }

    #[test]
    fn wrong_type_reports_both_sides() {
        let err = Value::from(7).as_text().unwrap_err();
        assert_eq!(
            err,
            TypeError::WrongValueType {
                expected: "text",
                found: "int"
            }
        );
    }

    #[test]
    fn display_quotes_text() {
        assert_eq!(Value::from("Alice").to_string(), "\"Alice\"");
        assert_eq!(Value::from(42).to_string(), "42");
        assert_eq!(Value::from(vec![0u8; 3]).to_string(), "Bytes(3)");
        assert_eq!(
            Value::Array(vec![Value::from(1), Value::Null]).to_string(),
            "[1, null]"
        );
    }

    #[test]
    fn integer_widths_share_encoding() {
        assert_eq!(
            Value::from(5u8).canonical_bytes(),
            Value::from(5i64).canonical_bytes()
        );
    }

    #[test]
    fn text_and_bytes_encode_differently() {
        assert_ne!(
            Value::from("ab").canonical_bytes(),
            Value::from(b"ab".to_vec()).canonical_bytes()
        );
    }

    proptest! {
        #[test]
        fn canonical_bytes_injective_on_text(a in ".*", b in ".*") {
            let ea = Value::from(a.as_str()).canonical_bytes();
            let eb = Value::from(b.as_str()).canonical_bytes();
            prop_assert_eq!(a == b, ea == eb);
        }
    }

    #[test]
    fn canonical_bytes_match_codec() {
        let values = [
            Value::Null,
            Value::from(false),
            Value::from(-7i64),
            Value::from("Alice"),
            Value::from(vec![9u8, 8, 7]),
            Value::Array(vec![Value::Array(vec![Value::from(1i64)]), Value::Null]),
        ];
        for value in values {
            assert_eq!(value.canonical_bytes(), crate::codec::encode(&value).unwrap());
        }
    }

    fn nested_array_bytes(levels: usize) -> Vec<u8> {
        let mut bytes = Vec::new();
        for _ in 0..levels {
            bytes.extend_from_slice(&5u32.to_le_bytes());
            bytes.extend_from_slice(&1u64.to_le_bytes());
        }
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes
    }

    #[test]
    fn nesting_within_limit_decodes() {
        let bytes = nested_array_bytes(MAX_VALUE_DEPTH);
        let value: Value = crate::codec::decode(&bytes).unwrap();
        assert_eq!(value.canonical_bytes(), bytes);
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let err = crate::codec::decode::<Value>(&nested_array_bytes(MAX_VALUE_DEPTH + 1)).unwrap_err();
        assert!(matches!(err, TypeError::Decoding(_)));
        let err = crate::codec::decode::<Value>(&nested_array_bytes(200_000)).unwrap_err();
        assert!(matches!(err, TypeError::Decoding(_)));
    }

    #[test]
    fn json_roundtrip_uses_variant_names() {
        let value = Value::Array(vec![Value::Null, Value::from("x"), Value::from(2i64)]);
        let json = serde_json::to_string(&value).unwrap();
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, value);
    }
}
