//! Binary wire form of whole envelopes.
//!
//! The tree is mirrored into a serde enum and encoded with the canonical
//! codec. Digests are not transmitted for visible nodes; they are recomputed
//! on decode. This byte form is the plaintext for encryption and the input
//! for compression.
//!
//! Decoding is bounded: nesting deeper than
//! [`EnvelopeConfig::max_depth`] and trailing bytes are both rejected as
//! malformed.

use std::fmt;

use serde::de::{self, DeserializeSeed, EnumAccess, SeqAccess, VariantAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use envelope_crypto::EncryptedMessage;
use envelope_types::{codec, Digest, KnownValue, Value};

use crate::config::EnvelopeConfig;
use crate::envelope::{Envelope, EnvelopeCase};
use crate::error::{EnvelopeError, EnvelopeResult};
use crate::extension::Compressed;

#[derive(Serialize)]
enum WireEnvelope {
    Node {
        subject: Box<WireEnvelope>,
        assertions: Vec<WireEnvelope>,
    },
    Leaf(Value),
    Wrapped(Box<WireEnvelope>),
    Assertion {
        predicate: Box<WireEnvelope>,
        object: Box<WireEnvelope>,
    },
    KnownValue(KnownValue),
    Elided(Digest),
    Encrypted(EncryptedMessage),
    Compressed(Compressed),
}

const VARIANTS: &[&str] = &[
    "Node",
    "Leaf",
    "Wrapped",
    "Assertion",
    "KnownValue",
    "Elided",
    "Encrypted",
    "Compressed",
];

#[derive(Deserialize)]
#[serde(variant_identifier)]
enum WireTag {
    Node,
    Leaf,
    Wrapped,
    Assertion,
    KnownValue,
    Elided,
    Encrypted,
    Compressed,
}

/// Decodes one wire node, allowing `depth` further levels below it.
#[derive(Clone, Copy)]
struct WireSeed {
    depth: usize,
}

impl WireSeed {
    fn child<E: de::Error>(self) -> Result<Self, E> {
        self.depth
            .checked_sub(1)
            .map(|depth| Self { depth })
            .ok_or_else(|| E::custom("envelope nesting too deep"))
    }
}

impl<'de> DeserializeSeed<'de> for WireSeed {
    type Value = WireEnvelope;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<WireEnvelope, D::Error> {
        deserializer.deserialize_enum("WireEnvelope", VARIANTS, self)
    }
}

impl<'de> Visitor<'de> for WireSeed {
    type Value = WireEnvelope;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an envelope")
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<WireEnvelope, A::Error> {
        let (tag, variant) = data.variant::<WireTag>()?;
        Ok(match tag {
            WireTag::Node => {
                let child = self.child::<A::Error>()?;
                let (subject, assertions) =
                    variant.struct_variant(&["subject", "assertions"], NodeVisitor(child))?;
                WireEnvelope::Node {
                    subject: Box::new(subject),
                    assertions,
                }
            }
            WireTag::Leaf => WireEnvelope::Leaf(variant.newtype_variant()?),
            WireTag::Wrapped => {
                let child = self.child::<A::Error>()?;
                WireEnvelope::Wrapped(Box::new(variant.newtype_variant_seed(child)?))
            }
            WireTag::Assertion => {
                let child = self.child::<A::Error>()?;
                let (predicate, object) =
                    variant.struct_variant(&["predicate", "object"], PairVisitor(child))?;
                WireEnvelope::Assertion {
                    predicate: Box::new(predicate),
                    object: Box::new(object),
                }
            }
            WireTag::KnownValue => WireEnvelope::KnownValue(variant.newtype_variant()?),
            WireTag::Elided => WireEnvelope::Elided(variant.newtype_variant()?),
            WireTag::Encrypted => WireEnvelope::Encrypted(variant.newtype_variant()?),
            WireTag::Compressed => WireEnvelope::Compressed(variant.newtype_variant()?),
        })
    }
}

struct NodeVisitor(WireSeed);

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = (WireEnvelope, Vec<WireEnvelope>);

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a node")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let subject = seq
            .next_element_seed(self.0)?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let assertions = seq
            .next_element_seed(ListSeed(self.0))?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        Ok((subject, assertions))
    }
}

struct PairVisitor(WireSeed);

impl<'de> Visitor<'de> for PairVisitor {
    type Value = (WireEnvelope, WireEnvelope);

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an assertion")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let predicate = seq
            .next_element_seed(self.0)?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let object = seq
            .next_element_seed(self.0)?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        Ok((predicate, object))
    }
}

struct ListSeed(WireSeed);

impl<'de> DeserializeSeed<'de> for ListSeed {
    type Value = Vec<WireEnvelope>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for ListSeed {
    type Value = Vec<WireEnvelope>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a list of assertions")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(1024));
        while let Some(item) = seq.next_element_seed(self.0)? {
            items.push(item);
        }
        Ok(items)
    }
}

impl From<&Envelope> for WireEnvelope {
    fn from(env: &Envelope) -> Self {
        match env.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
            } => Self::Node {
                subject: Box::new(subject.into()),
                assertions: assertions.iter().map(Self::from).collect(),
            },
            EnvelopeCase::Leaf(value) => Self::Leaf(value.clone()),
            EnvelopeCase::Wrapped(inner) => Self::Wrapped(Box::new(inner.into())),
            EnvelopeCase::Assertion(assertion) => Self::Assertion {
                predicate: Box::new(assertion.predicate().into()),
                object: Box::new(assertion.object().into()),
            },
            EnvelopeCase::KnownValue(value) => Self::KnownValue(value.clone()),
            EnvelopeCase::Elided(digest) => Self::Elided(*digest),
            EnvelopeCase::Encrypted(message) => Self::Encrypted(message.clone()),
            EnvelopeCase::Compressed(compressed) => Self::Compressed(compressed.clone()),
        }
    }
}

impl TryFrom<WireEnvelope> for Envelope {
    type Error = EnvelopeError;

    fn try_from(wire: WireEnvelope) -> EnvelopeResult<Self> {
        Ok(match wire {
            WireEnvelope::Node {
                subject,
                assertions,
            } => {
                let subject = Envelope::try_from(*subject)?;
                if subject.is_node() {
                    return Err(EnvelopeError::Malformed("node subject is a node".into()));
                }
                if assertions.is_empty() {
                    return Err(EnvelopeError::Malformed("node without assertions".into()));
                }
                let assertions = assertions
                    .into_iter()
                    .map(Envelope::try_from)
                    .collect::<EnvelopeResult<Vec<_>>>()?;
                Envelope::new_with_assertions(subject, assertions).map_err(|_| {
                    EnvelopeError::Malformed("node assertion is not an assertion".into())
                })?
            }
            WireEnvelope::Leaf(value) => Envelope::new_leaf(value),
            WireEnvelope::Wrapped(inner) => Envelope::try_from(*inner)?.wrap(),
            WireEnvelope::Assertion { predicate, object } => Envelope::new_assertion(
                Envelope::try_from(*predicate)?,
                Envelope::try_from(*object)?,
            ),
            WireEnvelope::KnownValue(value) => Envelope::new_known_value(value),
            WireEnvelope::Elided(digest) => Envelope::new_elided(digest),
            WireEnvelope::Encrypted(message) => Envelope::new_with_encrypted(message),
            WireEnvelope::Compressed(compressed) => Envelope::new_with_compressed(compressed),
        })
    }
}

impl Envelope {
    /// Encode the whole tree.
    pub fn to_bytes(&self) -> EnvelopeResult<Vec<u8>> {
        Ok(codec::encode(&WireEnvelope::from(self))?)
    }

    /// Decode and validate a tree produced by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> EnvelopeResult<Envelope> {
        Self::from_bytes_with(bytes, &EnvelopeConfig::default())
    }

    pub fn from_bytes_with(bytes: &[u8], config: &EnvelopeConfig) -> EnvelopeResult<Envelope> {
        let seed = WireSeed {
            depth: config.max_depth,
        };
        let wire = codec::decode_seed(seed, bytes)
            .map_err(|e| EnvelopeError::Malformed(e.to_string()))?;
        Envelope::try_from(wire)
    }

    pub fn to_hex(&self) -> EnvelopeResult<String> {
        Ok(hex::encode(self.to_bytes()?))
    }

    pub fn from_hex(s: &str) -> EnvelopeResult<Envelope> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| EnvelopeError::Malformed(format!("invalid hex: {e}")))?;
        Envelope::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use envelope_crypto::SymmetricKey;
    use envelope_types::KnownValue;

    use super::*;
    use crate::error::ErrorKind;

    fn sample() -> Envelope {
        Envelope::new("Alice")
            .add_assertion(KnownValue::IS_A, "Person")
            .add_assertion("knows", Envelope::new("Bob").add_assertion("age", 42i64))
            .add_assertion("photo", vec![0u8, 1, 2, 3])
            .wrap()
            .add_assertion(KnownValue::NOTE, Envelope::null())
    }

    #[test]
    fn bytes_roundtrip_is_identical() {
        let e = sample();
        let decoded = Envelope::from_bytes(&e.to_bytes().unwrap()).unwrap();
        assert!(decoded.is_identical_to(&e));
    }

    #[test]
    fn obscured_nodes_survive_encoding() {
        let key = SymmetricKey::generate();
        let e = sample();
        let inner = e.try_unwrap().unwrap();
        let obscured = e
            .elide_removing_target(&Envelope::new_assertion(KnownValue::NOTE, Envelope::null()))
            .replace_subject(inner.encrypt(&key).unwrap().wrap());
        let decoded = Envelope::from_hex(&obscured.to_hex().unwrap()).unwrap();
        assert!(decoded.is_identical_to(&obscured));
        assert_eq!(decoded.digest(), e.digest());
    }

    #[test]
    fn compressed_node_survives_encoding() {
        let c = sample().compress().unwrap();
        let decoded = Envelope::from_bytes(&c.to_bytes().unwrap()).unwrap();
        assert!(decoded.is_identical_to(&c));
    }

    #[test]
    fn garbage_is_malformed() {
        let err = Envelope::from_bytes(&[0xff, 0xff, 0xff, 0xff, 0x01]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn bad_hex_is_malformed() {
        assert!(matches!(
            Envelope::from_hex("zz").unwrap_err(),
            EnvelopeError::Malformed(_)
        ));
    }

    #[test]
    fn node_without_assertions_is_rejected() {
        let wire = WireEnvelope::Node {
            subject: Box::new(WireEnvelope::Leaf(Value::from("x"))),
            assertions: vec![],
        };
        let bytes = codec::encode(&wire).unwrap();
        assert!(matches!(
            Envelope::from_bytes(&bytes).unwrap_err(),
            EnvelopeError::Malformed(_)
        ));
    }

    #[test]
    fn node_with_leaf_assertion_is_rejected() {
        let wire = WireEnvelope::Node {
            subject: Box::new(WireEnvelope::Leaf(Value::from("x"))),
            assertions: vec![WireEnvelope::Leaf(Value::from("y"))],
        };
        let bytes = codec::encode(&wire).unwrap();
        assert!(matches!(
            Envelope::from_bytes(&bytes).unwrap_err(),
            EnvelopeError::Malformed(_)
        ));
    }

    #[test]
    fn unsorted_assertions_are_canonicalized() {
        let e = Envelope::new("Alice")
            .add_assertion("knows", "Bob")
            .add_assertion("knows", "Carol");
        let mut assertions: Vec<WireEnvelope> = e.assertions().iter().map(WireEnvelope::from).collect();
        assertions.reverse();
        let wire = WireEnvelope::Node {
            subject: Box::new(WireEnvelope::Leaf(Value::from("Alice"))),
            assertions,
        };
        let decoded = Envelope::from_bytes(&codec::encode(&wire).unwrap()).unwrap();
        assert!(decoded.is_identical_to(&e));
    }

    #[test]
    fn trailing_bytes_are_malformed() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes.push(0);
        let err = Envelope::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, EnvelopeError::Malformed(_)));
    }

    fn wrapped_null(levels: usize) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(levels * 4 + 8);
        for _ in 0..levels {
            bytes.extend_from_slice(&2u32.to_le_bytes());
        }
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes
    }

    #[test]
    fn deep_nesting_is_malformed() {
        let err = Envelope::from_bytes(&wrapped_null(200_000)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert!(matches!(err, EnvelopeError::Malformed(_)));
    }

    #[test]
    fn configured_depth_is_the_limit() {
        let config = EnvelopeConfig {
            max_depth: 4,
            ..EnvelopeConfig::default()
        };
        let ok = Envelope::from_bytes_with(&wrapped_null(4), &config).unwrap();
        assert!(ok.is_identical_to(&Envelope::null().wrap().wrap().wrap().wrap()));
        assert!(matches!(
            Envelope::from_bytes_with(&wrapped_null(5), &config).unwrap_err(),
            EnvelopeError::Malformed(_)
        ));
    }

    #[test]
    fn default_depth_accepts_ordinary_trees() {
        let mut e = Envelope::new("Alice");
        for _ in 0..50 {
            e = e.wrap().add_assertion("layer", 1i64);
        }
        let decoded = Envelope::from_bytes(&e.to_bytes().unwrap()).unwrap();
        assert!(decoded.is_identical_to(&e));
    }
}
