//! The envelope node model and digest assembly.
//!
//! An [`Envelope`] is an immutable, reference-counted node. Cloning is cheap
//! and shares the whole subtree; every transform returns a new node that
//! reuses the children it did not touch.
//!
//! # Invariants
//!
//! - The digest of a compound node depends only on the digests of its
//!   immediate children plus a per-variant domain tag.
//! - A `Node` always has at least one assertion, its assertions are sorted
//!   ascending by digest with no duplicate digests, and its subject is never
//!   itself a `Node`.
//! - Obscured nodes (`Elided`, `Encrypted`, `Compressed`) report their stored
//!   digest verbatim.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use envelope_crypto::{ContentHasher, EncryptedMessage};
use envelope_types::{Digest, KnownValue, Value};

use crate::assertion::Assertion;
use crate::error::{EnvelopeError, EnvelopeResult};
use crate::extension::Compressed;

/// An immutable, digest-addressed tree node.
#[derive(Clone)]
pub struct Envelope(Arc<Inner>);

struct Inner {
    case: EnvelopeCase,
    digest: OnceLock<Digest>,
}

/// The closed set of node variants.
#[derive(Debug)]
pub enum EnvelopeCase {
    /// A subject with one or more assertions about it.
    Node {
        subject: Envelope,
        assertions: Vec<Envelope>,
    },
    /// A single value.
    Leaf(Value),
    /// An envelope nested one level deeper.
    Wrapped(Envelope),
    /// A predicate/object pair.
    Assertion(Assertion),
    /// A compact integer-coded value.
    KnownValue(KnownValue),
    /// A placeholder carrying only the digest of the content it replaces.
    Elided(Digest),
    /// Ciphertext standing in for a node with the same digest.
    Encrypted(EncryptedMessage),
    /// Compressed bytes standing in for a node with the same digest.
    Compressed(Compressed),
}

/// Types that can become an envelope.
pub trait EnvelopeEncodable {
    fn into_envelope(self) -> Envelope;
}

impl EnvelopeEncodable for Envelope {
    fn into_envelope(self) -> Envelope {
        self
    }
}

impl EnvelopeEncodable for &Envelope {
    fn into_envelope(self) -> Envelope {
        self.clone()
    }
}

impl EnvelopeEncodable for Value {
    fn into_envelope(self) -> Envelope {
        Envelope::from_case(EnvelopeCase::Leaf(self))
    }
}

impl EnvelopeEncodable for KnownValue {
    fn into_envelope(self) -> Envelope {
        Envelope::from_case(EnvelopeCase::KnownValue(self))
    }
}

impl EnvelopeEncodable for Assertion {
    fn into_envelope(self) -> Envelope {
        Envelope::from_case(EnvelopeCase::Assertion(self))
    }
}

macro_rules! leaf_encodable {
    ($($ty:ty),* $(,)?) => {
        $(
            impl EnvelopeEncodable for $ty {
                fn into_envelope(self) -> Envelope {
                    Value::from(self).into_envelope()
                }
            }
        )*
    };
}

leaf_encodable!(&str, String, &String, bool, i64, i32, u32, u8, Vec<u8>, &[u8]);

impl Envelope {
    // ---------------------------------------------------------------
    // Construction
    // ---------------------------------------------------------------

    /// Create an envelope from anything encodable as one.
    pub fn new(subject: impl EnvelopeEncodable) -> Self {
        subject.into_envelope()
    }

    /// A leaf holding `value`.
    pub fn new_leaf(value: impl Into<Value>) -> Self {
        Self::from_case(EnvelopeCase::Leaf(value.into()))
    }

    /// The `null` leaf.
    pub fn null() -> Self {
        Self::new_leaf(Value::Null)
    }

    /// A bare assertion envelope.
    pub fn new_assertion(
        predicate: impl EnvelopeEncodable,
        object: impl EnvelopeEncodable,
    ) -> Self {
        Assertion::new(predicate, object).into_envelope()
    }

    /// A known value envelope.
    pub fn new_known_value(value: KnownValue) -> Self {
        value.into_envelope()
    }

    /// An elided placeholder for content with the given digest.
    pub fn new_elided(digest: Digest) -> Self {
        Self::from_case(EnvelopeCase::Elided(digest))
    }

    /// Attach `assertions` to `subject`.
    ///
    /// Each assertion must be an assertion envelope (possibly with its own
    /// assertions) or an obscured node. Assertions are put in canonical digest
    /// order and duplicate digests collapse to one. An empty list returns the
    /// subject unchanged; a subject that is already a node gains the new
    /// assertions alongside its existing ones.
    pub fn new_with_assertions(
        subject: impl EnvelopeEncodable,
        assertions: Vec<Envelope>,
    ) -> EnvelopeResult<Self> {
        if !assertions.iter().all(Envelope::is_valid_assertion) {
            return Err(EnvelopeError::InvalidAssertion);
        }
        let subject = subject.into_envelope();
        Ok(assertions
            .into_iter()
            .fold(subject, |env, a| env.add_valid_assertion(a)))
    }

    pub(crate) fn new_with_encrypted(message: EncryptedMessage) -> Self {
        Self::from_case(EnvelopeCase::Encrypted(message))
    }

    pub(crate) fn new_with_compressed(compressed: Compressed) -> Self {
        Self::from_case(EnvelopeCase::Compressed(compressed))
    }

    pub(crate) fn from_case(case: EnvelopeCase) -> Self {
        Self(Arc::new(Inner {
            case,
            digest: OnceLock::new(),
        }))
    }

    /// Build a node from parts whose order is already canonical.
    ///
    /// Used by transforms that replace children with digest-equal ones, so
    /// the sort order of the assertions cannot change.
    pub(crate) fn node_from_parts(subject: Envelope, assertions: Vec<Envelope>) -> Self {
        if assertions.is_empty() {
            return subject;
        }
        Self::from_case(EnvelopeCase::Node {
            subject,
            assertions,
        })
    }

    /// Add an assertion already known to be valid. Duplicates are a no-op.
    pub(crate) fn add_valid_assertion(&self, assertion: Envelope) -> Self {
        match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
            } => {
                let digest = assertion.digest();
                match assertions.binary_search_by_key(&digest, Envelope::digest) {
                    Ok(_) => self.clone(),
                    Err(pos) => {
                        let mut assertions = assertions.clone();
                        assertions.insert(pos, assertion);
                        Self::node_from_parts(subject.clone(), assertions)
                    }
                }
            }
            _ => Self::node_from_parts(self.clone(), vec![assertion]),
        }
    }

    /// Whether `self` may appear in a node's assertion list.
    pub(crate) fn is_valid_assertion(&self) -> bool {
        self.is_subject_assertion() || self.is_subject_obscured()
    }

    // ---------------------------------------------------------------
    // Digest
    // ---------------------------------------------------------------

    /// The digest of this node, computed on first access and cached.
    pub fn digest(&self) -> Digest {
        *self.0.digest.get_or_init(|| compute_digest(&self.0.case))
    }

    /// The variant of this node.
    pub fn case(&self) -> &EnvelopeCase {
        &self.0.case
    }

    /// Whether both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Envelope) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    // ---------------------------------------------------------------
    // Structure
    // ---------------------------------------------------------------

    /// The subject of a node, or the envelope itself for every other variant.
    pub fn subject(&self) -> Envelope {
        self.subject_ref().clone()
    }

    pub(crate) fn subject_ref(&self) -> &Envelope {
        match self.case() {
            EnvelopeCase::Node { subject, .. } => subject,
            _ => self,
        }
    }

    /// The assertions of a node; empty for every other variant.
    pub fn assertions(&self) -> &[Envelope] {
        match self.case() {
            EnvelopeCase::Node { assertions, .. } => assertions,
            _ => &[],
        }
    }

    pub fn has_assertions(&self) -> bool {
        !self.assertions().is_empty()
    }

    /// Nest this envelope one level deeper. The result has a new digest.
    pub fn wrap(&self) -> Envelope {
        Self::from_case(EnvelopeCase::Wrapped(self.clone()))
    }

    /// The inner envelope of a wrapped subject.
    pub fn try_unwrap(&self) -> EnvelopeResult<Envelope> {
        match self.subject_ref().case() {
            EnvelopeCase::Wrapped(inner) => Ok(inner.clone()),
            _ => Err(EnvelopeError::NotWrapped),
        }
    }

    // ---------------------------------------------------------------
    // Case predicates
    // ---------------------------------------------------------------

    pub fn is_node(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Node { .. })
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Leaf(_))
    }

    pub fn is_wrapped(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Wrapped(_))
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Assertion(_))
    }

    pub fn is_known_value(&self) -> bool {
        matches!(self.case(), EnvelopeCase::KnownValue(_))
    }

    pub fn is_elided(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Elided(_))
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Encrypted(_))
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Compressed(_))
    }

    /// Elided, encrypted, or compressed.
    pub fn is_obscured(&self) -> bool {
        self.is_elided() || self.is_encrypted() || self.is_compressed()
    }

    /// Has children: a node, a wrapped envelope, or an assertion.
    pub fn is_internal(&self) -> bool {
        self.is_node() || self.is_wrapped() || self.is_assertion()
    }

    pub fn is_subject_assertion(&self) -> bool {
        self.subject_ref().is_assertion()
    }

    pub fn is_subject_elided(&self) -> bool {
        self.subject_ref().is_elided()
    }

    pub fn is_subject_encrypted(&self) -> bool {
        self.subject_ref().is_encrypted()
    }

    pub fn is_subject_compressed(&self) -> bool {
        self.subject_ref().is_compressed()
    }

    pub fn is_subject_obscured(&self) -> bool {
        self.subject_ref().is_obscured()
    }

    // ---------------------------------------------------------------
    // Identity
    // ---------------------------------------------------------------

    /// Digest equality: both envelopes stand for the same content, whatever
    /// parts of it either one obscures.
    pub fn is_equivalent_to(&self, other: &Envelope) -> bool {
        self.digest() == other.digest()
    }

    /// Full structural equality: same digest and the same variant at every
    /// position, down to the leaves.
    pub fn is_identical_to(&self, other: &Envelope) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        if self.digest() != other.digest() {
            return false;
        }
        match (self.case(), other.case()) {
            (
                EnvelopeCase::Node {
                    subject: s1,
                    assertions: a1,
                },
                EnvelopeCase::Node {
                    subject: s2,
                    assertions: a2,
                },
            ) => {
                s1.is_identical_to(s2)
                    && a1.len() == a2.len()
                    && a1.iter().zip(a2).all(|(x, y)| x.is_identical_to(y))
            }
            (EnvelopeCase::Leaf(v1), EnvelopeCase::Leaf(v2)) => v1 == v2,
            (EnvelopeCase::Wrapped(i1), EnvelopeCase::Wrapped(i2)) => i1.is_identical_to(i2),
            (EnvelopeCase::Assertion(a1), EnvelopeCase::Assertion(a2)) => {
                a1.predicate().is_identical_to(a2.predicate())
                    && a1.object().is_identical_to(a2.object())
            }
            (EnvelopeCase::KnownValue(k1), EnvelopeCase::KnownValue(k2)) => k1 == k2,
            (EnvelopeCase::Elided(_), EnvelopeCase::Elided(_)) => true,
            (EnvelopeCase::Encrypted(m1), EnvelopeCase::Encrypted(m2)) => m1 == m2,
            (EnvelopeCase::Compressed(c1), EnvelopeCase::Compressed(c2)) => c1 == c2,
            _ => false,
        }
    }
}

fn compute_digest(case: &EnvelopeCase) -> Digest {
    match case {
        EnvelopeCase::Node {
            subject,
            assertions,
        } => {
            let mut digests: Vec<Digest> = assertions.iter().map(Envelope::digest).collect();
            digests.sort_unstable();
            let subject_digest = subject.digest();
            ContentHasher::NODE.hash_digests(std::iter::once(&subject_digest).chain(&digests))
        }
        EnvelopeCase::Leaf(value) => ContentHasher::LEAF.hash(&value.canonical_bytes()),
        EnvelopeCase::Wrapped(inner) => {
            let inner_digest = inner.digest();
            ContentHasher::WRAPPED.hash_digests([&inner_digest])
        }
        EnvelopeCase::Assertion(assertion) => assertion.digest(),
        EnvelopeCase::KnownValue(value) => {
            ContentHasher::KNOWN_VALUE.hash(&value.code().to_le_bytes())
        }
        EnvelopeCase::Elided(digest) => *digest,
        EnvelopeCase::Encrypted(message) => message.digest(),
        EnvelopeCase::Compressed(compressed) => compressed.digest(),
    }
}

impl PartialEq for Envelope {
    fn eq(&self, other: &Self) -> bool {
        self.is_identical_to(other)
    }
}

impl Eq for Envelope {}

impl Hash for Envelope {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.digest().hash(state);
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Envelope").field(self.case()).finish()
    }
}

impl From<Value> for Envelope {
    fn from(value: Value) -> Self {
        value.into_envelope()
    }
}

impl From<KnownValue> for Envelope {
    fn from(value: KnownValue) -> Self {
        value.into_envelope()
    }
}

impl From<Assertion> for Envelope {
    fn from(assertion: Assertion) -> Self {
        assertion.into_envelope()
    }
}

impl From<&str> for Envelope {
    fn from(s: &str) -> Self {
        s.into_envelope()
    }
}
